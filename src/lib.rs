//! In-memory school roster
//!
//! Students, teachers, subjects ("matters") and the teaching assignments that
//! bind them live in a single [`Store`]. Reads go through the query layer,
//! writes through the store's mutation methods.

pub mod domain;
pub use domain::{
    Catalog, Class, ClassPosition, ClassRef, Config, Degree, DegreeAssignment, DegreeId,
    IntegrityReport, Matter, MatterId, Ra, Relationship, RelationshipFilter, RelationshipId,
    Snapshot, Store, Student, StudentFilter, StudentGenerator, StudentId, Teacher, TeacherId,
};

/// Loading the fixed catalog and seed collections from disk.
pub mod storage;
pub use storage::{DataDir, LoadError};
