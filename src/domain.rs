//! Domain models for the school roster.
//!
//! This module contains the entity types, the typed identifiers that bind
//! them together, the [`Store`] that owns them, and the pure query functions
//! that read from it.

/// Typed identifiers for every entity.
pub mod ids;
pub use ids::{
    ClassPosition, DegreeId, InvalidPosition, MatterId, Ra, RelationshipId, StudentId, TeacherId,
};

mod entity;
pub use entity::{Class, ClassRef, Degree, DegreeAssignment, Matter, Relationship, Student, Teacher};

mod catalog;
pub use catalog::Catalog;

mod config;
pub use config::{Config, ConfigError};

/// Form-level validation applied before a mutation reaches the store.
pub mod draft;
pub use draft::{DraftError, RelationshipDraft, StudentDraft};

/// Bulk creation of synthetic students.
pub mod generator;
pub use generator::{GenerateError, StudentGenerator};

/// Referential integrity audit of a snapshot.
pub mod integrity;
pub use integrity::{Finding, IntegrityReport};

/// Filtering and derived views over the current snapshot.
pub mod query;
pub use query::{DegreeCount, RelationshipFilter, StudentFilter};

mod store;
pub use store::{Snapshot, Store, SubscriptionId};
