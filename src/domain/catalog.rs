//! The fixed reference collections.
//!
//! Degrees, classes, teachers and matters are loaded once and never change
//! while the process runs.

use crate::domain::{Class, ClassPosition, Degree, DegreeId, Matter, MatterId, Teacher, TeacherId};

/// The fixed catalog of grade levels, classes, teachers and subjects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    degrees: Vec<Degree>,
    classes: Vec<Class>,
    teachers: Vec<Teacher>,
    matters: Vec<Matter>,
}

impl Catalog {
    /// Creates a catalog from its four collections.
    #[must_use]
    pub const fn new(
        degrees: Vec<Degree>,
        classes: Vec<Class>,
        teachers: Vec<Teacher>,
        matters: Vec<Matter>,
    ) -> Self {
        Self {
            degrees,
            classes,
            teachers,
            matters,
        }
    }

    /// All grade levels, in load order.
    #[must_use]
    pub fn degrees(&self) -> &[Degree] {
        &self.degrees
    }

    /// All classes, in catalog order. The class at index `i` has position
    /// `i + 1`.
    #[must_use]
    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    /// All teachers, in load order.
    #[must_use]
    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    /// All subjects, in load order.
    #[must_use]
    pub fn matters(&self) -> &[Matter] {
        &self.matters
    }

    /// Looks up a class by position.
    #[must_use]
    pub fn class(&self, position: ClassPosition) -> Option<&Class> {
        self.classes.get(position.index())
    }

    /// Every class paired with its position.
    pub fn class_positions(&self) -> impl Iterator<Item = (ClassPosition, &Class)> + '_ {
        self.classes
            .iter()
            .enumerate()
            .filter_map(|(index, class)| ClassPosition::from_index(index).map(|p| (p, class)))
    }

    /// Looks up a grade level by id.
    #[must_use]
    pub fn degree(&self, id: DegreeId) -> Option<&Degree> {
        self.degrees.iter().find(|degree| degree.id == id)
    }

    /// Looks up a teacher by id.
    #[must_use]
    pub fn teacher(&self, id: TeacherId) -> Option<&Teacher> {
        self.teachers.iter().find(|teacher| teacher.id == id)
    }

    /// Looks up a subject by id.
    #[must_use]
    pub fn matter(&self, id: MatterId) -> Option<&Matter> {
        self.matters.iter().find(|matter| matter.id == id)
    }

    /// Name of the grade level, if it exists.
    #[must_use]
    pub fn degree_name(&self, id: DegreeId) -> Option<&str> {
        self.degree(id).map(|degree| degree.name.as_str())
    }

    /// Name of the class at `position`, if it exists.
    #[must_use]
    pub fn class_name(&self, position: ClassPosition) -> Option<&str> {
        self.class(position).map(|class| class.name.as_str())
    }

    /// Name of the teacher, if they exist.
    #[must_use]
    pub fn teacher_name(&self, id: TeacherId) -> Option<&str> {
        self.teacher(id).map(|teacher| teacher.name.as_str())
    }

    /// Name of the subject, if it exists.
    #[must_use]
    pub fn matter_name(&self, id: MatterId) -> Option<&str> {
        self.matter(id).map(|matter| matter.name.as_str())
    }
}
