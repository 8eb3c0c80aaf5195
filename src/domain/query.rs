use regex::Regex;
use serde::Serialize;

use crate::domain::{
    Catalog, ClassPosition, DegreeAssignment, DegreeId, MatterId, Relationship, Student,
    TeacherId,
};

/// Students matching both constraints; `None` matches everything.
///
/// Returns a fresh vector in the input order.
#[must_use]
pub fn filtered_students(
    students: &[Student],
    degree: Option<DegreeId>,
    class: Option<ClassPosition>,
) -> Vec<Student> {
    StudentFilter {
        degree,
        class,
        name: None,
    }
    .apply(students)
}

/// Constraints on the student listing.
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    /// Only students in this grade level.
    pub degree: Option<DegreeId>,
    /// Only students in this class.
    pub class: Option<ClassPosition>,
    /// Only students whose name matches this pattern.
    pub name: Option<Regex>,
}

impl StudentFilter {
    /// Whether `student` satisfies every constraint that is set.
    #[must_use]
    pub fn matches(&self, student: &Student) -> bool {
        if self.degree.is_some_and(|degree| student.degree_id != degree) {
            return false;
        }

        if self.class.is_some_and(|class| student.class_id != class) {
            return false;
        }

        self.name
            .as_ref()
            .is_none_or(|pattern| pattern.is_match(&student.name))
    }

    /// Copies the matching students, preserving order.
    #[must_use]
    pub fn apply(&self, students: &[Student]) -> Vec<Student> {
        students
            .iter()
            .filter(|student| self.matches(student))
            .cloned()
            .collect()
    }
}

/// Constraints on the teaching assignment listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelationshipFilter {
    /// Only assignments given by this teacher.
    pub teacher: Option<TeacherId>,
    /// Only assignments for this subject.
    pub matter: Option<MatterId>,
    /// Only assignments with at least one entry for this grade level.
    pub degree: Option<DegreeId>,
}

impl RelationshipFilter {
    /// Whether `relationship` satisfies every constraint that is set.
    #[must_use]
    pub fn matches(&self, relationship: &Relationship) -> bool {
        if self
            .teacher
            .is_some_and(|teacher| relationship.teacher_id != teacher)
        {
            return false;
        }

        if self
            .matter
            .is_some_and(|matter| relationship.matter_id != matter)
        {
            return false;
        }

        if self
            .degree
            .is_some_and(|degree| !relationship.covers_degree(degree))
        {
            return false;
        }

        true
    }

    /// Copies the matching assignments, preserving order.
    #[must_use]
    pub fn apply(&self, relationships: &[Relationship]) -> Vec<Relationship> {
        relationships
            .iter()
            .filter(|relationship| self.matches(relationship))
            .cloned()
            .collect()
    }
}

/// Students taught under one grade entry of an assignment.
///
/// A student is included when they are in the entry's grade level and in one
/// of its classes. The result is ordered by class position; students in the
/// same class keep their store order.
#[must_use]
pub fn assigned_students(students: &[Student], assignment: &DegreeAssignment) -> Vec<Student> {
    let mut assigned: Vec<Student> = students
        .iter()
        .filter(|student| {
            student.degree_id == assignment.degree_id && assignment.includes(student.class_id)
        })
        .cloned()
        .collect();

    assigned.sort_by_key(|student| student.class_id);
    assigned
}

/// The number of students enrolled in one grade level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DegreeCount {
    /// The grade level.
    pub degree_id: DegreeId,
    /// Its display name.
    pub name: String,
    /// Students enrolled in it.
    pub count: usize,
}

/// Student counts for every grade level in the catalog, in catalog order.
///
/// Grade levels without students are included with a count of zero.
#[must_use]
pub fn students_per_degree(catalog: &Catalog, students: &[Student]) -> Vec<DegreeCount> {
    catalog
        .degrees()
        .iter()
        .map(|degree| DegreeCount {
            degree_id: degree.id,
            name: degree.name.clone(),
            count: students
                .iter()
                .filter(|student| student.degree_id == degree.id)
                .count(),
        })
        .collect()
}
