use serde::{Deserialize, Serialize};

use crate::domain::{ClassPosition, DegreeId, MatterId, Ra, RelationshipId, StudentId, TeacherId};

/// A grade level ("série").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degree {
    /// Identifier of the grade level.
    pub id: DegreeId,
    /// Display name, e.g. "1ª Série".
    pub name: String,
}

/// A class within a grade level ("Classe A").
///
/// Classes have no identifier of their own; see [`ClassPosition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    /// Display name.
    pub name: String,
}

/// A teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    /// Identifier of the teacher.
    pub id: TeacherId,
    /// Display name.
    pub name: String,
}

/// A school subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matter {
    /// Identifier of the subject.
    pub id: MatterId,
    /// Display name.
    pub name: String,
}

/// An enrolled student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// Identifier of the student.
    pub id: StudentId,
    /// Full name.
    pub name: String,
    /// Enrollment number, unique across all students.
    pub ra: Ra,
    /// The grade level the student is enrolled in.
    pub degree_id: DegreeId,
    /// The class the student attends, by catalog position.
    pub class_id: ClassPosition,
}

/// A teaching assignment.
///
/// Binds one teacher and one subject to one or more grade levels, and within
/// each grade level to one or more classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    /// Identifier of the assignment.
    pub id: RelationshipId,
    /// The teacher giving the subject.
    pub teacher_id: TeacherId,
    /// The subject being taught.
    pub matter_id: MatterId,
    /// Grade levels covered, in the order they were entered.
    pub degrees: Vec<DegreeAssignment>,
}

impl Relationship {
    /// Whether any of the assignment's grade entries is for `degree`.
    #[must_use]
    pub fn covers_degree(&self, degree: DegreeId) -> bool {
        self.degrees.iter().any(|entry| entry.degree_id == degree)
    }

    /// The first grade entry for `degree`, if any.
    #[must_use]
    pub fn assignment(&self, degree: DegreeId) -> Option<&DegreeAssignment> {
        self.degrees.iter().find(|entry| entry.degree_id == degree)
    }
}

/// The classes of one grade level covered by a [`Relationship`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DegreeAssignment {
    /// The grade level.
    pub degree_id: DegreeId,
    /// The classes taught within that grade level.
    pub classes: Vec<ClassRef>,
}

impl DegreeAssignment {
    /// Creates an entry covering the given class positions.
    pub fn new(degree_id: DegreeId, classes: impl IntoIterator<Item = ClassPosition>) -> Self {
        Self {
            degree_id,
            classes: classes.into_iter().map(ClassRef::from).collect(),
        }
    }

    /// The class positions covered, in entry order.
    pub fn positions(&self) -> impl Iterator<Item = ClassPosition> + '_ {
        self.classes.iter().map(|class| class.class_id)
    }

    /// Whether `position` is one of the covered classes.
    #[must_use]
    pub fn includes(&self, position: ClassPosition) -> bool {
        self.positions().any(|covered| covered == position)
    }
}

/// A reference to a class by catalog position.
///
/// Older documents spell the field `classPosition`; both spellings are read.
/// A zero or missing value falls back to the first class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawClassRef", into = "RawClassRef")]
pub struct ClassRef {
    /// The referenced class.
    pub class_id: ClassPosition,
}

impl From<ClassPosition> for ClassRef {
    fn from(class_id: ClassPosition) -> Self {
        Self { class_id }
    }
}

/// Serialized form of [`ClassRef`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClassRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    class_id: Option<u32>,
    #[serde(default, skip_serializing)]
    class_position: Option<u32>,
}

impl From<RawClassRef> for ClassRef {
    fn from(raw: RawClassRef) -> Self {
        let class_id = [raw.class_id, raw.class_position]
            .into_iter()
            .flatten()
            .find_map(|value| ClassPosition::new(value).ok())
            .unwrap_or(ClassPosition::FIRST);

        Self { class_id }
    }
}

impl From<ClassRef> for RawClassRef {
    fn from(class: ClassRef) -> Self {
        Self {
            class_id: Some(class.class_id.get()),
            class_position: None,
        }
    }
}
