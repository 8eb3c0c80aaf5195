use std::fmt;

use non_empty_string::NonEmptyString;
use nonempty::NonEmpty;
use thiserror::Error;

use crate::domain::{
    ClassPosition, DegreeAssignment, DegreeId, MatterId, Ra, Relationship, RelationshipId,
    Student, StudentId, TeacherId,
};

/// A form field that must be filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// A student's name.
    Name,
    /// A student's grade level.
    Degree,
    /// A student's class.
    Class,
    /// An assignment's teacher.
    Teacher,
    /// An assignment's subject.
    Matter,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::Degree => "degree",
            Self::Class => "class",
            Self::Teacher => "teacher",
            Self::Matter => "matter",
        };
        f.write_str(name)
    }
}

/// Reasons a draft cannot become an entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    /// A required field is empty.
    #[error("all fields are required: {0} is missing")]
    MissingField(Field),

    /// The assignment covers no grade level.
    #[error("add at least one grade and one class")]
    NoGrades,

    /// A grade entry covers no class.
    #[error("grade {degree} has no classes")]
    EmptyGrade {
        /// The grade level without classes.
        degree: DegreeId,
    },
}

/// Edits to an existing student.
///
/// The id and enrollment number are carried over unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDraft {
    id: StudentId,
    ra: Ra,
    /// The edited name. Surrounding whitespace is ignored.
    pub name: String,
    /// The edited grade level.
    pub degree: Option<DegreeId>,
    /// The edited class.
    pub class: Option<ClassPosition>,
}

impl From<&Student> for StudentDraft {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id,
            ra: student.ra,
            name: student.name.clone(),
            degree: Some(student.degree_id),
            class: Some(student.class_id),
        }
    }
}

impl StudentDraft {
    /// The student being edited.
    #[must_use]
    pub const fn id(&self) -> StudentId {
        self.id
    }

    /// Checks that every field is filled in and builds the updated student.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::MissingField`] naming the first empty field.
    pub fn finish(self) -> Result<Student, DraftError> {
        let name = NonEmptyString::new(self.name.trim().to_string())
            .map_err(|_| DraftError::MissingField(Field::Name))?;
        let degree_id = self.degree.ok_or(DraftError::MissingField(Field::Degree))?;
        let class_id = self.class.ok_or(DraftError::MissingField(Field::Class))?;

        Ok(Student {
            id: self.id,
            name: name.as_str().to_string(),
            ra: self.ra,
            degree_id,
            class_id,
        })
    }
}

/// A teaching assignment being created or edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipDraft {
    /// Id of the assignment being edited, `None` for a new one.
    pub id: Option<RelationshipId>,
    /// The teacher giving the subject.
    pub teacher: Option<TeacherId>,
    /// The subject being taught.
    pub matter: Option<MatterId>,
    /// Grade levels with the classes covered in each, in entry order.
    pub grades: Vec<(DegreeId, Vec<ClassPosition>)>,
}

impl From<&Relationship> for RelationshipDraft {
    fn from(relationship: &Relationship) -> Self {
        Self {
            id: Some(relationship.id),
            teacher: Some(relationship.teacher_id),
            matter: Some(relationship.matter_id),
            grades: relationship
                .degrees
                .iter()
                .map(|entry| (entry.degree_id, entry.positions().collect()))
                .collect(),
        }
    }
}

impl RelationshipDraft {
    /// Adds a grade entry.
    pub fn add_grade(&mut self, degree: DegreeId, classes: impl IntoIterator<Item = ClassPosition>) {
        self.grades.push((degree, classes.into_iter().collect()));
    }

    /// Removes every entry for `degree`. Returns `true` if any was removed.
    pub fn remove_grade(&mut self, degree: DegreeId) -> bool {
        let before = self.grades.len();
        self.grades.retain(|(entry, _)| *entry != degree);
        self.grades.len() != before
    }

    /// Checks the draft and builds the assignment.
    ///
    /// A new assignment takes `fallback_id`.
    ///
    /// # Errors
    ///
    /// - [`DraftError::MissingField`] if the teacher or subject is unset
    /// - [`DraftError::NoGrades`] if no grade entry was added
    /// - [`DraftError::EmptyGrade`] if an entry has no classes
    pub fn finish(self, fallback_id: RelationshipId) -> Result<Relationship, DraftError> {
        let teacher_id = self
            .teacher
            .ok_or(DraftError::MissingField(Field::Teacher))?;
        let matter_id = self.matter.ok_or(DraftError::MissingField(Field::Matter))?;
        let grades = NonEmpty::from_vec(self.grades).ok_or(DraftError::NoGrades)?;

        let degrees = grades
            .into_iter()
            .map(|(degree, classes)| {
                NonEmpty::from_vec(classes)
                    .map(|classes| DegreeAssignment::new(degree, classes))
                    .ok_or(DraftError::EmptyGrade { degree })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Relationship {
            id: self.id.unwrap_or(fallback_id),
            teacher_id,
            matter_id,
            degrees,
        })
    }
}
