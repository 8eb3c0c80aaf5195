use std::collections::HashSet;

use rand::Rng;
use thiserror::Error;

use crate::domain::{ClassPosition, Ra, Snapshot, Student, StudentId};

/// Number of students appended by one call to
/// [`Store::generate_students`](crate::Store::generate_students).
pub const BATCH_SIZE: usize = 300;

/// Smallest generated enrollment number.
pub const RA_MIN: u32 = 100_000;

/// Largest generated enrollment number.
pub const RA_MAX: u32 = 999_999;

const RA_SPACE: usize = (RA_MAX - RA_MIN + 1) as usize;

/// Default name prefix for generated students.
pub(crate) const DEFAULT_LABEL: &str = "Aluno Gerado";

/// Errors that prevent a batch from being generated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    /// There is no grade level to enroll students in.
    #[error("the catalog has no grade levels")]
    NoDegrees,
    /// There is no class to place students in.
    #[error("the catalog has no classes")]
    NoClasses,
    /// Too few six-digit enrollment numbers are still unused.
    #[error("only {available} enrollment numbers are unused, {requested} are needed")]
    RaSpaceExhausted {
        /// Unused enrollment numbers.
        available: usize,
        /// Enrollment numbers needed for the batch.
        requested: usize,
    },
    /// Continuing the numbering would overflow the id type.
    #[error("student ids would overflow")]
    IdOverflow,
}

/// Builds batches of synthetic students.
///
/// Each generated student gets:
/// - an id continuing the numbering after the existing students
/// - a random six-digit enrollment number not used by any other student
/// - a random grade level and class from the catalog
/// - a name made of the label and the id, e.g. "Aluno Gerado 42"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentGenerator {
    label: String,
}

impl Default for StudentGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL)
    }
}

impl StudentGenerator {
    /// Creates a generator naming students with `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Builds a batch of [`BATCH_SIZE`] students for the given snapshot.
    ///
    /// The snapshot is not modified; the caller appends the batch.
    ///
    /// # Errors
    ///
    /// See [`GenerateError`].
    pub fn batch<R: Rng>(
        &self,
        snapshot: &Snapshot,
        rng: &mut R,
    ) -> Result<Vec<Student>, GenerateError> {
        let catalog = snapshot.catalog();
        let degrees = catalog.degrees();
        if degrees.is_empty() {
            return Err(GenerateError::NoDegrees);
        }

        let positions: Vec<ClassPosition> = catalog
            .class_positions()
            .map(|(position, _)| position)
            .collect();
        if positions.is_empty() {
            return Err(GenerateError::NoClasses);
        }

        let mut used: HashSet<Ra> = snapshot.students().iter().map(|s| s.ra).collect();
        let taken = used
            .iter()
            .filter(|ra| (RA_MIN..=RA_MAX).contains(&ra.get()))
            .count();
        let available = RA_SPACE - taken;
        if available < BATCH_SIZE {
            return Err(GenerateError::RaSpaceExhausted {
                available,
                requested: BATCH_SIZE,
            });
        }

        let base = id_base(snapshot.students());
        let mut batch = Vec::with_capacity(BATCH_SIZE);

        for offset in 1..=BATCH_SIZE {
            let id = u32::try_from(offset)
                .ok()
                .and_then(|offset| base.checked_add(offset))
                .map(StudentId::new)
                .ok_or(GenerateError::IdOverflow)?;

            let degree = &degrees[rng.random_range(0..degrees.len())];
            let class_id = positions[rng.random_range(0..positions.len())];

            batch.push(Student {
                id,
                name: format!("{} {id}", self.label),
                ra: draw_unused_ra(rng, &mut used),
                degree_id: degree.id,
                class_id,
            });
        }

        Ok(batch)
    }
}

/// The number after which generated ids continue.
///
/// This is the student count, raised to the largest existing id when
/// deletions have left gaps in the numbering.
fn id_base(students: &[Student]) -> u32 {
    let count = u32::try_from(students.len()).unwrap_or(u32::MAX);
    let max = students.iter().map(|s| s.id.get()).max().unwrap_or(0);
    count.max(max)
}

/// Draws enrollment numbers until one is not in `used`, then records it.
///
/// The caller guarantees at least one unused value exists in range.
fn draw_unused_ra<R: Rng>(rng: &mut R, used: &mut HashSet<Ra>) -> Ra {
    loop {
        let candidate = Ra::new(rng.random_range(RA_MIN..=RA_MAX));
        if used.insert(candidate) {
            return candidate;
        }
    }
}
