use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use serde::Serialize;

use crate::domain::{
    ClassPosition, DegreeId, MatterId, Ra, RelationshipId, Snapshot, StudentId, TeacherId,
};

/// One problem found by [`IntegrityReport::audit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// Two or more students share an id.
    DuplicateStudentId {
        /// The shared id.
        id: StudentId,
        /// How many students carry it.
        count: usize,
    },
    /// Two or more students share an enrollment number.
    DuplicateRa {
        /// The shared enrollment number.
        ra: Ra,
        /// How many students carry it.
        count: usize,
    },
    /// Two or more assignments share an id.
    DuplicateRelationshipId {
        /// The shared id.
        id: RelationshipId,
        /// How many assignments carry it.
        count: usize,
    },
    /// A student is enrolled in a grade level missing from the catalog.
    UnknownStudentDegree {
        /// The student.
        student: StudentId,
        /// The missing grade level.
        degree: DegreeId,
    },
    /// A student attends a class position past the end of the catalog.
    UnknownStudentClass {
        /// The student.
        student: StudentId,
        /// The missing class.
        class: ClassPosition,
    },
    /// An assignment names a teacher missing from the catalog.
    UnknownTeacher {
        /// The assignment.
        relationship: RelationshipId,
        /// The missing teacher.
        teacher: TeacherId,
    },
    /// An assignment names a subject missing from the catalog.
    UnknownMatter {
        /// The assignment.
        relationship: RelationshipId,
        /// The missing subject.
        matter: MatterId,
    },
    /// An assignment covers a grade level missing from the catalog.
    UnknownRelationshipDegree {
        /// The assignment.
        relationship: RelationshipId,
        /// The missing grade level.
        degree: DegreeId,
    },
    /// An assignment covers a class position past the end of the catalog.
    UnknownRelationshipClass {
        /// The assignment.
        relationship: RelationshipId,
        /// The grade entry naming the class.
        degree: DegreeId,
        /// The missing class.
        class: ClassPosition,
    },
    /// An assignment covers no grade level.
    NoGrades {
        /// The assignment.
        relationship: RelationshipId,
    },
    /// A grade entry of an assignment covers no class.
    EmptyGrade {
        /// The assignment.
        relationship: RelationshipId,
        /// The grade entry without classes.
        degree: DegreeId,
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DuplicateStudentId { id, count } => {
                write!(f, "student id {id} is used by {count} students")
            }
            Self::DuplicateRa { ra, count } => {
                write!(f, "RA {ra} is used by {count} students")
            }
            Self::DuplicateRelationshipId { id, count } => {
                write!(f, "relationship id {id} is used by {count} relationships")
            }
            Self::UnknownStudentDegree { student, degree } => {
                write!(f, "student {student} is enrolled in unknown degree {degree}")
            }
            Self::UnknownStudentClass { student, class } => {
                write!(f, "student {student} is in unknown class {class}")
            }
            Self::UnknownTeacher {
                relationship,
                teacher,
            } => write!(f, "relationship {relationship} names unknown teacher {teacher}"),
            Self::UnknownMatter {
                relationship,
                matter,
            } => write!(f, "relationship {relationship} names unknown matter {matter}"),
            Self::UnknownRelationshipDegree {
                relationship,
                degree,
            } => write!(f, "relationship {relationship} covers unknown degree {degree}"),
            Self::UnknownRelationshipClass {
                relationship,
                degree,
                class,
            } => write!(
                f,
                "relationship {relationship} covers unknown class {class} in degree {degree}"
            ),
            Self::NoGrades { relationship } => {
                write!(f, "relationship {relationship} covers no degree")
            }
            Self::EmptyGrade {
                relationship,
                degree,
            } => write!(f, "relationship {relationship} has no classes for degree {degree}"),
        }
    }
}

/// Referential integrity problems in a snapshot.
///
/// Mutations never run this audit; it is a read-only check callers opt into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    findings: Vec<Finding>,
}

impl IntegrityReport {
    /// Audits `snapshot`.
    ///
    /// Duplicate findings come first, in ascending order of the shared value,
    /// followed by per-student and then per-assignment findings in store order.
    #[must_use]
    pub fn audit(snapshot: &Snapshot) -> Self {
        let catalog = snapshot.catalog();
        let students = snapshot.students();
        let relationships = snapshot.relationships();

        let mut findings = Vec::new();

        findings.extend(
            duplicates(students.iter().map(|student| student.id))
                .map(|(id, count)| Finding::DuplicateStudentId { id, count }),
        );
        findings.extend(
            duplicates(students.iter().map(|student| student.ra))
                .map(|(ra, count)| Finding::DuplicateRa { ra, count }),
        );
        findings.extend(
            duplicates(relationships.iter().map(|relationship| relationship.id))
                .map(|(id, count)| Finding::DuplicateRelationshipId { id, count }),
        );

        let degrees: HashSet<DegreeId> = catalog.degrees().iter().map(|d| d.id).collect();

        for student in students {
            if !degrees.contains(&student.degree_id) {
                findings.push(Finding::UnknownStudentDegree {
                    student: student.id,
                    degree: student.degree_id,
                });
            }
            if catalog.class(student.class_id).is_none() {
                findings.push(Finding::UnknownStudentClass {
                    student: student.id,
                    class: student.class_id,
                });
            }
        }

        for relationship in relationships {
            let id = relationship.id;

            if catalog.teacher(relationship.teacher_id).is_none() {
                findings.push(Finding::UnknownTeacher {
                    relationship: id,
                    teacher: relationship.teacher_id,
                });
            }
            if catalog.matter(relationship.matter_id).is_none() {
                findings.push(Finding::UnknownMatter {
                    relationship: id,
                    matter: relationship.matter_id,
                });
            }
            if relationship.degrees.is_empty() {
                findings.push(Finding::NoGrades { relationship: id });
            }

            for entry in &relationship.degrees {
                if !degrees.contains(&entry.degree_id) {
                    findings.push(Finding::UnknownRelationshipDegree {
                        relationship: id,
                        degree: entry.degree_id,
                    });
                }
                if entry.classes.is_empty() {
                    findings.push(Finding::EmptyGrade {
                        relationship: id,
                        degree: entry.degree_id,
                    });
                }
                findings.extend(
                    entry
                        .positions()
                        .filter(|&class| catalog.class(class).is_none())
                        .map(|class| Finding::UnknownRelationshipClass {
                            relationship: id,
                            degree: entry.degree_id,
                            class,
                        }),
                );
            }
        }

        Self { findings }
    }

    /// Every finding, in audit order.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Whether the audit found nothing.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Number of findings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.findings.len()
    }

    /// Whether the audit found nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Values occurring more than once, with their counts, in ascending order.
fn duplicates<T>(values: impl Iterator<Item = T>) -> impl Iterator<Item = (T, usize)>
where
    T: Copy + Ord + std::hash::Hash,
{
    let mut counts: HashMap<T, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    let mut repeated: Vec<(T, usize)> = counts.into_iter().filter(|&(_, n)| n > 1).collect();
    repeated.sort_unstable_by_key(|&(value, _)| value);
    repeated.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Store,
        domain::{
            Catalog, Class, Degree, DegreeAssignment, Matter, Relationship, Student, Teacher,
        },
    };

    fn position(value: u32) -> ClassPosition {
        ClassPosition::new(value).unwrap()
    }

    fn catalog() -> Catalog {
        Catalog::new(
            vec![Degree {
                id: DegreeId::new(1),
                name: "1ª Série".to_string(),
            }],
            vec![
                Class {
                    name: "Classe A".to_string(),
                },
                Class {
                    name: "Classe B".to_string(),
                },
            ],
            vec![Teacher {
                id: TeacherId::new(1),
                name: "Helena".to_string(),
            }],
            vec![Matter {
                id: MatterId::new(1),
                name: "Matemática".to_string(),
            }],
        )
    }

    fn student(id: u32, ra: u32, degree: u32, class: u32) -> Student {
        Student {
            id: StudentId::new(id),
            name: format!("Aluno {id}"),
            ra: Ra::new(ra),
            degree_id: DegreeId::new(degree),
            class_id: position(class),
        }
    }

    fn relationship(id: u32, teacher: u32, degrees: Vec<DegreeAssignment>) -> Relationship {
        Relationship {
            id: RelationshipId::new(id),
            teacher_id: TeacherId::new(teacher),
            matter_id: MatterId::new(1),
            degrees,
        }
    }

    #[test]
    fn consistent_snapshot_is_clean() {
        let store = Store::new(
            catalog(),
            vec![student(1, 101, 1, 1), student(2, 102, 1, 2)],
            vec![relationship(
                1,
                1,
                vec![DegreeAssignment::new(DegreeId::new(1), [position(1)])],
            )],
        );

        let report = IntegrityReport::audit(&store.snapshot());

        assert!(report.is_clean());
        assert_eq!(report.len(), 0);
    }

    #[test]
    fn duplicates_are_reported_once_with_counts() {
        let store = Store::new(
            catalog(),
            vec![
                student(1, 101, 1, 1),
                student(1, 101, 1, 1),
                student(1, 102, 1, 1),
            ],
            Vec::new(),
        );

        let report = IntegrityReport::audit(&store.snapshot());

        assert_eq!(
            report.findings(),
            &[
                Finding::DuplicateStudentId {
                    id: StudentId::new(1),
                    count: 3
                },
                Finding::DuplicateRa {
                    ra: Ra::new(101),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn dangling_references_are_reported() {
        let store = Store::new(
            catalog(),
            vec![student(1, 101, 7, 3)],
            vec![
                relationship(
                    1,
                    9,
                    vec![
                        DegreeAssignment::new(DegreeId::new(1), [position(5)]),
                        DegreeAssignment::new(DegreeId::new(4), Vec::new()),
                    ],
                ),
                relationship(2, 1, Vec::new()),
            ],
        );

        let report = IntegrityReport::audit(&store.snapshot());

        assert_eq!(
            report.findings(),
            &[
                Finding::UnknownStudentDegree {
                    student: StudentId::new(1),
                    degree: DegreeId::new(7)
                },
                Finding::UnknownStudentClass {
                    student: StudentId::new(1),
                    class: position(3)
                },
                Finding::UnknownTeacher {
                    relationship: RelationshipId::new(1),
                    teacher: TeacherId::new(9)
                },
                Finding::UnknownRelationshipClass {
                    relationship: RelationshipId::new(1),
                    degree: DegreeId::new(1),
                    class: position(5)
                },
                Finding::UnknownRelationshipDegree {
                    relationship: RelationshipId::new(1),
                    degree: DegreeId::new(4)
                },
                Finding::EmptyGrade {
                    relationship: RelationshipId::new(1),
                    degree: DegreeId::new(4)
                },
                Finding::NoGrades {
                    relationship: RelationshipId::new(2)
                },
            ]
        );
    }

    #[test]
    fn findings_render_readably() {
        let finding = Finding::UnknownRelationshipClass {
            relationship: RelationshipId::new(3),
            degree: DegreeId::new(1),
            class: position(4),
        };

        assert_eq!(
            finding.to_string(),
            "relationship 3 covers unknown class 4 in degree 1"
        );

        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["kind"], "unknown_relationship_class");
        assert_eq!(json["class"], 4);
    }
}
