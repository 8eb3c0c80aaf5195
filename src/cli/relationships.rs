use std::io::{self, Write};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use roster::{
    Catalog, DataDir, DegreeAssignment, DegreeId, MatterId, Relationship, RelationshipFilter,
    Store, Student, TeacherId, domain::query::assigned_students,
};
use serde::Serialize;
use tracing::instrument;

use super::{name_or_placeholder, table::Table, terminal::Colorize};

/// Command arguments for `school relationships`.
#[derive(Debug, Parser)]
#[command(about = "List teaching assignments")]
pub struct Relationships {
    /// Only assignments given by this teacher (by id).
    #[arg(long, value_name = "ID")]
    teacher: Option<TeacherId>,

    /// Only assignments for this subject (by id).
    #[arg(long, value_name = "ID")]
    matter: Option<MatterId>,

    /// Only assignments covering this degree (by id).
    #[arg(long, value_name = "ID")]
    degree: Option<DegreeId>,

    /// List the classes and the students taught under each assignment.
    #[arg(long)]
    expand: bool,

    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

/// Supported output formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelationshipRow<'a> {
    #[serde(flatten)]
    relationship: &'a Relationship,
    teacher_name: Option<&'a str>,
    matter_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    students: Option<Vec<AssignedRow>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignedRow {
    degree_id: DegreeId,
    students: Vec<Student>,
}

impl Relationships {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, data: &DataDir) -> anyhow::Result<()> {
        let store = data.load()?;
        self.render(&store, &mut io::stdout().lock())
    }

    pub fn render(&self, store: &Store, out: &mut impl Write) -> anyhow::Result<()> {
        let filter = RelationshipFilter {
            teacher: self.teacher,
            matter: self.matter,
            degree: self.degree,
        };
        let relationships = filter.apply(store.relationships());
        let catalog = store.catalog();

        match self.output {
            OutputFormat::Table if self.expand => {
                for relationship in &relationships {
                    write_expanded(out, catalog, store.students(), relationship)?;
                }
            }
            OutputFormat::Table => {
                let mut table = Table::new(["ID", "Teacher", "Matter", "Degrees"]);
                for relationship in &relationships {
                    table.push(vec![
                        relationship.id.to_string(),
                        name_or_placeholder(catalog.teacher_name(relationship.teacher_id))
                            .to_string(),
                        name_or_placeholder(catalog.matter_name(relationship.matter_id))
                            .to_string(),
                        describe_grades(catalog, &relationship.degrees),
                    ]);
                }
                table.write(out, false)?;
            }
            OutputFormat::Json => {
                let rows: Vec<RelationshipRow> = relationships
                    .iter()
                    .map(|relationship| RelationshipRow {
                        relationship,
                        teacher_name: catalog.teacher_name(relationship.teacher_id),
                        matter_name: catalog.matter_name(relationship.matter_id),
                        students: self.expand.then(|| {
                            relationship
                                .degrees
                                .iter()
                                .map(|entry| AssignedRow {
                                    degree_id: entry.degree_id,
                                    students: assigned_students(store.students(), entry),
                                })
                                .collect()
                        }),
                    })
                    .collect();
                serde_json::to_writer_pretty(&mut *out, &rows)
                    .context("failed to render json output")?;
                writeln!(out)?;
            }
        }

        Ok(())
    }
}

/// Every grade entry with its classes, e.g. `1ª Série (Classe A, Classe B); 2ª Série (Classe A)`.
pub fn describe_grades(catalog: &Catalog, grades: &[DegreeAssignment]) -> String {
    grades
        .iter()
        .map(|entry| {
            format!(
                "{} ({})",
                name_or_placeholder(catalog.degree_name(entry.degree_id)),
                class_names(catalog, entry)
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn class_names(catalog: &Catalog, entry: &DegreeAssignment) -> String {
    entry
        .positions()
        .map(|position| name_or_placeholder(catalog.class_name(position)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_expanded(
    out: &mut impl Write,
    catalog: &Catalog,
    students: &[Student],
    relationship: &Relationship,
) -> io::Result<()> {
    let heading = format!(
        "#{} {} / {}",
        relationship.id,
        name_or_placeholder(catalog.teacher_name(relationship.teacher_id)),
        name_or_placeholder(catalog.matter_name(relationship.matter_id)),
    );
    writeln!(out, "{}", heading.info())?;

    for entry in &relationship.degrees {
        writeln!(
            out,
            "  {}: {}",
            name_or_placeholder(catalog.degree_name(entry.degree_id)),
            class_names(catalog, entry)
        )?;

        let assigned = assigned_students(students, entry);
        if assigned.is_empty() {
            writeln!(out, "    {}", "no students".dim())?;
        }
        for student in assigned {
            writeln!(
                out,
                "    {:<10}  {:>6}  {}",
                name_or_placeholder(catalog.class_name(student.class_id)),
                student.ra.get(),
                student.name
            )?;
        }
    }

    writeln!(out)
}
