use std::{
    io::{self, Write},
    num::NonZeroUsize,
};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use regex::RegexBuilder;
use roster::{Catalog, ClassPosition, Config, DataDir, DegreeId, Store, Student, StudentFilter};
use serde::Serialize;
use tracing::instrument;

use super::{
    name_or_placeholder,
    table::{Table, page},
};

/// Command arguments for `school students`.
#[derive(Debug, Parser)]
#[command(about = "List students, optionally filtered by degree, class or name")]
pub struct Students {
    /// Only students in this degree (by id).
    #[arg(long, value_name = "ID")]
    degree: Option<DegreeId>,

    /// Only students in this class (by position, starting at 1).
    #[arg(long, value_name = "N")]
    class: Option<ClassPosition>,

    /// Case-insensitive regular expression matched against the name.
    #[arg(long, value_name = "REGEX")]
    name: Option<String>,

    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Suppress headers and format rows for scripting.
    #[arg(long)]
    quiet: bool,

    /// Limit number of rows returned, at least 1 (default from config).
    #[arg(long)]
    limit: Option<NonZeroUsize>,

    /// Skip the first N rows.
    #[arg(long)]
    offset: Option<usize>,
}

/// Supported output formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// A student with its catalog references resolved, for JSON output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StudentRow<'a> {
    #[serde(flatten)]
    student: &'a Student,
    degree_name: Option<&'a str>,
    class_name: Option<&'a str>,
}

impl Students {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, data: &DataDir) -> anyhow::Result<()> {
        let store = data.load()?;
        let config = data.config();
        self.render(&store, &config, &mut io::stdout().lock())
    }

    pub fn render(&self, store: &Store, config: &Config, out: &mut impl Write) -> anyhow::Result<()> {
        let filter = self.filter()?;

        let limit = self
            .limit
            .map_or_else(|| config.list_limit(), NonZeroUsize::get);
        let students = page(filter.apply(store.students()), self.offset, limit);
        let catalog = store.catalog();

        match self.output {
            OutputFormat::Table => table(catalog, &students).write(out, self.quiet)?,
            OutputFormat::Csv => table(catalog, &students).write_csv(out, self.quiet)?,
            OutputFormat::Json => {
                let rows: Vec<StudentRow> = students
                    .iter()
                    .map(|student| StudentRow {
                        student,
                        degree_name: catalog.degree_name(student.degree_id),
                        class_name: catalog.class_name(student.class_id),
                    })
                    .collect();
                serde_json::to_writer_pretty(&mut *out, &rows)
                    .context("failed to render json output")?;
                writeln!(out)?;
            }
        }

        Ok(())
    }

    fn filter(&self) -> anyhow::Result<StudentFilter> {
        let name = self
            .name
            .as_deref()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .with_context(|| format!("invalid name pattern '{pattern}'"))
            })
            .transpose()?;

        Ok(StudentFilter {
            degree: self.degree,
            class: self.class,
            name,
        })
    }
}

fn table(catalog: &Catalog, students: &[Student]) -> Table {
    let mut table = Table::new(["ID", "RA", "Name", "Degree", "Class"]);
    for student in students {
        table.push(vec![
            student.id.to_string(),
            student.ra.to_string(),
            student.name.clone(),
            name_or_placeholder(catalog.degree_name(student.degree_id)).to_string(),
            name_or_placeholder(catalog.class_name(student.class_id)).to_string(),
        ]);
    }
    table
}
