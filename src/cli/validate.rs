use std::io::{self, Write};

use clap::{Parser, ValueEnum};
use roster::{DataDir, IntegrityReport, Store};
use serde_json::json;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Check the roster for dangling references and duplicate ids")]
pub struct Validate {
    /// Output format
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Validate {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, data: &DataDir) -> anyhow::Result<()> {
        let store = data.load()?;
        let report = self.render(&store, &mut io::stdout().lock())?;

        // Exit with appropriate code
        if !report.is_clean() {
            std::process::exit(2);
        }

        Ok(())
    }

    /// Audits the store and writes the report.
    pub fn render(&self, store: &Store, out: &mut impl Write) -> anyhow::Result<IntegrityReport> {
        let report = IntegrityReport::audit(&store.snapshot());

        match self.output {
            OutputFormat::Table => output_table(&report, store, out)?,
            OutputFormat::Json => {
                let output = json!({
                    "status": if report.is_clean() { "healthy" } else { "issues_found" },
                    "findings": report.findings(),
                    "summary": {
                        "students": store.students().len(),
                        "relationships": store.relationships().len(),
                        "total_issues": report.len(),
                    }
                });
                writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
            }
        }

        Ok(report)
    }
}

fn output_table(report: &IntegrityReport, store: &Store, out: &mut impl Write) -> io::Result<()> {
    let students = store.students().len();
    let relationships = store.relationships().len();

    if report.is_clean() {
        return writeln!(
            out,
            "{}",
            format!(
                "✓ Roster is consistent ({students} students, {relationships} relationships)"
            )
            .success()
        );
    }

    writeln!(
        out,
        "{}",
        format!("✗ {} issues found", report.len()).warning()
    )?;
    for finding in report.findings() {
        writeln!(out, "  • {finding}")?;
    }

    Ok(())
}
