//! Plain-text tables and CSV shared by the listing commands.

use std::io::{self, Write};

/// Rows of cells under a fixed set of headers.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            headers: headers.into_iter().collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    /// Writes an aligned table.
    ///
    /// In quiet mode the headers are dropped and cells are tab separated.
    pub fn write(&self, out: &mut impl Write, quiet: bool) -> io::Result<()> {
        if quiet {
            for row in &self.rows {
                writeln!(out, "{}", row.join("\t"))?;
            }
            return Ok(());
        }

        // Widths count characters, not bytes, so accented names line up.
        let widths = self
            .headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                self.rows
                    .iter()
                    .map(|row| row[idx].chars().count())
                    .max()
                    .unwrap_or(0)
                    .max(header.chars().count())
            })
            .collect::<Vec<_>>();

        write_row(out, self.headers.iter().copied(), &widths)?;
        let rules = widths.iter().map(|&width| "-".repeat(width)).collect::<Vec<_>>();
        write_row(out, rules.iter().map(String::as_str), &widths)?;

        for row in &self.rows {
            write_row(out, row.iter().map(String::as_str), &widths)?;
        }

        Ok(())
    }

    /// Writes the table as CSV, with a header line unless `quiet`.
    pub fn write_csv(&self, out: &mut impl Write, quiet: bool) -> io::Result<()> {
        if !quiet {
            let header_line = self
                .headers
                .iter()
                .map(|header| csv_escape(header))
                .collect::<Vec<_>>()
                .join(",");
            writeln!(out, "{header_line}")?;
        }

        for row in &self.rows {
            let line = row
                .iter()
                .map(|value| csv_escape(value))
                .collect::<Vec<_>>()
                .join(",");
            writeln!(out, "{line}")?;
        }

        Ok(())
    }
}

fn write_row<'a>(
    out: &mut impl Write,
    cells: impl Iterator<Item = &'a str>,
    widths: &[usize],
) -> io::Result<()> {
    let line = cells
        .zip(widths)
        .map(|(value, &width)| format!("{value:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{}", line.trim_end())
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

/// Skips `offset` items, then keeps at most `limit`.
pub fn page<T>(items: Vec<T>, offset: Option<usize>, limit: usize) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.unwrap_or(0))
        .take(limit)
        .collect()
}
