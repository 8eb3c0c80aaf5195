use std::io::{self, Write};

use clap::Parser;
use roster::{DataDir, Store, domain::query::students_per_degree};
use tracing::instrument;

use super::terminal::{Colorize, terminal_width};

/// Bars never shrink below this many columns, even on narrow terminals.
const MIN_BAR: usize = 10;

const BAR: char = '█';

/// Command arguments for `school chart`.
#[derive(Debug, Parser)]
#[command(about = "Show the number of students per degree as a bar chart")]
pub struct Chart {
    /// Total width in columns, at most 65535 (default: terminal width).
    #[arg(long, value_name = "COLUMNS")]
    width: Option<u16>,
}

impl Chart {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, data: &DataDir) -> anyhow::Result<()> {
        let store = data.load()?;
        self.render(&store, &mut io::stdout().lock())?;
        Ok(())
    }

    pub fn render(&self, store: &Store, out: &mut impl Write) -> io::Result<()> {
        let counts = students_per_degree(store.catalog(), store.students());
        if counts.is_empty() {
            return writeln!(out, "{}", "No degrees in the catalog".dim());
        }

        let label_width = counts
            .iter()
            .map(|entry| entry.name.chars().count())
            .max()
            .unwrap_or(0);
        let count_width = counts
            .iter()
            .map(|entry| entry.count.to_string().len())
            .max()
            .unwrap_or(1);
        let max = counts.iter().map(|entry| entry.count).max().unwrap_or(0);

        let width = self.width.map_or_else(terminal_width, usize::from);
        let space = width
            .saturating_sub(label_width + count_width + 4)
            .max(MIN_BAR);

        for entry in &counts {
            let bar: String = std::iter::repeat_n(BAR, bar_len(entry.count, max, space)).collect();
            writeln!(
                out,
                "{:<label_width$}  {:>count_width$}  {}",
                entry.name,
                entry.count,
                bar.info()
            )?;
        }

        Ok(())
    }
}

/// Columns for a bar of `count` when `max` fills `space`.
///
/// Any non-zero count gets at least one column.
fn bar_len(count: usize, max: usize, space: usize) -> usize {
    if count == 0 || max == 0 {
        return 0;
    }
    ((count * space + max / 2) / max).max(1)
}
