use std::path::PathBuf;

mod chart;
mod relationships;
mod shell;
mod students;
mod table;
mod terminal;
mod validate;

use chart::Chart;
use clap::ArgAction;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use relationships::Relationships;
use roster::{Config, DataDir};
use shell::Shell;
use students::Students;
use validate::Validate;

/// Shown in place of a name that does not resolve.
const MISSING: &str = "-";

/// Resolves an optional catalog name to something printable.
fn name_or_placeholder(name: Option<&str>) -> &str {
    name.unwrap_or(MISSING)
}

/// The random source for the student generator.
///
/// A configured seed makes every session generate the same students.
fn generator_rng(config: &Config) -> ChaCha8Rng {
    config.seed.map_or_else(
        || ChaCha8Rng::from_rng(&mut rand::rng()),
        ChaCha8Rng::seed_from_u64,
    )
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The directory holding the roster's JSON documents
    #[arg(short, long, default_value = "data", global = true)]
    data: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.run(&DataDir::new(self.data))
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// List students, optionally filtered by degree, class or name
    Students(Students),

    /// List teaching assignments
    ///
    /// An assignment binds a teacher and a subject to one or more degrees,
    /// and within each degree to one or more classes.
    Relationships(Relationships),

    /// Show the number of students per degree as a bar chart
    Chart(Chart),

    /// Check the roster for dangling references and duplicate ids
    Validate(Validate),

    /// Start an interactive session that can edit the roster
    ///
    /// Changes last until the session ends; nothing is written back to disk.
    Shell(Shell),
}

impl Command {
    fn run(self, data: &DataDir) -> anyhow::Result<()> {
        match self {
            Self::Students(command) => command.run(data)?,
            Self::Relationships(command) => command.run(data)?,
            Self::Chart(command) => command.run(data)?,
            Self::Validate(command) => command.run(data)?,
            Self::Shell(command) => command.run(data)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rand::Rng;

    use super::*;

    #[test]
    fn data_directory_defaults_to_data() {
        let cli = Cli::try_parse_from(["school", "chart"]).unwrap();
        assert_eq!(cli.data, PathBuf::from("data"));
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["school", "students", "-vv", "--data", "/tmp/x"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.data, PathBuf::from("/tmp/x"));
    }

    #[test]
    fn seeded_config_gives_reproducible_rng() {
        let mut config = Config::default();
        config.seed = Some(11);

        let first: u64 = generator_rng(&config).random();
        let second: u64 = generator_rng(&config).random();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_names_use_placeholder() {
        assert_eq!(name_or_placeholder(None), "-");
        assert_eq!(name_or_placeholder(Some("Classe A")), "Classe A");
    }
}
