use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::generator::DEFAULT_LABEL;

/// Settings for a roster data directory.
///
/// Read from `roster.toml` inside the data directory. Every field has a
/// default, so a file containing only `_version = "1"` is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Versions")]
pub struct Config {
    /// Prefix of generated student names.
    ///
    /// A generated student is named `"{generated_label} {id}"`.
    generated_label: String,

    /// Seed for the student generator.
    ///
    /// When set, every session generates the same batches. When unset, the
    /// generator is seeded from the operating system.
    pub seed: Option<u64>,

    /// Default number of rows shown by listings.
    list_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generated_label: default_label(),
            seed: None,
            list_limit: default_list_limit(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        toml::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Returns the prefix of generated student names.
    #[must_use]
    pub fn generated_label(&self) -> &str {
        &self.generated_label
    }

    /// Returns the default number of rows shown by listings.
    #[must_use]
    pub const fn list_limit(&self) -> usize {
        self.list_limit
    }
}

fn default_label() -> String {
    DEFAULT_LABEL.to_string()
}

const fn default_list_limit() -> usize {
    200
}

/// Errors raised while reading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file: {0}")]
    Read(#[source] std::io::Error),

    /// The file is not valid TOML for this configuration.
    #[error("Failed to parse config file: {0}")]
    Parse(#[source] toml::de::Error),
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_label")]
        generated_label: String,

        #[serde(default)]
        seed: Option<u64>,

        #[serde(default = "default_list_limit")]
        list_limit: usize,
    },
}

impl From<Versions> for super::Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                generated_label,
                seed,
                list_limit,
            } => Self {
                generated_label,
                seed,
                list_limit,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\ngenerated_label = \"Estudante\"\nseed = 7\nlist_limit = 25\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.generated_label(), "Estudante");
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.list_limit(), 25);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(matches!(error, ConfigError::Read(_)));
        assert!(error.to_string().starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nlist_limit = \"many\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.to_string().starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
        assert_eq!(actual.generated_label(), "Aluno Gerado");
        assert_eq!(actual.list_limit(), 200);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let error = toml::from_str::<Config>(r#"_version = "2""#).unwrap_err();
        assert!(error.to_string().contains("_version") || error.to_string().contains("variant"));
    }
}
