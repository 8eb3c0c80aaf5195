//! A filesystem backed roster
//!
//! The [`DataDir`] reads the fixed catalog and the seed collections from a
//! directory of JSON documents and hands them to a new [`Store`].

use std::{io, path::PathBuf};

use serde::{Deserialize, de::DeserializeOwned};
use tracing::instrument;

use crate::domain::{Catalog, Class, Config, Store};

/// Name of the configuration file inside a data directory.
pub const CONFIG_FILE: &str = "roster.toml";

const DEGREES: &str = "degrees.json";
const CLASSES: &str = "classes.json";
const TEACHERS: &str = "teachers.json";
const MATTERS: &str = "matters.json";
const STUDENTS: &str = "students.json";
const RELATIONSHIPS: &str = "relationships.json";

/// A directory holding the roster's JSON documents.
///
/// | File | Contents | Required |
/// |---|---|---|
/// | `degrees.json` | array of grade levels | yes |
/// | `classes.json` | `{"classes": [...]}` | yes |
/// | `teachers.json` | array of teachers | yes |
/// | `matters.json` | array of subjects | yes |
/// | `students.json` | array of students | no |
/// | `relationships.json` | array of teaching assignments | no |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Opens a data directory at the given path.
    ///
    /// Nothing is read until [`DataDir::load`] is called.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The directory's configuration.
    ///
    /// Falls back to the default configuration when `roster.toml` is missing
    /// or invalid.
    #[must_use]
    pub fn config(&self) -> Config {
        let path = self.root.join(CONFIG_FILE);
        Config::load(&path).unwrap_or_else(|e| {
            tracing::debug!("Failed to load config: {e}");
            Config::default()
        })
    }

    /// Reads every document and builds a store from them.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Read`] if a catalog document is missing or any
    /// document cannot be read, and [`LoadError::Parse`] if a document is not
    /// valid JSON of the expected shape.
    #[instrument(level = "debug", skip(self), fields(root = %self.root.display()))]
    pub fn load(&self) -> Result<Store, LoadError> {
        let degrees = self.read_required(DEGREES)?;
        let ClassesDocument { classes } = self.read_required(CLASSES)?;
        let teachers = self.read_required(TEACHERS)?;
        let matters = self.read_required(MATTERS)?;
        let students = self.read_optional(STUDENTS)?;
        let relationships = self.read_optional(RELATIONSHIPS)?;

        let catalog = Catalog::new(degrees, classes, teachers, matters);
        tracing::debug!(
            degrees = catalog.degrees().len(),
            classes = catalog.classes().len(),
            teachers = catalog.teachers().len(),
            matters = catalog.matters().len(),
            students = students.len(),
            relationships = relationships.len(),
            "loaded roster"
        );

        Ok(Store::new(catalog, students, relationships))
    }

    fn read_required<T: DeserializeOwned>(&self, name: &'static str) -> Result<T, LoadError> {
        let path = self.root.join(name);
        let content = std::fs::read_to_string(&path).map_err(|source| LoadError::Read {
            file: name,
            source,
        })?;
        parse(name, &content)
    }

    fn read_optional<T: DeserializeOwned>(&self, name: &'static str) -> Result<Vec<T>, LoadError> {
        let path = self.root.join(name);
        match std::fs::read_to_string(&path) {
            Ok(content) => parse(name, &content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(file = name, "optional document missing, starting empty");
                Ok(Vec::new())
            }
            Err(source) => Err(LoadError::Read { file: name, source }),
        }
    }
}

fn parse<T: DeserializeOwned>(name: &'static str, content: &str) -> Result<T, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::Parse { file: name, source })
}

/// The class catalog is wrapped in an object rather than stored as a bare
/// array.
#[derive(Debug, Deserialize)]
struct ClassesDocument {
    classes: Vec<Class>,
}

/// Errors that can occur when loading a data directory.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A document could not be read.
    #[error("failed to read {file}")]
    Read {
        /// The document's file name.
        file: &'static str,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// A document is not valid JSON of the expected shape.
    #[error("failed to parse {file}")]
    Parse {
        /// The document's file name.
        file: &'static str,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

impl LoadError {
    /// The file name of the failing document.
    #[must_use]
    pub const fn file(&self) -> &'static str {
        match self {
            Self::Read { file, .. } | Self::Parse { file, .. } => file,
        }
    }
}
