//! Run configuration.
//!
//! The project root normally comes from the `SCOP_ROOT` environment
//! variable; an empty value counts as unset.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable holding the project root path.
pub const PROJECT_ROOT_ENV: &str = "SCOP_ROOT";

/// File name of the tabular output.
pub const CSV_FILE_NAME: &str = "static_function_analysis.csv";

/// File name of the structured-document output.
pub const JSON_FILE_NAME: &str = "static_function_analysis.json";

/// Settings for one driver run.
#[derive(Debug, Clone)]
pub struct Config {
    project_root: Option<String>,
    output_dir: PathBuf,
}

impl Config {
    /// Configuration with no project root, writing into the current directory.
    pub fn new() -> Self {
        Self {
            project_root: None,
            output_dir: PathBuf::from("."),
        }
    }

    /// Read the project root from `SCOP_ROOT`.
    pub fn from_env() -> Self {
        Self::new().with_project_root(env::var(PROJECT_ROOT_ENV).ok())
    }

    pub fn with_project_root<S: Into<String>>(mut self, root: Option<S>) -> Self {
        self.project_root = root.map(Into::into);
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// The configured project root, `None` when unset or empty.
    pub fn project_root(&self) -> Option<&str> {
        self.project_root.as_deref().filter(|root| !root.is_empty())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(CSV_FILE_NAME)
    }

    pub fn json_path(&self) -> PathBuf {
        self.output_dir.join(JSON_FILE_NAME)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
