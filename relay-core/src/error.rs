//! Error types for relay-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from task-store and database operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error (database write path).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Parse error on load, with the file path and line context.
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The task directory exists but carries no `task.yaml`.
    #[error("skipping illegal task directory '{task}': no task.yaml")]
    TaskConfigMissing { task: String },

    /// The task record lacks a key the definition schema requires.
    #[error("skipping illegal task config '{task}': missing \"{field}\"")]
    MissingField { task: String, field: &'static str },

    /// The record's self-declared name differs from its directory name.
    #[error("value of \"name\" in task config is '{found}', expected '{expected}'")]
    NameMismatch { expected: String, found: String },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.relay/`.
    #[error("cannot determine home directory; set $HOME or pass --root")]
    HomeNotFound,
}

/// Errors from loading the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Parsed, but a value is outside its allowed range.
    #[error("invalid config at {path}: {message}")]
    Invalid { path: PathBuf, message: String },

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience constructor for [`RegistryError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RegistryError {
    RegistryError::Io {
        path: path.into(),
        source,
    }
}
