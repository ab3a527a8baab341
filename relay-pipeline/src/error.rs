//! Error types for relay-pipeline.
//!
//! Every variant is fatal to the current task's run only; the batch runner
//! logs it and moves on to the next task.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage an error originated in, used as a structured log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Registry,
    Scrape,
    Transfer,
    Extraction,
    Build,
    Packaging,
    Delivery,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Registry => "registry",
            Stage::Scrape => "scrape",
            Stage::Transfer => "transfer",
            Stage::Extraction => "extraction",
            Stage::Build => "build",
            Stage::Packaging => "packaging",
            Stage::Delivery => "delivery",
        };
        f.write_str(label)
    }
}

/// All errors that can abandon a task's run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed or missing task definition.
    #[error("invalid task '{task}': {source}")]
    Validation {
        task: String,
        #[source]
        source: relay_core::RegistryError,
    },

    /// Page unreachable or version pattern absent.
    #[error("scrape failed for '{task}': {message}")]
    Scrape { task: String, message: String },

    /// Download daemon failure, missing file, or checksum mismatch.
    #[error("transfer failed for '{task}': {message}")]
    Transfer { task: String, message: String },

    /// Workshop preparation, archive tool failure, or missing release path.
    #[error("extraction failed for '{task}': {message}")]
    Extraction { task: String, message: String },

    /// Script failure or timeout, missing executable, or missing build path.
    #[error("build failed for '{task}': {message}")]
    Build { task: String, message: String },

    /// Compression, move, or eviction failure.
    #[error("packaging failed for '{task}': {message}")]
    Packaging { task: String, message: String },

    /// Remote mirror failure.
    #[error("delivery failed for '{task}': {message}")]
    Delivery { task: String, message: String },

    /// The download daemon could not be reached at all. Aborts the batch.
    #[error("download daemon unavailable: {0}")]
    DaemonUnavailable(String),

    /// Database persistence failure after a successful delivery.
    #[error("database error: {0}")]
    Database(#[from] relay_core::RegistryError),
}

impl PipelineError {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Validation { .. } => Some(Stage::Registry),
            PipelineError::Scrape { .. } => Some(Stage::Scrape),
            PipelineError::Transfer { .. } => Some(Stage::Transfer),
            PipelineError::Extraction { .. } => Some(Stage::Extraction),
            PipelineError::Build { .. } => Some(Stage::Build),
            PipelineError::Packaging { .. } => Some(Stage::Packaging),
            PipelineError::Delivery { .. } => Some(Stage::Delivery),
            PipelineError::DaemonUnavailable(_) | PipelineError::Database(_) => None,
        }
    }
}

/// Result of one pipeline stage.
pub type StageResult<T> = Result<T, PipelineError>;

/// Failure reported by a collaborator (external tool, daemon, remote).
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("http error: {0}")]
    Http(String),
}

pub(crate) fn tool_io(path: impl Into<PathBuf>, source: std::io::Error) -> ToolError {
    ToolError::Io {
        path: path.into(),
        source,
    }
}
