//! Contracts for the external collaborators the pipeline drives.
//!
//! Concrete adapters live in [`crate::aria2`], [`crate::seven_zip`],
//! [`crate::rclone`], [`crate::scraper`], [`crate::evict`] and
//! [`crate::preprocess`]. Tests substitute in-process fakes.

use std::path::Path;

use relay_core::{DatabaseNode, PageInfo, TaskDefinition};

use crate::error::ToolError;

/// Fetches a task page and reports its download link and checksum.
pub trait Scraper {
    fn fetch_page(&self, url: &str) -> Result<PageInfo, ToolError>;
}

/// Opaque handle for a submitted download.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(pub String);

/// Coarse state of a download job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Waiting,
    Active,
    Complete,
    Error,
}

/// One status sample reported by the download daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub state: JobState,
    pub completed_bytes: u64,
    pub total_bytes: u64,
    pub bytes_per_second: u64,
    pub error_message: Option<String>,
}

impl JobStatus {
    /// Completed fraction in `[0, 1]`; zero while the total is unknown.
    pub fn ratio(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            (self.completed_bytes as f64 / self.total_bytes as f64).min(1.0)
        }
    }
}

/// RPC-style download daemon.
pub trait DownloadDaemon {
    fn submit(&self, url: &str, dest_dir: &Path, dest_name: &str) -> Result<JobHandle, ToolError>;
    fn status(&self, job: &JobHandle) -> Result<JobStatus, ToolError>;
}

/// Archive extraction and compression.
pub trait ArchiveTool {
    fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<(), ToolError>;
    /// Compress the contents of `source_dir` into `dest_archive`.
    fn compress(&self, dest_archive: &Path, source_dir: &Path) -> Result<(), ToolError>;
}

/// Mirrors delivered archives to remote storage, keyed by category.
pub trait RemoteSync {
    fn upload(&self, local: &Path, category: &str) -> Result<(), ToolError>;

    /// Delete a mirrored archive. Remotes that cannot delete keep the default.
    fn remove(&self, _archive_name: &str, _category: &str) -> Result<(), ToolError> {
        Ok(())
    }
}

/// Remote that mirrors nothing; used when no remote is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRemote;

impl RemoteSync for NoRemote {
    fn upload(&self, local: &Path, category: &str) -> Result<(), ToolError> {
        tracing::debug!(path = %local.display(), category, "remote disabled, skipping upload");
        Ok(())
    }
}

/// Retention policy over a task's delivered builds.
pub trait Evictor {
    /// Drop the oldest records until at most `keep` remain, deleting their
    /// archives from `repository`.
    fn evict(
        &self,
        database: DatabaseNode,
        repository: &Path,
        category: &str,
        keep: usize,
    ) -> Result<DatabaseNode, ToolError>;
}

/// Task-specific cleanup of the extracted release tree.
pub trait Preprocessor {
    fn preprocess(&self, task: &TaskDefinition, release_dir: &Path) -> Result<(), ToolError>;
}
