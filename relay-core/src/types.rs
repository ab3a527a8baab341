//! Domain types for relay.
//!
//! Requirement paths are kept as the relative strings written in `task.yaml`
//! and resolved against the workshop by the pipeline.
//! All types are serializable/deserializable via serde.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::version::Version;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed task name. Doubles as the task's storage key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskName(pub String);

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TaskName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for TaskName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Task definition
// ---------------------------------------------------------------------------

/// Declarative descriptor of one monitored piece of software.
///
/// Loaded fresh from `tasks/<name>/task.yaml` on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub name: TaskName,
    /// Repository sub-directory the delivered archives land in.
    pub category: String,
    pub author: String,
    /// Page the version and download link are scraped from.
    pub url: String,
    /// Paths relative to `release/` that must exist after extraction.
    pub release_requirement: Vec<String>,
    /// Paths relative to `build/` that must exist before packaging.
    pub build_requirement: Vec<String>,
    pub preprocess: bool,
    pub auto_make: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl TaskDefinition {
    /// Keys every `task.yaml` must carry, in the order they are checked.
    pub const REQUIRED_FIELDS: [&'static str; 8] = [
        "name",
        "category",
        "author",
        "url",
        "release_requirement",
        "build_requirement",
        "preprocess",
        "auto_make",
    ];
}

/// Result of scraping a task page. Lives for one task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    /// Resolved download URL.
    pub href: String,
    /// Raw page text the version is extracted from.
    pub text: String,
    pub checksum: Option<String>,
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// One delivered archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub version: Version,
    /// Archive file name inside `builds/<category>/`.
    pub name: String,
}

/// Persisted per-task state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DatabaseNode {
    pub latest_version: Version,
    /// Delivered builds, oldest first.
    #[serde(default)]
    pub builds: Vec<BuildRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DatabaseNode {
    /// Record a freshly delivered build as the newest entry.
    pub fn record_delivery(&mut self, version: Version, archive_name: String) {
        self.latest_version = version.clone();
        self.builds.push(BuildRecord {
            version,
            name: archive_name,
        });
        self.updated_at = Some(Utc::now());
    }

    pub fn newest_build(&self) -> Option<&BuildRecord> {
        self.builds.last()
    }
}

/// The whole database: one node per task, keyed by task name.
pub type Database = BTreeMap<TaskName, DatabaseNode>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
