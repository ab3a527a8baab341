//! On-disk layout of a relay root.
//!
//! ```text
//! <root>/
//!   relay.yaml
//!   database.json
//!   tasks/<name>/task.yaml      (+ make.cmd | make.sh, utils/, cover.*)
//!   workshop/<name>/            target.exe, release/, build/, make.log
//!   builds/<category>/          delivered archives
//! ```

use std::path::{Path, PathBuf};

use crate::error::RegistryError;
use crate::types::TaskName;

pub const CONFIG_FILE: &str = "relay.yaml";
pub const DATABASE_FILE: &str = "database.json";
pub const TASKS_DIR: &str = "tasks";
pub const WORKSHOP_DIR: &str = "workshop";
pub const BUILDS_DIR: &str = "builds";

pub const TASK_CONFIG_FILE: &str = "task.yaml";
pub const UTILS_DIR: &str = "utils";
pub const COVER_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

pub const DOWNLOAD_FILE: &str = "target.exe";
pub const RELEASE_DIR: &str = "release";
pub const BUILD_DIR: &str = "build";
pub const BUILD_LOG: &str = "make.log";

#[cfg(windows)]
pub const BUILD_SCRIPT: &str = "make.cmd";
#[cfg(not(windows))]
pub const BUILD_SCRIPT: &str = "make.sh";

/// Resolved paths for one relay root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.relay`, resolved with `dirs::home_dir()`.
    pub fn default_root() -> Result<PathBuf, RegistryError> {
        dirs::home_dir()
            .map(|home| home.join(".relay"))
            .ok_or(RegistryError::HomeNotFound)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join(TASKS_DIR)
    }

    pub fn workshop_root(&self) -> PathBuf {
        self.root.join(WORKSHOP_DIR)
    }

    pub fn builds_root(&self) -> PathBuf {
        self.root.join(BUILDS_DIR)
    }

    // -- task definition store ----------------------------------------------

    pub fn task_dir(&self, task: &TaskName) -> PathBuf {
        self.tasks_dir().join(&task.0)
    }

    pub fn task_config(&self, task: &TaskName) -> PathBuf {
        self.task_dir(task).join(TASK_CONFIG_FILE)
    }

    // -- per-task workshop --------------------------------------------------

    pub fn workshop(&self, task: &TaskName) -> PathBuf {
        self.workshop_root().join(&task.0)
    }

    pub fn download_target(&self, task: &TaskName) -> PathBuf {
        self.workshop(task).join(DOWNLOAD_FILE)
    }

    pub fn release_dir(&self, task: &TaskName) -> PathBuf {
        self.workshop(task).join(RELEASE_DIR)
    }

    pub fn build_dir(&self, task: &TaskName) -> PathBuf {
        self.workshop(task).join(BUILD_DIR)
    }

    pub fn build_log(&self, task: &TaskName) -> PathBuf {
        self.workshop(task).join(BUILD_LOG)
    }

    // -- repository ---------------------------------------------------------

    pub fn repository(&self, category: &str) -> PathBuf {
        self.builds_root().join(category)
    }
}

/// Deterministic archive name: `<name>_<version>_<author>（bot）.7z`.
pub fn archive_name(task: &TaskName, version: &impl std::fmt::Display, author: &str) -> String {
    format!("{}_{}_{}（bot）.7z", task.0, version, author)
}
