//! Directory-backed task definition store.
//!
//! # Storage layout
//!
//! ```text
//! <root>/tasks/
//!   <task_name>/
//!     task.yaml      (declarative TaskDefinition)
//!     make.sh        (optional build script; make.cmd on Windows)
//!     utils/         (optional auxiliary files)
//!     cover.png      (optional)
//! ```
//!
//! A task entry is valid only when `task.yaml` exists, carries every key in
//! [`TaskDefinition::REQUIRED_FIELDS`], and its `name` equals the directory
//! name. Invalid entries produce a [`RegistryError`] for that task only.

use std::path::Path;

use serde_yaml::Value;

use crate::error::{io_err, RegistryError};
use crate::layout::Layout;
use crate::types::{TaskDefinition, TaskName};

// ---------------------------------------------------------------------------
// 1. List
// ---------------------------------------------------------------------------

/// Names of all task directories under `<root>/tasks/`, sorted.
pub fn list_tasks(layout: &Layout) -> Result<Vec<TaskName>, RegistryError> {
    let dir = layout.tasks_dir();
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut names: Vec<TaskName> = std::fs::read_dir(&dir)
        .map_err(|e| io_err(&dir, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| TaskName::from(e.file_name().to_string_lossy().into_owned()))
        .collect();
    names.sort();
    Ok(names)
}

// ---------------------------------------------------------------------------
// 2. Load + validate
// ---------------------------------------------------------------------------

/// Load and validate `<root>/tasks/<name>/task.yaml`.
pub fn load_task(layout: &Layout, name: &TaskName) -> Result<TaskDefinition, RegistryError> {
    let path = layout.task_config(name);
    if !path.exists() {
        return Err(RegistryError::TaskConfigMissing {
            task: name.0.clone(),
        });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    parse_task(&path, name, &contents)
}

fn parse_task(path: &Path, name: &TaskName, contents: &str) -> Result<TaskDefinition, RegistryError> {
    let parse_err = |message: String| RegistryError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let value: Value = serde_yaml::from_str(contents).map_err(|e| parse_err(e.to_string()))?;
    let Value::Mapping(mapping) = &value else {
        return Err(parse_err("expected a mapping at the top level".to_string()));
    };

    let missing = |field: &'static str| RegistryError::MissingField {
        task: name.0.clone(),
        field,
    };

    // The name is checked first so a misplaced record reports the mismatch.
    let declared = mapping.get("name").ok_or_else(|| missing("name"))?;
    let declared = declared.as_str().unwrap_or_default();
    if declared != name.0 {
        return Err(RegistryError::NameMismatch {
            expected: name.0.clone(),
            found: declared.to_string(),
        });
    }

    if let Some(field) = TaskDefinition::REQUIRED_FIELDS
        .into_iter()
        .find(|field| !mapping.contains_key(*field))
    {
        return Err(missing(field));
    }

    serde_yaml::from_value(value).map_err(|e| parse_err(e.to_string()))
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically write a task definition to `<root>/tasks/<name>/task.yaml`.
///
/// Write flow: serialize → `task.yaml.tmp` sibling → `rename`.
pub fn save_task(layout: &Layout, task: &TaskDefinition) -> Result<(), RegistryError> {
    let dir = layout.task_dir(&task.name);
    std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
    let path = layout.task_config(&task.name);
    let tmp = path.with_extension("yaml.tmp");

    let yaml = serde_yaml::to_string(task)?;
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
