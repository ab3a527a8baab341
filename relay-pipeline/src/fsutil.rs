//! Filesystem helpers shared by the stages.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{tool_io, ToolError};

/// First entry of `required` (relative to `base`) that does not exist.
pub(crate) fn first_missing<'a>(base: &Path, required: &'a [String]) -> Option<&'a str> {
    required
        .iter()
        .find(|rel| !base.join(rel.as_str()).exists())
        .map(String::as_str)
}

/// Recursively copy `src` into `dest`, creating `dest` if needed.
pub(crate) fn copy_dir(src: &Path, dest: &Path) -> Result<(), ToolError> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| src.to_path_buf());
            tool_io(path, e.into())
        })?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| tool_io(&target, e))?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| tool_io(parent, e))?;
            }
            std::fs::copy(entry.path(), &target).map_err(|e| tool_io(&target, e))?;
        }
    }
    Ok(())
}

/// Move `src` to `dest`, falling back to copy + delete across filesystems.
pub(crate) fn move_path(src: &Path, dest: &Path) -> Result<(), ToolError> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| tool_io(parent, e))?;
    }
    if std::fs::rename(src, dest).is_ok() {
        return Ok(());
    }
    if src.is_dir() {
        copy_dir(src, dest)?;
        std::fs::remove_dir_all(src).map_err(|e| tool_io(src, e))?;
    } else {
        std::fs::copy(src, dest).map_err(|e| tool_io(dest, e))?;
        std::fs::remove_file(src).map_err(|e| tool_io(src, e))?;
    }
    Ok(())
}

/// Remove `dir` if present and recreate it empty.
pub(crate) fn reset_dir(dir: &Path) -> Result<(), ToolError> {
    if dir.exists() {
        std::fs::remove_dir_all(dir).map_err(|e| tool_io(dir, e))?;
    }
    std::fs::create_dir_all(dir).map_err(|e| tool_io(dir, e))
}

/// Sorted file names (not directories) directly inside `dir`.
pub(crate) fn file_names(dir: &Path) -> Result<Vec<(String, PathBuf)>, ToolError> {
    let mut names: Vec<(String, PathBuf)> = std::fs::read_dir(dir)
        .map_err(|e| tool_io(dir, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| (e.file_name().to_string_lossy().into_owned(), e.path()))
        .collect();
    names.sort();
    Ok(names)
}
