//! Persisted per-task delivery state.
//!
//! Persists a [`Database`] JSON document at `<root>/database.json`.
//! Writes use the same atomic `.tmp` + rename pattern as the task store.

use crate::error::{io_err, RegistryError};
use crate::layout::Layout;
use crate::types::{Database, DatabaseNode, TaskName};

/// Load the database. Returns an empty database if the file does not yet exist.
pub fn load(layout: &Layout) -> Result<Database, RegistryError> {
    let path = layout.database_path();
    if !path.exists() {
        return Ok(Database::new());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_json::from_str(&contents).map_err(|e| RegistryError::Parse {
        path,
        message: e.to_string(),
    })
}

/// Save the database atomically: `<path>.tmp` then rename to `<path>`.
pub fn save(layout: &Layout, database: &Database) -> Result<(), RegistryError> {
    let path = layout.database_path();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }

    let json = serde_json::to_string_pretty(database)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// The node for `task`, or a fresh node at version zero if the task has
/// never been delivered.
pub fn node_for(database: &Database, task: &TaskName) -> DatabaseNode {
    database.get(task).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BuildRecord;
    use crate::version::Version;
    use tempfile::TempDir;

    #[test]
    fn empty_database_when_file_missing() {
        let tmp = TempDir::new().unwrap();
        let db = load(&Layout::new(tmp.path())).unwrap();
        assert!(db.is_empty());
    }

    #[test]
    fn roundtrip_save_load() {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path());
        let mut db = Database::new();
        db.insert(
            TaskName::from("Foo"),
            DatabaseNode {
                latest_version: Version::parse("1.0"),
                builds: vec![BuildRecord {
                    version: Version::parse("1.0"),
                    name: "Foo_1.0_Cno（bot）.7z".into(),
                }],
                updated_at: None,
            },
        );
        save(&layout, &db).unwrap();
        assert_eq!(load(&layout).unwrap(), db);
        assert!(!layout.database_path().with_extension("json.tmp").exists());
    }

    #[test]
    fn malformed_database_reports_path() {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path());
        std::fs::write(layout.database_path(), "{ not json").unwrap();
        let err = load(&layout).unwrap_err();
        assert!(err.to_string().contains("database.json"), "got: {err}");
    }

    #[test]
    fn node_for_unknown_task_defaults_to_zero() {
        let node = node_for(&Database::new(), &TaskName::from("New"));
        assert_eq!(node.latest_version, Version::zero());
    }
}
