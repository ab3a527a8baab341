//! Oldest-first retention over a task's delivered builds.

use std::path::Path;

use relay_core::DatabaseNode;

use crate::collaborators::{Evictor, RemoteSync};
use crate::error::{tool_io, ToolError};

/// Deletes evicted archives from the local repository and, best effort,
/// from the remote mirror.
pub struct RepoEvictor<'a> {
    remote: &'a dyn RemoteSync,
}

impl<'a> RepoEvictor<'a> {
    pub fn new(remote: &'a dyn RemoteSync) -> Self {
        Self { remote }
    }
}

impl Evictor for RepoEvictor<'_> {
    fn evict(
        &self,
        mut database: DatabaseNode,
        repository: &Path,
        category: &str,
        keep: usize,
    ) -> Result<DatabaseNode, ToolError> {
        if database.builds.len() <= keep {
            return Ok(database);
        }
        let excess = database.builds.len() - keep;
        let evicted: Vec<_> = database.builds.drain(..excess).collect();

        for record in evicted {
            if database.builds.iter().any(|kept| kept.name == record.name) {
                tracing::debug!(archive = %record.name, "archive still referenced, kept on disk");
                continue;
            }
            let path = repository.join(&record.name);
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::info!(archive = %record.name, version = %record.version, "evicted build"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!(archive = %record.name, "evicted build already absent from repository")
                }
                Err(e) => return Err(tool_io(&path, e)),
            }
            if let Err(err) = self.remote.remove(&record.name, category) {
                tracing::warn!(archive = %record.name, error = %err, "can't remove remote copy");
            }
        }
        Ok(database)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use relay_core::{BuildRecord, Version};
    use tempfile::TempDir;

    use super::*;
    use crate::collaborators::NoRemote;

    struct RecordingRemote {
        removed: RefCell<Vec<String>>,
        fail: bool,
    }

    impl RemoteSync for RecordingRemote {
        fn upload(&self, _local: &Path, _category: &str) -> Result<(), ToolError> {
            Ok(())
        }

        fn remove(&self, archive_name: &str, _category: &str) -> Result<(), ToolError> {
            self.removed.borrow_mut().push(archive_name.to_string());
            if self.fail {
                Err(ToolError::Rpc("remote offline".into()))
            } else {
                Ok(())
            }
        }
    }

    fn node_with(dir: &Path, versions: &[&str]) -> DatabaseNode {
        let mut node = DatabaseNode::default();
        for v in versions {
            let name = format!("Foo_{v}.7z");
            std::fs::write(dir.join(&name), v).unwrap();
            node.builds.push(BuildRecord {
                version: Version::parse(v),
                name,
            });
        }
        node
    }

    #[test]
    fn oldest_builds_are_removed_first() {
        let tmp = TempDir::new().unwrap();
        let node = node_with(tmp.path(), &["1.0", "1.1", "1.2", "1.3"]);
        let remote = RecordingRemote {
            removed: RefCell::new(vec![]),
            fail: false,
        };

        let node = RepoEvictor::new(&remote).evict(node, tmp.path(), "Office", 2).unwrap();

        let kept: Vec<_> = node.builds.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(kept, ["Foo_1.2.7z", "Foo_1.3.7z"]);
        assert!(!tmp.path().join("Foo_1.0.7z").exists());
        assert!(!tmp.path().join("Foo_1.1.7z").exists());
        assert!(tmp.path().join("Foo_1.3.7z").exists());
        assert_eq!(*remote.removed.borrow(), ["Foo_1.0.7z", "Foo_1.1.7z"]);
    }

    #[test]
    fn remote_failure_does_not_abort() {
        let tmp = TempDir::new().unwrap();
        let node = node_with(tmp.path(), &["1.0", "1.1"]);
        let remote = RecordingRemote {
            removed: RefCell::new(vec![]),
            fail: true,
        };
        let node = RepoEvictor::new(&remote).evict(node, tmp.path(), "Office", 1).unwrap();
        assert_eq!(node.builds.len(), 1);
    }

    #[test]
    fn missing_archive_is_tolerated() {
        let tmp = TempDir::new().unwrap();
        let mut node = node_with(tmp.path(), &["1.0", "1.1"]);
        std::fs::remove_file(tmp.path().join("Foo_1.0.7z")).unwrap();
        node = RepoEvictor::new(&NoRemote).evict(node, tmp.path(), "Office", 1).unwrap();
        assert_eq!(node.builds[0].name, "Foo_1.1.7z");
    }

    #[test]
    fn archive_shared_with_a_kept_record_survives() {
        let tmp = TempDir::new().unwrap();
        let mut node = node_with(tmp.path(), &["1.0", "1.1"]);
        node.builds.push(node.builds[0].clone());

        let node = RepoEvictor::new(&NoRemote).evict(node, tmp.path(), "Office", 2).unwrap();

        assert_eq!(node.builds.len(), 2);
        assert_eq!(node.builds[1].name, "Foo_1.0.7z");
        assert!(tmp.path().join("Foo_1.0.7z").exists());
    }

    #[test]
    fn under_limit_is_untouched() {
        let tmp = TempDir::new().unwrap();
        let node = node_with(tmp.path(), &["1.0"]);
        let out = RepoEvictor::new(&NoRemote).evict(node.clone(), tmp.path(), "Office", 2).unwrap();
        assert_eq!(out, node);
    }
}
