//! Default preprocessor: strips installer bookkeeping left behind when an
//! NSIS-style setup executable is unpacked as an archive.

use std::path::Path;

use relay_core::TaskDefinition;

use crate::collaborators::Preprocessor;
use crate::error::{tool_io, ToolError};

/// Entries NSIS unpacking leaves at the top of `release/`.
pub const INSTALLER_DEBRIS: [&str; 4] = ["$PLUGINSDIR", "$TEMP", "$R0", "[NSIS].nsi"];

#[derive(Debug, Default, Clone, Copy)]
pub struct InstallerCleanup;

impl Preprocessor for InstallerCleanup {
    fn preprocess(&self, task: &TaskDefinition, release_dir: &Path) -> Result<(), ToolError> {
        for entry in INSTALLER_DEBRIS {
            let path = release_dir.join(entry);
            let removed = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else if path.exists() {
                std::fs::remove_file(&path)
            } else {
                continue;
            };
            removed.map_err(|e| tool_io(&path, e))?;
            tracing::debug!(task = %task.name, entry, "removed installer debris");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use predicates::prelude::*;

    use super::*;

    fn task() -> TaskDefinition {
        TaskDefinition {
            name: "Foo".into(),
            category: "Office".into(),
            author: "Cno".into(),
            url: "https://example.com".into(),
            release_requirement: vec![],
            build_requirement: vec![],
            preprocess: true,
            auto_make: false,
            checksum: None,
        }
    }

    #[test]
    fn debris_is_removed_and_payload_kept() {
        let release = TempDir::new().unwrap();
        release.child("$PLUGINSDIR/System.dll").touch().unwrap();
        release.child("[NSIS].nsi").touch().unwrap();
        release.child("Foo.exe").touch().unwrap();

        InstallerCleanup.preprocess(&task(), release.path()).unwrap();

        release.child("$PLUGINSDIR").assert(predicate::path::missing());
        release.child("[NSIS].nsi").assert(predicate::path::missing());
        release.child("Foo.exe").assert(predicate::path::exists());
    }

    #[test]
    fn clean_release_is_a_no_op() {
        let release = TempDir::new().unwrap();
        release.child("Foo.exe").touch().unwrap();
        assert!(InstallerCleanup.preprocess(&task(), release.path()).is_ok());
    }
}
