//! rclone adapter implementing [`RemoteSync`].
//!
//! Archives are mirrored to `<remote>:<path>/<category>/`.

use std::path::Path;
use std::process::Command;

use relay_core::config::RemoteConfig;

use crate::collaborators::RemoteSync;
use crate::error::ToolError;

#[derive(Debug, Clone)]
pub struct Rclone {
    program: String,
    remote: RemoteConfig,
}

impl Rclone {
    pub fn new(program: impl Into<String>, remote: RemoteConfig) -> Self {
        Self {
            program: program.into(),
            remote,
        }
    }

    /// `<remote>:<path>/<category>`
    pub fn destination(&self, category: &str) -> String {
        let base = self.remote.path.trim_matches('/');
        if base.is_empty() {
            format!("{}:{category}", self.remote.remote)
        } else {
            format!("{}:{base}/{category}", self.remote.remote)
        }
    }

    fn run(&self, args: &[&std::ffi::OsStr]) -> Result<(), ToolError> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| ToolError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if output.status.success() {
            return Ok(());
        }
        Err(ToolError::Exit {
            program: self.program.clone(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

impl RemoteSync for Rclone {
    fn upload(&self, local: &Path, category: &str) -> Result<(), ToolError> {
        let dest = self.destination(category);
        tracing::info!(file = %local.display(), dest = %dest, "uploading");
        self.run(&["copy".as_ref(), local.as_os_str(), dest.as_ref()])
    }

    fn remove(&self, archive_name: &str, category: &str) -> Result<(), ToolError> {
        let target = format!("{}/{archive_name}", self.destination(category));
        tracing::info!(target = %target, "removing remote archive");
        self.run(&["deletefile".as_ref(), target.as_ref()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rclone(path: &str) -> Rclone {
        Rclone::new(
            "rclone",
            RemoteConfig {
                remote: "od".into(),
                path: path.into(),
            },
        )
    }

    #[test]
    fn destination_joins_path_and_category() {
        assert_eq!(rclone("/plugins/").destination("Office"), "od:plugins/Office");
        assert_eq!(rclone("").destination("Office"), "od:Office");
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let tool = Rclone::new(
            "relay-test-no-such-rclone",
            RemoteConfig {
                remote: "od".into(),
                path: String::new(),
            },
        );
        let err = tool.upload(Path::new("a.7z"), "Office").unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
