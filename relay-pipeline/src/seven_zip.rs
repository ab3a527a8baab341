//! 7-Zip command-line adapter implementing [`ArchiveTool`].

use std::path::Path;
use std::process::Command;

use crate::collaborators::ArchiveTool;
use crate::error::ToolError;

#[derive(Debug, Clone)]
pub struct SevenZip {
    program: String,
}

impl SevenZip {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, cmd: &mut Command) -> Result<(), ToolError> {
        let output = cmd.output().map_err(|source| ToolError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Err(ToolError::Exit {
            program: self.program.clone(),
            status: output.status.to_string(),
            stderr: if stderr.is_empty() { stdout } else { stderr },
        })
    }
}

impl ArchiveTool for SevenZip {
    fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<(), ToolError> {
        let mut out_flag = std::ffi::OsString::from("-o");
        out_flag.push(dest_dir);
        self.run(
            Command::new(&self.program)
                .arg("x")
                .arg(archive)
                .arg(out_flag)
                .arg("-y"),
        )
    }

    fn compress(&self, dest_archive: &Path, source_dir: &Path) -> Result<(), ToolError> {
        // 7z expands the wildcard itself, relative to the working directory.
        self.run(
            Command::new(&self.program)
                .current_dir(source_dir)
                .arg("a")
                .arg(dest_archive)
                .arg("*"),
        )
    }
}
