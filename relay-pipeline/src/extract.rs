//! Extraction stage: unpack the fetched artifact into `release/`, check the
//! release requirement, and stage the task's auxiliary files.

use std::path::Path;

use relay_core::layout::{BUILD_SCRIPT, UTILS_DIR};
use relay_core::{Layout, TaskDefinition};

use crate::collaborators::ArchiveTool;
use crate::error::{PipelineError, StageResult};
use crate::fsutil::{copy_dir, first_missing};

/// Unpack `archive` into `dest_dir` and require every release path.
pub fn extract(
    archiver: &dyn ArchiveTool,
    task: &TaskDefinition,
    archive: &Path,
    dest_dir: &Path,
) -> StageResult<()> {
    let extraction = |message: String| PipelineError::Extraction {
        task: task.name.0.clone(),
        message,
    };

    tracing::info!(task = %task.name, archive = %archive.display(), "start extracting");
    archiver
        .extract(archive, dest_dir)
        .map_err(|e| extraction(e.to_string()))?;

    if let Some(missing) = first_missing(dest_dir, &task.release_requirement) {
        return Err(extraction(format!("missing {missing} in release")));
    }
    Ok(())
}

/// Copy the optional build script and `utils/` directory from the task's
/// definition directory into its workshop.
pub fn stage_auxiliary_files(layout: &Layout, task: &TaskDefinition) -> StageResult<()> {
    let source = layout.task_dir(&task.name);
    let workshop = layout.workshop(&task.name);
    let extraction = |message: String| PipelineError::Extraction {
        task: task.name.0.clone(),
        message,
    };

    let script = source.join(BUILD_SCRIPT);
    if script.exists() {
        std::fs::copy(&script, workshop.join(BUILD_SCRIPT))
            .map_err(|e| extraction(format!("can't copy {BUILD_SCRIPT}: {e}")))?;
    }

    let utils = source.join(UTILS_DIR);
    if utils.is_dir() {
        copy_dir(&utils, &workshop.join(UTILS_DIR))
            .map_err(|e| extraction(format!("can't copy {UTILS_DIR}: {e}")))?;
    }

    tracing::info!(task = %task.name, "workshop is ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use relay_core::TaskName;
    use tempfile::TempDir;

    /// Writes the listed files into the destination instead of unpacking.
    struct Unpacks(Vec<&'static str>);

    impl ArchiveTool for Unpacks {
        fn extract(&self, _archive: &Path, dest_dir: &Path) -> Result<(), ToolError> {
            for rel in &self.0 {
                let path = dest_dir.join(rel);
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(path, "x").unwrap();
            }
            Ok(())
        }

        fn compress(&self, _dest: &Path, _src: &Path) -> Result<(), ToolError> {
            unreachable!()
        }
    }

    struct Fails;

    impl ArchiveTool for Fails {
        fn extract(&self, _archive: &Path, _dest_dir: &Path) -> Result<(), ToolError> {
            Err(ToolError::Exit {
                program: "7z".into(),
                status: "exit status: 2".into(),
                stderr: "Can not open the file as archive".into(),
            })
        }

        fn compress(&self, _dest: &Path, _src: &Path) -> Result<(), ToolError> {
            unreachable!()
        }
    }

    fn task(required: &[&str]) -> TaskDefinition {
        TaskDefinition {
            name: TaskName::from("Foo"),
            category: "Utilities".into(),
            author: "Cno".into(),
            url: "https://example.com".into(),
            release_requirement: required.iter().map(|s| s.to_string()).collect(),
            build_requirement: vec![],
            preprocess: false,
            auto_make: false,
            checksum: None,
        }
    }

    #[test]
    fn satisfied_requirement_passes() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("release");
        let tool = Unpacks(vec!["App/Foo.exe", "help.html"]);
        extract(&tool, &task(&["App/Foo.exe"]), Path::new("target.exe"), &dest).unwrap();
    }

    #[test]
    fn first_missing_release_path_is_named() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("release");
        let tool = Unpacks(vec!["help.html"]);
        let err = extract(&tool, &task(&["help.html", "App/Foo.exe", "Other"]), Path::new("t"), &dest)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Extraction { .. }));
        assert!(err.to_string().contains("App/Foo.exe"), "got: {err}");
    }

    #[test]
    fn archive_tool_failure_is_extraction_error() {
        let tmp = TempDir::new().unwrap();
        let err = extract(&Fails, &task(&[]), Path::new("t"), tmp.path()).unwrap_err();
        assert!(err.to_string().contains("Can not open"), "got: {err}");
    }

    #[test]
    fn auxiliary_files_are_copied_when_present() {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path());
        let def = task(&[]);
        let src = layout.task_dir(&def.name);
        std::fs::create_dir_all(src.join(UTILS_DIR)).unwrap();
        std::fs::write(src.join(BUILD_SCRIPT), "echo hi").unwrap();
        std::fs::write(src.join(UTILS_DIR).join("tool.txt"), "t").unwrap();
        std::fs::create_dir_all(layout.workshop(&def.name)).unwrap();

        stage_auxiliary_files(&layout, &def).unwrap();
        let ws = layout.workshop(&def.name);
        assert!(ws.join(BUILD_SCRIPT).exists());
        assert!(ws.join(UTILS_DIR).join("tool.txt").exists());
    }

    #[test]
    fn auxiliary_files_are_optional() {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path());
        let def = task(&[]);
        std::fs::create_dir_all(layout.workshop(&def.name)).unwrap();
        stage_auxiliary_files(&layout, &def).unwrap();
        assert!(!layout.workshop(&def.name).join(BUILD_SCRIPT).exists());
    }
}
