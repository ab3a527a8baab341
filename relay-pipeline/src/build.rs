//! Build stage.
//!
//! Two mutually exclusive modes, picked by `auto_make`:
//! - scripted: run the task's build script in its workshop under a timeout,
//!   capturing output to `make.log`;
//! - automatic: find the release's executable, write a deployment
//!   descriptor, and relocate `release/` into `build/<name>_bot`.
//!
//! Either way the build requirement is checked afterwards. Preprocessing and
//! cover copying are separate gates the orchestrator runs around this stage.

use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

use relay_core::layout::{BUILD_SCRIPT, COVER_EXTENSIONS};
use relay_core::{Layout, TaskDefinition, TaskName};

use crate::collaborators::Preprocessor;
use crate::error::{PipelineError, StageResult};
use crate::fsutil::{file_names, first_missing, move_path};

const EXE_MARKER: &str = ".exe";
const PORTABLE_MARKER: &str = "portable";
const SCRIPT_POLL: Duration = Duration::from_millis(100);

fn build_err(task: &TaskName, message: impl Into<String>) -> PipelineError {
    PipelineError::Build {
        task: task.0.clone(),
        message: message.into(),
    }
}

/// Run the configured build mode and check the build requirement.
pub fn build(layout: &Layout, task: &TaskDefinition, script_timeout: Duration) -> StageResult<()> {
    if task.auto_make {
        auto_make(layout, task)?;
    } else {
        run_build_script(layout, &task.name, script_timeout)?;
    }
    require_build_outputs(layout, task)
}

/// First missing `build_requirement` path is a build error.
pub fn require_build_outputs(layout: &Layout, task: &TaskDefinition) -> StageResult<()> {
    match first_missing(&layout.build_dir(&task.name), &task.build_requirement) {
        Some(missing) => Err(build_err(&task.name, format!("missing {missing} in final build"))),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Scripted build
// ---------------------------------------------------------------------------

/// Run the workshop's build script, killing it once `timeout` passes.
pub fn run_build_script(layout: &Layout, task: &TaskName, timeout: Duration) -> StageResult<()> {
    let workshop = layout.workshop(task);
    let script = workshop.join(BUILD_SCRIPT);
    if !script.exists() {
        return Err(build_err(task, format!("{BUILD_SCRIPT} not found")));
    }

    tracing::info!(task = %task, "start making");
    let log_path = layout.build_log(task);
    let log = File::create(&log_path).map_err(|e| build_err(task, format!("can't create build log: {e}")))?;
    let log_err = log
        .try_clone()
        .map_err(|e| build_err(task, format!("can't share build log: {e}")))?;

    let mut child = script_command(&script)
        .current_dir(&workshop)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err))
        .spawn()
        .map_err(|e| build_err(task, format!("can't launch {BUILD_SCRIPT}: {e}")))?;

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                emit_build_log(task, &log_path, true);
                return Err(build_err(
                    task,
                    format!("{BUILD_SCRIPT} timed out after {}s", timeout.as_secs()),
                ));
            }
            Ok(None) => sleep(SCRIPT_POLL),
            Err(e) => return Err(build_err(task, format!("can't wait for {BUILD_SCRIPT}: {e}"))),
        }
    };

    emit_build_log(task, &log_path, !status.success());
    if !status.success() {
        return Err(build_err(task, format!("{BUILD_SCRIPT} exited with {status}")));
    }
    Ok(())
}

#[cfg(windows)]
fn script_command(script: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(script);
    cmd
}

#[cfg(not(windows))]
fn script_command(script: &Path) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg(script);
    cmd
}

fn emit_build_log(task: &TaskName, log_path: &Path, failed: bool) {
    let output = std::fs::read(log_path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();
    if output.trim().is_empty() {
        tracing::warn!(task = %task, "{BUILD_SCRIPT} has no console output");
    } else if failed {
        tracing::error!(task = %task, log = %output, "build script output");
    } else {
        tracing::debug!(task = %task, log = %output, "build script output");
    }
}

// ---------------------------------------------------------------------------
// Automatic build
// ---------------------------------------------------------------------------

/// Descriptor binding the relocated release into the deployment convention.
pub fn deployment_descriptor(task: &TaskName, exe: &str) -> String {
    let bot = format!("{}_bot", task.0);
    format!(
        "FILE X:\\Program Files\\Edgeless\\{bot}->X:\\Users\\PortableApps\\{bot}\n\
         LINK X:\\Users\\Default\\Desktop\\{name},X:\\Users\\PortableApps\\{bot}\\{exe}",
        name = task.0,
    )
}

/// Build without a script: descriptor + relocation of `release/`.
pub fn auto_make(layout: &Layout, task: &TaskDefinition) -> StageResult<()> {
    let name = &task.name;
    tracing::info!(task = %name, "start auto make");
    let release = layout.release_dir(name);
    let build_dir = layout.build_dir(name);

    let candidates: Vec<String> = file_names(&release)
        .map_err(|e| build_err(name, e.to_string()))?
        .into_iter()
        .map(|(file, _)| file)
        .filter(|file| file.to_ascii_lowercase().contains(EXE_MARKER))
        .collect();
    let exe = candidates
        .iter()
        .find(|file| file.to_ascii_lowercase().contains(PORTABLE_MARKER))
        .or_else(|| candidates.first())
        .ok_or_else(|| build_err(name, "can't find exe file, auto make failed"))?;
    tracing::info!(task = %name, exe = %exe, "got exe file");
    if !exe.to_ascii_lowercase().contains(PORTABLE_MARKER) {
        tracing::warn!(task = %name, exe = %exe, "exe file may be wrong");
    }

    let descriptor = deployment_descriptor(name, exe);
    std::fs::create_dir_all(&build_dir).map_err(|e| build_err(name, e.to_string()))?;
    let descriptor_path = build_dir.join(format!("{}_bot.wcs", name.0));
    std::fs::write(&descriptor_path, &descriptor)
        .map_err(|e| build_err(name, format!("can't write descriptor: {e}")))?;
    tracing::debug!(task = %name, descriptor = %descriptor, "saved deployment descriptor");

    move_path(&release, &build_dir.join(format!("{}_bot", name.0)))
        .map_err(|e| build_err(name, format!("can't relocate release: {e}")))?;
    tracing::info!(task = %name, "auto make executed successfully");
    Ok(())
}

// ---------------------------------------------------------------------------
// Gates around the build
// ---------------------------------------------------------------------------

/// Task-specific cleanup of `release/` before building.
pub fn preprocess(
    preprocessor: &dyn Preprocessor,
    layout: &Layout,
    task: &TaskDefinition,
) -> StageResult<()> {
    preprocessor
        .preprocess(task, &layout.release_dir(&task.name))
        .map_err(|e| build_err(&task.name, format!("can't preprocess: {e}")))
}

/// Copy `cover.{png,jpg,jpeg}` from the task directory into `build/`.
pub fn copy_cover(layout: &Layout, task: &TaskName) -> StageResult<()> {
    let source_dir = layout.task_dir(task);
    let build_dir = layout.build_dir(task);
    for ext in COVER_EXTENSIONS {
        let file = format!("cover.{ext}");
        let source = source_dir.join(&file);
        if source.is_file() {
            std::fs::copy(&source, build_dir.join(&file))
                .map_err(|e| build_err(task, format!("can't copy cover: {e}")))?;
            tracing::debug!(task = %task, cover = %file, "copied cover");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn task(auto_make: bool, build_requirement: &[&str]) -> TaskDefinition {
        TaskDefinition {
            name: TaskName::from("Foo"),
            category: "Utilities".into(),
            author: "Cno".into(),
            url: "https://example.com".into(),
            release_requirement: vec![],
            build_requirement: build_requirement.iter().map(|s| s.to_string()).collect(),
            preprocess: false,
            auto_make,
            checksum: None,
        }
    }

    fn workshop_with_release(files: &[&str]) -> (TempDir, Layout) {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path());
        let name = TaskName::from("Foo");
        std::fs::create_dir_all(layout.release_dir(&name)).unwrap();
        std::fs::create_dir_all(layout.build_dir(&name)).unwrap();
        for file in files {
            std::fs::write(layout.release_dir(&name).join(file), "x").unwrap();
        }
        (tmp, layout)
    }

    #[test]
    fn descriptor_has_move_and_link_lines() {
        let text = deployment_descriptor(&TaskName::from("Foo"), "FooPortable.exe");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "FILE X:\\Program Files\\Edgeless\\Foo_bot->X:\\Users\\PortableApps\\Foo_bot",
                "LINK X:\\Users\\Default\\Desktop\\Foo,X:\\Users\\PortableApps\\Foo_bot\\FooPortable.exe",
            ]
        );
    }

    #[test]
    fn auto_make_prefers_portable_exe_and_relocates_release() {
        let (_tmp, layout) = workshop_with_release(&["help.exe.txt", "FooPortable.exe", "readme.md"]);
        let def = task(true, &["Foo_bot.wcs", "Foo_bot/FooPortable.exe"]);
        build(&layout, &def, Duration::from_secs(1)).unwrap();

        let descriptor =
            std::fs::read_to_string(layout.build_dir(&def.name).join("Foo_bot.wcs")).unwrap();
        assert!(descriptor.ends_with("Foo_bot\\FooPortable.exe"));
        assert!(!layout.release_dir(&def.name).exists());
    }

    #[test]
    fn auto_make_accepts_non_portable_exe() {
        let (_tmp, layout) = workshop_with_release(&["foo.exe"]);
        auto_make(&layout, &task(true, &[])).unwrap();
        assert!(layout.build_dir(&TaskName::from("Foo")).join("Foo_bot/foo.exe").exists());
    }

    #[test]
    fn auto_make_without_exe_fails() {
        let (_tmp, layout) = workshop_with_release(&["readme.md"]);
        let err = auto_make(&layout, &task(true, &[])).unwrap_err();
        assert!(matches!(err, PipelineError::Build { .. }));
        assert!(err.to_string().contains("exe"), "got: {err}");
    }

    #[test]
    fn missing_build_requirement_is_build_error() {
        let (_tmp, layout) = workshop_with_release(&["FooPortable.exe"]);
        let err = build(&layout, &task(true, &["Foo_bot/missing.dll"]), Duration::from_secs(1))
            .unwrap_err();
        assert!(err.to_string().contains("Foo_bot/missing.dll"), "got: {err}");
    }

    #[test]
    fn scripted_build_requires_script() {
        let (_tmp, layout) = workshop_with_release(&[]);
        let err = build(&layout, &task(false, &[]), Duration::from_secs(1)).unwrap_err();
        assert!(err.to_string().contains("not found"), "got: {err}");
    }

    #[cfg(unix)]
    #[test]
    fn scripted_build_runs_in_workshop_and_captures_log() {
        let (_tmp, layout) = workshop_with_release(&[]);
        let name = TaskName::from("Foo");
        std::fs::write(
            layout.workshop(&name).join(BUILD_SCRIPT),
            "echo building\nmkdir -p build/out && echo ok > build/out/done.txt\n",
        )
        .unwrap();
        build(&layout, &task(false, &["out/done.txt"]), Duration::from_secs(10)).unwrap();
        let log = std::fs::read_to_string(layout.build_log(&name)).unwrap();
        assert!(log.contains("building"));
    }

    #[cfg(unix)]
    #[test]
    fn scripted_build_failure_is_build_error() {
        let (_tmp, layout) = workshop_with_release(&[]);
        let name = TaskName::from("Foo");
        std::fs::write(layout.workshop(&name).join(BUILD_SCRIPT), "echo broken >&2\nexit 3\n").unwrap();
        let err = run_build_script(&layout, &name, Duration::from_secs(10)).unwrap_err();
        assert!(err.to_string().contains("exited"), "got: {err}");
        let log = std::fs::read_to_string(layout.build_log(&name)).unwrap();
        assert!(log.contains("broken"));
    }

    #[cfg(unix)]
    #[test]
    fn scripted_build_is_killed_after_timeout() {
        let (_tmp, layout) = workshop_with_release(&[]);
        let name = TaskName::from("Foo");
        std::fs::write(layout.workshop(&name).join(BUILD_SCRIPT), "sleep 5\n").unwrap();
        let started = Instant::now();
        let err = run_build_script(&layout, &name, Duration::from_millis(200)).unwrap_err();
        assert!(err.to_string().contains("timed out"), "got: {err}");
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn cover_is_copied_when_present() {
        let (_tmp, layout) = workshop_with_release(&[]);
        let name = TaskName::from("Foo");
        std::fs::create_dir_all(layout.task_dir(&name)).unwrap();
        std::fs::write(layout.task_dir(&name).join("cover.png"), "png").unwrap();
        copy_cover(&layout, &name).unwrap();
        assert!(layout.build_dir(&name).join("cover.png").exists());
    }
}
