//! Per-task orchestrator.
//!
//! ```text
//! Scrape → ExtractVersion → Compare
//!   ├─ UpToDate | LocalAhead → done, database unchanged
//!   └─ NeedsUpgrade → Fetch → Verify → Extract → [Preprocess] → Build
//!                     → CopyCover → Package&Deliver → done, database updated
//! ```
//!
//! The first failing stage ends the run; nothing is retried.

use relay_core::layout::DOWNLOAD_FILE;
use relay_core::{DatabaseNode, TaskDefinition, Version};

use crate::context::Pipeline;
use crate::error::{PipelineError, StageResult};
use crate::fetch::{fetch, PollPolicy};
use crate::fsutil::reset_dir;
use crate::oracle::{self, Decision};
use crate::{build, extract, package};

/// Terminal state of a successful task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    UpToDate { local: Version, remote: Version },
    /// Local version ahead of remote; reported and left alone.
    LocalAhead { local: Version, remote: Version },
    Delivered { version: Version, node: DatabaseNode },
}

impl TaskOutcome {
    /// The node the database should hold after this outcome, if it changed.
    pub fn updated_node(&self) -> Option<&DatabaseNode> {
        match self {
            TaskOutcome::Delivered { node, .. } => Some(node),
            _ => None,
        }
    }
}

/// Drive one task through the pipeline.
pub fn process_task(
    pipeline: &Pipeline<'_>,
    task: &TaskDefinition,
    database: &DatabaseNode,
) -> StageResult<TaskOutcome> {
    tracing::info!(task = %task.name, "start processing");

    let page = oracle::check(pipeline.tools.scraper, task)?;
    let remote = oracle::extract(task, &page.text)?;
    let local = database.latest_version.clone();

    match oracle::decide(&local, &remote, pipeline.options.force) {
        Decision::UpToDate => {
            tracing::info!(task = %task.name, %local, %remote, "up to date");
            Ok(TaskOutcome::UpToDate { local, remote })
        }
        Decision::LocalAhead => {
            tracing::warn!(
                task = %task.name,
                %local,
                %remote,
                "local version is greater than online version"
            );
            Ok(TaskOutcome::LocalAhead { local, remote })
        }
        Decision::NeedsUpgrade => {
            tracing::info!(task = %task.name, %local, %remote, force = pipeline.options.force, "upgrade needed");
            let node = upgrade(pipeline, task, &page.href, page.checksum.as_deref(), &remote, database)?;
            Ok(TaskOutcome::Delivered {
                version: remote,
                node,
            })
        }
    }
}

fn upgrade(
    pipeline: &Pipeline<'_>,
    task: &TaskDefinition,
    href: &str,
    checksum: Option<&str>,
    version: &Version,
    database: &DatabaseNode,
) -> StageResult<DatabaseNode> {
    let layout = &pipeline.layout;
    let tools = &pipeline.tools;
    let workshop = layout.workshop(&task.name);

    reset_dir(&workshop)
        .and_then(|()| reset_dir(&layout.build_dir(&task.name)))
        .map_err(|e| PipelineError::Extraction {
            task: task.name.0.clone(),
            message: format!("can't prepare workshop: {e}"),
        })?;

    fetch(
        tools.daemon,
        &task.name.0,
        href,
        &workshop,
        DOWNLOAD_FILE,
        checksum,
        PollPolicy::from(&pipeline.config.download),
    )?;

    extract::extract(
        tools.archiver,
        task,
        &layout.download_target(&task.name),
        &layout.release_dir(&task.name),
    )?;
    extract::stage_auxiliary_files(layout, task)?;

    if task.preprocess {
        build::preprocess(tools.preprocessor, layout, task)?;
    }
    build::build(layout, task, pipeline.config.build.script_timeout())?;
    build::copy_cover(layout, &task.name)?;

    package::package(pipeline, task, version, database)
}
