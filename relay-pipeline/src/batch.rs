//! Sequential batch runner: every task, one at a time.

use relay_core::{database, registry, TaskName};

use crate::context::Pipeline;
use crate::error::PipelineError;
use crate::process::{process_task, TaskOutcome};

/// Outcome of one task within a batch.
#[derive(Debug)]
pub struct TaskReport {
    pub task: TaskName,
    pub result: Result<TaskOutcome, PipelineError>,
}

/// Outcome of a whole batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub reports: Vec<TaskReport>,
}

impl BatchReport {
    pub fn delivered(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.result, Ok(TaskOutcome::Delivered { .. })))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| r.result.is_err()).count()
    }
}

/// Process `selection` (or every registered task when empty).
///
/// Task failures are recorded in the report; only failure to read the task
/// store or the database aborts the batch. The database is saved after each
/// delivery.
pub fn run_batch(pipeline: &Pipeline<'_>, selection: &[TaskName]) -> Result<BatchReport, PipelineError> {
    let layout = &pipeline.layout;
    let tasks = if selection.is_empty() {
        registry::list_tasks(layout)?
    } else {
        selection.to_vec()
    };
    let mut db = database::load(layout)?;
    let mut report = BatchReport::default();

    for name in tasks {
        let result = run_one(pipeline, &name, &mut db);
        if let Err(err) = &result {
            let stage = err.stage().map(|s| s.to_string()).unwrap_or_default();
            tracing::error!(task = %name, stage = %stage, error = %err, "task abandoned");
        }
        report.reports.push(TaskReport { task: name, result });
    }

    tracing::info!(
        tasks = report.reports.len(),
        delivered = report.delivered(),
        failed = report.failed(),
        "batch finished"
    );
    Ok(report)
}

fn run_one(
    pipeline: &Pipeline<'_>,
    name: &TaskName,
    db: &mut relay_core::Database,
) -> Result<TaskOutcome, PipelineError> {
    let task = registry::load_task(&pipeline.layout, name).map_err(|source| PipelineError::Validation {
        task: name.0.clone(),
        source,
    })?;
    let node = database::node_for(db, name);
    let outcome = process_task(pipeline, &task, &node)?;
    if let Some(updated) = outcome.updated_node() {
        db.insert(name.clone(), updated.clone());
        database::save(&pipeline.layout, db)?;
    }
    Ok(outcome)
}
