//! `relay run [--force] [--task <name>]...`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use relay_core::{config, Layout, TaskName};
use relay_pipeline::{
    run_batch, Aria2Client, BatchReport, HttpScraper, InstallerCleanup, NoRemote, Pipeline, PipelineError, Rclone,
    RemoteSync, RepoEvictor, RunOptions, SevenZip, TaskOutcome, Toolchain,
};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Rebuild and deliver even when the online version is not newer.
    #[arg(long)]
    pub force: bool,

    /// Only process these tasks (repeatable). Default: every task.
    #[arg(long = "task", short = 't', value_name = "NAME")]
    pub tasks: Vec<String>,
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "task")]
    task: String,
    #[tabled(rename = "result")]
    result: String,
    #[tabled(rename = "detail")]
    detail: String,
}

impl RunArgs {
    pub fn run(self, layout: &Layout) -> Result<()> {
        let config = config::load(layout).context("failed to load relay.yaml")?;
        let selection: Vec<TaskName> = self.tasks.into_iter().map(TaskName::from).collect();

        let daemon = Aria2Client::connect(&config.aria2)
            .map_err(|e| PipelineError::DaemonUnavailable(e.to_string()))
            .with_context(|| format!("is aria2 listening on {}?", config.aria2.endpoint()))?;

        let remote: Box<dyn RemoteSync> = match &config.remote {
            Some(remote) => Box::new(Rclone::new(config.tools.rclone.clone(), remote.clone())),
            None => {
                tracing::info!("no remote configured, archives stay local");
                Box::new(NoRemote)
            }
        };
        let scraper = HttpScraper::new();
        let archiver = SevenZip::new(config.tools.seven_zip.clone());
        let evictor = RepoEvictor::new(remote.as_ref());
        let tools = Toolchain {
            scraper: &scraper,
            daemon: &daemon,
            archiver: &archiver,
            remote: remote.as_ref(),
            evictor: &evictor,
            preprocessor: &InstallerCleanup,
        };

        let pipeline = Pipeline::new(layout.clone(), config, tools, RunOptions { force: self.force });
        let report = run_batch(&pipeline, &selection);
        drop(pipeline);
        daemon.close();

        print_report(&report.context("batch aborted")?);
        Ok(())
    }
}

fn print_report(report: &BatchReport) {
    if report.reports.is_empty() {
        println!("No tasks to process.");
        return;
    }
    let rows: Vec<OutcomeRow> = report
        .reports
        .iter()
        .map(|r| {
            let (result, detail) = match &r.result {
                Ok(TaskOutcome::Delivered { version, node }) => (
                    "DELIVERED".green().bold().to_string(),
                    format!(
                        "{version} ({})",
                        node.newest_build().map(|b| b.name.as_str()).unwrap_or("-")
                    ),
                ),
                Ok(TaskOutcome::UpToDate { local, .. }) => ("UP TO DATE".normal().to_string(), local.to_string()),
                Ok(TaskOutcome::LocalAhead { local, remote }) => (
                    "LOCAL AHEAD".yellow().bold().to_string(),
                    format!("local {local} > online {remote}"),
                ),
                Err(err) => {
                    let stage = err.stage().map(|s| s.to_string()).unwrap_or_else(|| "batch".into());
                    (format!("FAILED ({stage})").red().bold().to_string(), err.to_string())
                }
            };
            OutcomeRow {
                task: r.task.0.clone(),
                result,
                detail,
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!(
        "{} tasks | {} delivered | {} failed",
        report.reports.len(),
        report.delivered(),
        report.failed()
    );
}
