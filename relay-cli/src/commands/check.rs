//! `relay check <task>`: scrape and compare without side effects.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use relay_core::{database, registry, Layout, TaskName};
use relay_pipeline::oracle::{self, Decision};
use relay_pipeline::HttpScraper;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Task directory name under tasks/.
    pub task: String,
}

impl CheckArgs {
    pub fn run(self, layout: &Layout) -> Result<()> {
        let name = TaskName::from(self.task);
        let task = registry::load_task(layout, &name).with_context(|| format!("cannot load task '{name}'"))?;
        let db = database::load(layout).context("failed to load database")?;
        let local = database::node_for(&db, &name).latest_version;

        let page = oracle::check(&HttpScraper::new(), &task)?;
        let remote = oracle::extract(&task, &page.text)?;

        let verdict = match oracle::decide(&local, &remote, false) {
            Decision::NeedsUpgrade => "update available".yellow().bold(),
            Decision::UpToDate => "up to date".green().bold(),
            Decision::LocalAhead => "local ahead of online".red().bold(),
        };
        println!("{}: {verdict}", task.name.0.bold());
        println!("  local:    {local}");
        println!("  online:   {remote}");
        println!("  download: {}", page.href);
        if let Some(checksum) = page.checksum {
            println!("  checksum: {checksum}");
        }
        Ok(())
    }
}
