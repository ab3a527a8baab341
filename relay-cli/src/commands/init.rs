//! `relay init [--example]`

use anyhow::{Context, Result};
use clap::Args;

use relay_core::{config, registry, Layout, RelayConfig, TaskDefinition, TaskName};

const EXAMPLE_TASK: &str = "Example";

/// Create the relay root layout.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Also scaffold tasks/Example/task.yaml to start from.
    #[arg(long)]
    pub example: bool,
}

impl InitArgs {
    pub fn run(self, layout: &Layout) -> Result<()> {
        for dir in [layout.tasks_dir(), layout.workshop_root(), layout.builds_root()] {
            std::fs::create_dir_all(&dir).with_context(|| format!("cannot create '{}'", dir.display()))?;
        }

        let written = config::write_default(layout, &RelayConfig::default())
            .with_context(|| format!("failed to write '{}'", layout.config_path().display()))?;
        if written {
            println!("✓ Initialized relay root at {}", layout.root().display());
            println!("  Config: {}", layout.config_path().display());
        } else {
            println!(
                "✓ Relay root at {} already initialized; kept existing config",
                layout.root().display()
            );
        }

        if self.example {
            scaffold_example(layout)?;
        }
        Ok(())
    }
}

fn scaffold_example(layout: &Layout) -> Result<()> {
    let name = TaskName::from(EXAMPLE_TASK);
    if layout.task_config(&name).exists() {
        println!("  Example task already present, left untouched");
        return Ok(());
    }
    let task = TaskDefinition {
        name: name.clone(),
        category: "Utilities".into(),
        author: "relay".into(),
        url: "https://example.com/downloads".into(),
        release_requirement: vec![],
        build_requirement: vec![format!("{EXAMPLE_TASK}_bot.wcs")],
        preprocess: true,
        auto_make: true,
        checksum: None,
    };
    registry::save_task(layout, &task).context("failed to scaffold example task")?;
    println!("  Example task: {}", layout.task_config(&name).display());
    Ok(())
}
