//! `relay tasks`: task definitions and their validation state.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use relay_core::{registry, Layout};

#[derive(Args, Debug)]
pub struct TasksArgs {}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "task")]
    task: String,
    #[tabled(rename = "category")]
    category: String,
    #[tabled(rename = "mode")]
    mode: String,
    #[tabled(rename = "status")]
    status: String,
}

impl TasksArgs {
    pub fn run(self, layout: &Layout) -> Result<()> {
        let names = registry::list_tasks(layout)
            .with_context(|| format!("failed to list tasks under '{}'", layout.tasks_dir().display()))?;
        if names.is_empty() {
            println!("No tasks under {}.", layout.tasks_dir().display());
            return Ok(());
        }

        let mut invalid = 0;
        let rows: Vec<TaskRow> = names
            .into_iter()
            .map(|name| match registry::load_task(layout, &name) {
                Ok(task) => TaskRow {
                    task: name.0,
                    category: task.category,
                    mode: if task.auto_make { "auto make" } else { "script" }.to_string(),
                    status: "valid".green().to_string(),
                },
                Err(err) => {
                    invalid += 1;
                    TaskRow {
                        task: name.0,
                        category: "-".to_string(),
                        mode: "-".to_string(),
                        status: err.to_string().red().to_string(),
                    }
                }
            })
            .collect();

        let total = rows.len();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        println!("{total} tasks, {invalid} invalid");
        Ok(())
    }
}
