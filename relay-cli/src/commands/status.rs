//! `relay status`: delivered versions and retained archives.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use relay_core::{database, registry, DatabaseNode, Layout, TaskName};

/// Arguments for `relay status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct TaskStatusJson {
    task: String,
    latest_version: String,
    builds: Vec<String>,
    updated_at: Option<String>,
    registered: bool,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "task")]
    task: String,
    #[tabled(rename = "version")]
    version: String,
    #[tabled(rename = "builds")]
    builds: usize,
    #[tabled(rename = "newest archive")]
    newest: String,
    #[tabled(rename = "updated")]
    updated: String,
}

impl StatusArgs {
    pub fn run(self, layout: &Layout) -> Result<()> {
        let db = database::load(layout)
            .with_context(|| format!("failed to load '{}'", layout.database_path().display()))?;
        let registered = registry::list_tasks(layout).context("failed to list tasks")?;

        // Registered tasks that never delivered show up with a default node.
        let mut rows: Vec<(TaskName, DatabaseNode, bool)> = db
            .iter()
            .map(|(name, node)| (name.clone(), node.clone(), registered.contains(name)))
            .collect();
        for name in &registered {
            if !db.contains_key(name) {
                rows.push((name.clone(), DatabaseNode::default(), true));
            }
        }
        rows.sort_by(|a, b| a.0.cmp(&b.0));

        if self.json {
            print_json(&rows)
        } else {
            print_table(&rows);
            Ok(())
        }
    }
}

fn print_json(rows: &[(TaskName, DatabaseNode, bool)]) -> Result<()> {
    let payload: Vec<TaskStatusJson> = rows
        .iter()
        .map(|(name, node, registered)| TaskStatusJson {
            task: name.0.clone(),
            latest_version: node.latest_version.to_string(),
            builds: node.builds.iter().map(|b| b.name.clone()).collect(),
            updated_at: node.updated_at.map(|t| t.to_rfc3339()),
            registered: *registered,
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(rows: &[(TaskName, DatabaseNode, bool)]) {
    let archives: usize = rows.iter().map(|(_, node, _)| node.builds.len()).sum();
    println!(
        "Relay v{} | {} tasks | {} archives",
        env!("CARGO_PKG_VERSION"),
        rows.len(),
        archives
    );
    if rows.is_empty() {
        println!("Nothing delivered yet.");
        return;
    }

    let table_rows: Vec<StatusTableRow> = rows
        .iter()
        .map(|(name, node, registered)| StatusTableRow {
            task: if *registered {
                name.0.clone()
            } else {
                format!("{} {}", name.0, "(unregistered)".bright_black())
            },
            version: node.latest_version.to_string(),
            builds: node.builds.len(),
            newest: node
                .newest_build()
                .map(|b| b.name.clone())
                .unwrap_or_else(|| "-".to_string()),
            updated: node.updated_at.map(format_age).unwrap_or_else(|| "never".to_string()),
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn format_age(at: DateTime<Utc>) -> String {
    let secs = (Utc::now() - at).num_seconds().max(0);
    match secs {
        0..=59 => "just now".to_string(),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86_399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_buckets() {
        let now = Utc::now();
        assert_eq!(format_age(now), "just now");
        assert_eq!(format_age(now - chrono::Duration::minutes(5)), "5m ago");
        assert_eq!(format_age(now - chrono::Duration::hours(3)), "3h ago");
        assert_eq!(format_age(now - chrono::Duration::days(2)), "2d ago");
    }
}
