//! Version oracle: scrape the task page, extract its version, and decide
//! whether the task needs an upgrade.

use std::cmp::Ordering;

use relay_core::{extract_version, PageInfo, TaskDefinition, Version};

use crate::collaborators::Scraper;
use crate::error::{PipelineError, StageResult};

/// What the version comparison means for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Local is older than remote (or force mode is on).
    NeedsUpgrade,
    UpToDate,
    /// Local is newer than remote. Anomalous; reported, never corrected.
    LocalAhead,
}

/// Scrape the task page.
///
/// The page's checksum wins over one pinned in the task definition.
pub fn check(scraper: &dyn Scraper, task: &TaskDefinition) -> StageResult<PageInfo> {
    let mut page = scraper.fetch_page(&task.url).map_err(|e| PipelineError::Scrape {
        task: task.name.0.clone(),
        message: format!("can't scrape {}: {e}", task.url),
    })?;
    if page.checksum.as_deref().map_or(true, str::is_empty) {
        page.checksum = task.checksum.clone();
    }
    Ok(page)
}

/// Extract the version token from scraped page text.
pub fn extract(task: &TaskDefinition, page_text: &str) -> StageResult<Version> {
    extract_version(page_text).ok_or_else(|| PipelineError::Scrape {
        task: task.name.0.clone(),
        message: "can't match a version from page".to_string(),
    })
}

/// Numeric comparison of `local` against `remote`; force mode reports `Less`.
pub fn compare(local: &Version, remote: &Version, force: bool) -> Ordering {
    if force {
        return Ordering::Less;
    }
    local.compare(remote)
}

pub fn decide(local: &Version, remote: &Version, force: bool) -> Decision {
    match compare(local, remote, force) {
        Ordering::Less => Decision::NeedsUpgrade,
        Ordering::Equal => Decision::UpToDate,
        Ordering::Greater => Decision::LocalAhead,
    }
}
