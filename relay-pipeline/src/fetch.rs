//! Fetch & verify stage.
//!
//! Submits the download to the daemon, polls it to a terminal state,
//! then checks that the file exists and, when a checksum is known, that it
//! matches.

use std::path::Path;
use std::thread::sleep;
use std::time::{Duration, Instant};

use relay_core::config::DownloadConfig;

use crate::checksum::{self, Algorithm};
use crate::collaborators::{DownloadDaemon, JobState, JobStatus};
use crate::error::{PipelineError, StageResult};

/// Poll cadence and upper bound for one download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Added on top of `interval` while the daemon reports `waiting`.
    pub waiting_backoff: Duration,
    pub timeout: Option<Duration>,
}

impl From<&DownloadConfig> for PollPolicy {
    fn from(config: &DownloadConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            waiting_backoff: config.waiting_backoff(),
            timeout: config.timeout(),
        }
    }
}

/// Download `url` to `<dest_dir>/<dest_name>` and verify it.
pub fn fetch(
    daemon: &dyn DownloadDaemon,
    task: &str,
    url: &str,
    dest_dir: &Path,
    dest_name: &str,
    expected_checksum: Option<&str>,
    policy: PollPolicy,
) -> StageResult<()> {
    let transfer = |message: String| PipelineError::Transfer {
        task: task.to_string(),
        message,
    };

    tracing::info!(task, url, "start downloading");
    let job = daemon
        .submit(url, dest_dir, dest_name)
        .map_err(|e| transfer(format!("daemon rejected download: {e}")))?;

    let started = Instant::now();
    loop {
        sleep(policy.interval);
        let status = daemon
            .status(&job)
            .map_err(|e| transfer(format!("can't query download status: {e}")))?;
        log_progress(task, &status);

        match status.state {
            JobState::Complete => break,
            JobState::Error => {
                let reason = status
                    .error_message
                    .unwrap_or_else(|| "unknown daemon error".to_string());
                return Err(transfer(format!("daemon reported error: {reason}")));
            }
            JobState::Waiting => sleep(policy.waiting_backoff),
            JobState::Active => {}
        }

        if let Some(limit) = policy.timeout {
            if started.elapsed() > limit {
                return Err(transfer(format!(
                    "download did not finish within {}s",
                    limit.as_secs()
                )));
            }
        }
    }
    tracing::info!(task, elapsed_ms = started.elapsed().as_millis() as u64, "downloaded");

    let target = dest_dir.join(dest_name);
    if !target.exists() {
        return Err(transfer(format!(
            "daemon reported completion but {} is missing",
            target.display()
        )));
    }

    if let Some(expected) = expected_checksum.filter(|c| !c.trim().is_empty()) {
        verify_checksum(&target, expected).map_err(transfer)?;
        tracing::info!(task, "checksum verified");
    }
    Ok(())
}

fn verify_checksum(target: &Path, expected: &str) -> Result<(), String> {
    let algorithm = Algorithm::for_expected(expected)
        .ok_or_else(|| format!("unsupported checksum format '{expected}'"))?;
    let actual = checksum::file_digest(target, algorithm)
        .map_err(|e| format!("can't hash {}: {e}", target.display()))?;
    if checksum::matches(expected, &actual) {
        Ok(())
    } else {
        Err(format!("checksum mismatch, expected {expected}, got {actual}"))
    }
}

fn log_progress(task: &str, status: &JobStatus) {
    const MIB: f64 = 1024.0 * 1024.0;
    tracing::debug!(
        task,
        state = ?status.state,
        percent = %format!("{:.1}", status.ratio() * 100.0),
        completed_mib = %format!("{:.3}", status.completed_bytes as f64 / MIB),
        total_mib = %format!("{:.3}", status.total_bytes as f64 / MIB),
        speed_mib_s = %format!("{:.3}", status.bytes_per_second as f64 / MIB),
        "download progress",
    );
}
