//! aria2 JSON-RPC client implementing [`DownloadDaemon`].
//!
//! One client is connected per batch and closed at batch end. When
//! `aria2.spawn` is set the client launches and owns a local `aria2c`.

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::sleep;
use std::time::Duration;

use relay_core::config::Aria2Config;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::collaborators::{DownloadDaemon, JobHandle, JobState, JobStatus};
use crate::error::ToolError;

const CONNECT_ATTEMPTS: u32 = 10;
const CONNECT_RETRY: Duration = Duration::from_millis(300);
const STATUS_KEYS: [&str; 5] = [
    "status",
    "completedLength",
    "totalLength",
    "downloadSpeed",
    "errorMessage",
];

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

pub struct Aria2Client {
    endpoint: String,
    token: Option<String>,
    agent: ureq::Agent,
    next_id: AtomicU64,
    child: Option<Child>,
}

impl Aria2Client {
    /// Connect to (and optionally spawn) the daemon, confirming it answers.
    pub fn connect(config: &Aria2Config) -> Result<Self, ToolError> {
        let child = if config.spawn {
            Some(spawn_daemon(config)?)
        } else {
            None
        };
        let client = Self {
            endpoint: config.endpoint(),
            token: (!config.secret.is_empty()).then(|| format!("token:{}", config.secret)),
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(30))
                .build(),
            next_id: AtomicU64::new(1),
            child,
        };

        let mut last_err = None;
        for attempt in 0..CONNECT_ATTEMPTS {
            match client.version() {
                Ok(version) => {
                    tracing::info!(version = %version, endpoint = %client.endpoint, "aria2 ready");
                    return Ok(client);
                }
                Err(err) => {
                    tracing::debug!(attempt, error = %err, "aria2 not answering yet");
                    last_err = Some(err);
                    sleep(CONNECT_RETRY);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| ToolError::Rpc("aria2 connect loop exited".to_string())))
    }

    pub fn version(&self) -> Result<String, ToolError> {
        let result = self.call("aria2.getVersion", vec![])?;
        Ok(result
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string())
    }

    /// End the session, stopping a daemon this client spawned.
    pub fn close(mut self) {
        self.stop_child();
    }

    fn stop_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            tracing::debug!("stopped spawned aria2c");
        }
    }

    fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, ToolError> {
        let mut all = Vec::with_capacity(params.len() + 1);
        if let Some(token) = &self.token {
            all.push(Value::String(token.clone()));
        }
        all.extend(params);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id.to_string(),
            "method": method,
            "params": all,
        });

        let response = match self.agent.post(&self.endpoint).send_json(payload) {
            Ok(response) => response,
            // aria2 answers RPC-level failures with HTTP 4xx and a JSON body.
            Err(ureq::Error::Status(_, response)) => response,
            Err(err) => return Err(ToolError::Http(err.to_string())),
        };
        let body: RpcResponse = response
            .into_json()
            .map_err(|e| ToolError::Rpc(format!("invalid {method} response: {e}")))?;
        parse_rpc(method, body)
    }
}

impl Drop for Aria2Client {
    fn drop(&mut self) {
        self.stop_child();
    }
}

impl DownloadDaemon for Aria2Client {
    fn submit(&self, url: &str, dest_dir: &Path, dest_name: &str) -> Result<JobHandle, ToolError> {
        let options = json!({
            "dir": dest_dir.to_string_lossy(),
            "out": dest_name,
        });
        let gid = self.call("aria2.addUri", vec![json!([url]), options])?;
        gid.as_str()
            .map(|gid| JobHandle(gid.to_string()))
            .ok_or_else(|| ToolError::Rpc(format!("aria2.addUri returned {gid}")))
    }

    fn status(&self, job: &JobHandle) -> Result<JobStatus, ToolError> {
        let result = self.call("aria2.tellStatus", vec![json!(job.0), json!(STATUS_KEYS)])?;
        Ok(parse_status(&result))
    }
}

fn parse_rpc(method: &str, body: RpcResponse) -> Result<Value, ToolError> {
    if let Some(err) = body.error {
        return Err(ToolError::Rpc(format!(
            "{method} failed ({}): {}",
            err.code, err.message
        )));
    }
    body.result
        .ok_or_else(|| ToolError::Rpc(format!("{method} returned neither result nor error")))
}

fn parse_status(result: &Value) -> JobStatus {
    let counter = |key: &str| {
        result
            .get(key)
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0)
    };
    let raw = result.get("status").and_then(Value::as_str).unwrap_or("waiting");
    let (state, error_message) = match raw {
        "active" => (JobState::Active, None),
        "complete" => (JobState::Complete, None),
        "error" => (
            JobState::Error,
            result
                .get("errorMessage")
                .and_then(Value::as_str)
                .map(str::to_string),
        ),
        "removed" => (JobState::Error, Some("download was removed".to_string())),
        // "waiting" and "paused"
        _ => (JobState::Waiting, None),
    };
    JobStatus {
        state,
        completed_bytes: counter("completedLength"),
        total_bytes: counter("totalLength"),
        bytes_per_second: counter("downloadSpeed"),
        error_message,
    }
}

fn spawn_daemon(config: &Aria2Config) -> Result<Child, ToolError> {
    let mut cmd = Command::new(&config.binary);
    cmd.arg("--enable-rpc")
        .arg(format!("--rpc-listen-port={}", config.port))
        .arg("--rpc-listen-all=false");
    if !config.secret.is_empty() {
        cmd.arg(format!("--rpc-secret={}", config.secret));
    }
    let child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| ToolError::Spawn {
            program: config.binary.clone(),
            source,
        })?;
    tracing::info!(pid = child.id(), port = config.port, "spawned aria2c");
    Ok(child)
}
