//! # relay-pipeline
//!
//! Per-task update pipeline: scrape, compare, fetch, extract, build,
//! package, deliver.
//!
//! Call [`process_task`] to drive a single task or [`run_batch`] to walk
//! every registered task in order. External tools are reached through the
//! traits in [`collaborators`]; the adapters beside them wrap aria2, 7-Zip,
//! rclone and plain HTTP.

pub mod aria2;
pub mod batch;
pub mod build;
pub mod checksum;
pub mod collaborators;
pub mod context;
pub mod error;
pub mod evict;
pub mod extract;
pub mod fetch;
mod fsutil;
pub mod oracle;
pub mod package;
pub mod preprocess;
pub mod process;
pub mod rclone;
pub mod scraper;
pub mod seven_zip;

pub use aria2::Aria2Client;
pub use batch::{run_batch, BatchReport, TaskReport};
pub use collaborators::{
    ArchiveTool, DownloadDaemon, Evictor, JobHandle, JobState, JobStatus, NoRemote, Preprocessor, RemoteSync,
    Scraper,
};
pub use context::{Pipeline, RunOptions, Toolchain};
pub use error::{PipelineError, Stage, StageResult, ToolError};
pub use evict::RepoEvictor;
pub use preprocess::InstallerCleanup;
pub use process::{process_task, TaskOutcome};
pub use rclone::Rclone;
pub use scraper::HttpScraper;
pub use seven_zip::SevenZip;
