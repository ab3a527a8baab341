//! Everything a task run needs: layout, configuration, collaborators, flags.

use relay_core::{Layout, RelayConfig};

use crate::collaborators::{ArchiveTool, DownloadDaemon, Evictor, Preprocessor, RemoteSync, Scraper};

/// Borrowed collaborator set for one batch.
#[derive(Clone, Copy)]
pub struct Toolchain<'a> {
    pub scraper: &'a dyn Scraper,
    pub daemon: &'a dyn DownloadDaemon,
    pub archiver: &'a dyn ArchiveTool,
    pub remote: &'a dyn RemoteSync,
    pub evictor: &'a dyn Evictor,
    pub preprocessor: &'a dyn Preprocessor,
}

/// Batch-wide flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Treat every task as needing an upgrade regardless of versions.
    pub force: bool,
}

/// Shared state for processing tasks one after another.
pub struct Pipeline<'a> {
    pub layout: Layout,
    pub config: RelayConfig,
    pub tools: Toolchain<'a>,
    pub options: RunOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(layout: Layout, config: RelayConfig, tools: Toolchain<'a>, options: RunOptions) -> Self {
        Self {
            layout,
            config,
            tools,
            options,
        }
    }
}
