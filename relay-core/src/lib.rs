//! relay core library: domain types, version tokens, on-disk layout,
//! task registry, database persistence, run configuration.
//!
//! - [`types`]: newtypes and domain structs
//! - [`version`]: [`Version`] and numeric comparison
//! - [`layout`]: named directory conventions under a relay root
//! - [`registry`]: task definition store (list / load / save)
//! - [`database`]: per-task delivery state (load / save)
//! - [`config`]: `relay.yaml`
//! - [`error`]: [`RegistryError`], [`ConfigError`]

pub mod config;
pub mod database;
pub mod error;
pub mod layout;
pub mod registry;
pub mod types;
pub mod version;

pub use config::RelayConfig;
pub use error::{ConfigError, RegistryError};
pub use layout::Layout;
pub use types::{BuildRecord, Database, DatabaseNode, PageInfo, TaskDefinition, TaskName};
pub use version::{extract_version, Version};
