//! ABC Retail Storage - Table, blob, queue and file-share access layer.
//!
//! This crate unifies four storage primitives behind one facade,
//! [`StorageService`]:
//!
//! - [`entity_store`] - Generic CRUD over partitioned tables with optimistic
//!   concurrency and UTC normalization of temporal fields
//! - [`object_store`] - Uploads of opaque payloads under collision-free names
//! - [`message_queue`] - Plain text messages on named queues
//! - [`file_share`] - Files in shares under optional directory paths
//!
//! # Backends
//!
//! Adapters talk to storage through the traits in [`backend`]. The
//! [`backend::azure`] implementation speaks the storage account REST
//! protocol; [`backend::memory`] emulates it in-process.
//!
//! # Example
//!
//! ```no_run
//! use abc_retail_storage::{ResourceManifest, StorageConfig, StorageService};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorageConfig::from_env()?;
//! let storage = StorageService::from_config(&config)?;
//! storage.provision(&ResourceManifest::default()).await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod connection;
pub mod entity_store;
pub mod error;
pub mod file_share;
pub mod message_queue;
pub mod object_store;
pub mod resources;
pub mod service;

pub use backend::StorageBackends;
pub use config::{ConfigError, StorageConfig};
pub use connection::{AccountCredential, ConnectionStringError, StorageAccount};
pub use error::{Result, StorageError};
pub use resources::{ProvisionReport, ResourceManifest, ShareManifest};
pub use service::StorageService;
