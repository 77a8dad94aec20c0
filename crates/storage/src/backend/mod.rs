//! Backend traits - the seam between the adapters and a storage service.
//!
//! Each storage primitive has its own trait so a deployment can mix
//! implementations. Two implementations ship with this crate:
//!
//! - [`azure::AzureStorageClient`] - the storage account's REST services
//! - [`memory::MemoryBackend`] - an in-process emulation with the same
//!   observable semantics, used by tests and local development
//!
//! All traits are `Send + Sync`; handles are shared behind `Arc` and used
//! concurrently by independent requests.

pub mod azure;
pub mod memory;

use std::sync::Arc;

use abc_retail_core::ETag;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use url::Url;

use crate::error::Result;

/// One stored table row: keys, properties and server metadata.
///
/// `properties` always contains the `PartitionKey` and `RowKey` properties
/// alongside the entity's own fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub partition_key: String,
    pub row_key: String,
    pub properties: Map<String, Value>,
    pub etag: Option<ETag>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// What the backend reports after a successful row write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub etag: ETag,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Structured entity tables keyed by (partition, row).
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// Create a table. Returns `false` if it already existed.
    async fn create_table_if_not_exists(&self, table: &str) -> Result<bool>;

    /// Point lookup. Fails with `NotFound` if the table or row is absent.
    async fn get_row(&self, table: &str, partition_key: &str, row_key: &str) -> Result<TableRow>;

    /// Every row of the table, optionally restricted to one partition.
    async fn query_rows(&self, table: &str, partition_key: Option<&str>) -> Result<Vec<TableRow>>;

    /// Insert or replace a row.
    ///
    /// When `row.etag` is set the write only succeeds if the stored row still
    /// carries that tag (`Conflict` otherwise, `NotFound` if it was removed).
    async fn upsert_row(&self, table: &str, row: TableRow) -> Result<WriteReceipt>;

    /// Remove a row. Fails with `NotFound` if absent.
    async fn delete_row(&self, table: &str, partition_key: &str, row_key: &str) -> Result<()>;
}

/// Opaque binary objects in named containers.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Create a container. Returns `false` if it already existed.
    async fn create_container_if_not_exists(&self, container: &str) -> Result<bool>;

    /// Store an object, replacing any object of the same name.
    ///
    /// Fails with `NotFound` if the container does not exist. Returns the
    /// object's retrieval URL.
    async fn put_blob(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<Url>;

    /// Remove an object. Returns whether anything was deleted.
    async fn delete_blob_if_exists(&self, container: &str, name: &str) -> Result<bool>;
}

/// Named text-message queues.
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Create a queue. Returns `false` if it already existed.
    async fn create_queue_if_not_exists(&self, queue: &str) -> Result<bool>;

    /// Enqueue a message. Fails with `NotFound` if the queue does not exist.
    async fn send_message(&self, queue: &str, text: &str) -> Result<()>;

    /// Dequeue and delete at most one message.
    async fn receive_message(&self, queue: &str) -> Result<Option<String>>;
}

/// Hierarchical file shares.
#[async_trait]
pub trait ShareBackend: Send + Sync {
    /// Create a share. Returns `false` if it already existed.
    async fn create_share_if_not_exists(&self, share: &str) -> Result<bool>;

    /// Create one directory whose parent already exists.
    /// Returns `false` if it already existed.
    async fn create_directory_if_not_exists(&self, share: &str, directory: &str) -> Result<bool>;

    /// Create (or replace) a file sized to `data` and write its full range.
    ///
    /// `directory` is `""` for the share root.
    async fn put_file(&self, share: &str, directory: &str, name: &str, data: Bytes) -> Result<()>;

    /// Read a whole file. Fails with `NotFound` if the share, directory or
    /// file does not exist.
    async fn get_file(&self, share: &str, directory: &str, name: &str) -> Result<Bytes>;
}

/// The four backend handles the storage facade is built from.
#[derive(Clone)]
pub struct StorageBackends {
    pub tables: Arc<dyn TableBackend>,
    pub blobs: Arc<dyn BlobBackend>,
    pub queues: Arc<dyn QueueBackend>,
    pub shares: Arc<dyn ShareBackend>,
}

impl StorageBackends {
    /// Use one implementation for every primitive.
    pub fn from_single<B>(backend: B) -> Self
    where
        B: TableBackend + BlobBackend + QueueBackend + ShareBackend + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            tables: backend.clone(),
            blobs: backend.clone(),
            queues: backend.clone(),
            shares: backend,
        }
    }
}

impl std::fmt::Debug for StorageBackends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBackends").finish_non_exhaustive()
    }
}

/// Append path segments to a service endpoint, percent-encoding each one.
pub(crate) fn resource_url(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| {
            crate::error::StorageError::InvalidInput(format!("endpoint cannot be a base: {base}"))
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_url_encodes_segments() {
        let base = Url::parse("https://acct.blob.core.windows.net/").unwrap();
        let url = resource_url(&base, &["images", "a b.png"]).unwrap();
        assert_eq!(url.as_str(), "https://acct.blob.core.windows.net/images/a%20b.png");
    }

    #[test]
    fn test_resource_url_keeps_base_path() {
        let base = Url::parse("http://127.0.0.1:10000/devstoreaccount1").unwrap();
        let url = resource_url(&base, &["productimages"]).unwrap();
        assert_eq!(url.path(), "/devstoreaccount1/productimages");
    }
}
