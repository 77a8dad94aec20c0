//! In-process storage backend.
//!
//! Emulates the four storage services with the same observable semantics as
//! the REST backend: version tags change on every write, conditional writes
//! detect mismatches, missing containers/queues/shares fail with `NotFound`,
//! and `receive_message` dequeues. State lives behind one mutex that is
//! never held across an await point.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use abc_retail_core::ETag;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use url::Url;

use super::{
    BlobBackend, QueueBackend, ShareBackend, TableBackend, TableRow, WriteReceipt, resource_url,
};
use crate::error::{Result, StorageError};

const DEFAULT_BLOB_BASE: &str = "memory://blobs/";

#[derive(Default)]
struct MemoryState {
    tables: HashMap<String, BTreeMap<(String, String), TableRow>>,
    containers: HashMap<String, HashMap<String, StoredBlob>>,
    queues: HashMap<String, VecDeque<String>>,
    shares: HashMap<String, MemoryShare>,
    version: u64,
}

struct StoredBlob {
    data: Bytes,
    content_type: String,
}

#[derive(Default)]
struct MemoryShare {
    directories: BTreeSet<String>,
    files: HashMap<(String, String), Bytes>,
}

impl MemoryShare {
    fn has_directory(&self, directory: &str) -> bool {
        directory.is_empty() || self.directories.contains(directory)
    }
}

/// In-memory implementation of every backend trait.
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    blob_base: Url,
}

impl MemoryBackend {
    /// Create an empty backend.
    ///
    /// # Panics
    ///
    /// Never panics in practice; the default blob base is a constant URL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_blob_base(Url::parse(DEFAULT_BLOB_BASE).expect("valid memory blob base URL"))
    }

    /// Create an empty backend whose blob URLs start with `blob_base`.
    #[must_use]
    pub fn with_blob_base(blob_base: Url) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            blob_base,
        }
    }

    /// Stored bytes and content type of an object, if present.
    #[must_use]
    pub fn blob(&self, container: &str, name: &str) -> Option<(Bytes, String)> {
        let state = self.state.lock().ok()?;
        state
            .containers
            .get(container)?
            .get(name)
            .map(|blob| (blob.data.clone(), blob.content_type.clone()))
    }

    /// Number of objects in a container (zero if it does not exist).
    #[must_use]
    pub fn blob_count(&self, container: &str) -> usize {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.containers.get(container).map(HashMap::len))
            .unwrap_or(0)
    }

    /// Number of messages waiting in a queue (zero if it does not exist).
    #[must_use]
    pub fn queue_len(&self, queue: &str) -> usize {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.queues.get(queue).map(VecDeque::len))
            .unwrap_or(0)
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| {
            StorageError::BackendUnavailable("memory backend lock poisoned".to_string())
        })
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("blob_base", &self.blob_base.as_str())
            .finish_non_exhaustive()
    }
}

fn create_if_absent<T: Default>(map: &mut HashMap<String, T>, name: &str) -> bool {
    if map.contains_key(name) {
        return false;
    }
    map.insert(name.to_owned(), T::default());
    true
}

fn table_not_found(table: &str) -> StorageError {
    StorageError::NotFound(format!("table {table}"))
}

fn row_not_found(table: &str, partition_key: &str, row_key: &str) -> StorageError {
    StorageError::NotFound(format!("table {table} row ({partition_key}, {row_key})"))
}

#[async_trait]
impl TableBackend for MemoryBackend {
    async fn create_table_if_not_exists(&self, table: &str) -> Result<bool> {
        Ok(create_if_absent(&mut self.state()?.tables, table))
    }

    async fn get_row(&self, table: &str, partition_key: &str, row_key: &str) -> Result<TableRow> {
        let state = self.state()?;
        let rows = state.tables.get(table).ok_or_else(|| table_not_found(table))?;
        rows.get(&(partition_key.to_owned(), row_key.to_owned()))
            .cloned()
            .ok_or_else(|| row_not_found(table, partition_key, row_key))
    }

    async fn query_rows(&self, table: &str, partition_key: Option<&str>) -> Result<Vec<TableRow>> {
        let state = self.state()?;
        let rows = state.tables.get(table).ok_or_else(|| table_not_found(table))?;
        Ok(rows
            .values()
            .filter(|row| partition_key.is_none_or(|pk| row.partition_key == pk))
            .cloned()
            .collect())
    }

    async fn upsert_row(&self, table: &str, mut row: TableRow) -> Result<WriteReceipt> {
        let mut state = self.state()?;
        state.version += 1;
        let etag = ETag::new(format!("W/\"{}\"", state.version));
        let timestamp = Utc::now();

        let rows = state
            .tables
            .get_mut(table)
            .ok_or_else(|| table_not_found(table))?;
        let key = (row.partition_key.clone(), row.row_key.clone());

        if let Some(expected) = &row.etag {
            let current = rows
                .get(&key)
                .ok_or_else(|| row_not_found(table, &key.0, &key.1))?;
            if current.etag.as_ref() != Some(expected) {
                return Err(StorageError::Conflict(format!(
                    "table {table} row ({}, {}) was modified (expected {expected})",
                    key.0, key.1
                )));
            }
        }

        row.etag = Some(etag.clone());
        row.timestamp = Some(timestamp);
        rows.insert(key, row);

        Ok(WriteReceipt {
            etag,
            timestamp: Some(timestamp),
        })
    }

    async fn delete_row(&self, table: &str, partition_key: &str, row_key: &str) -> Result<()> {
        let mut state = self.state()?;
        let rows = state
            .tables
            .get_mut(table)
            .ok_or_else(|| table_not_found(table))?;
        rows.remove(&(partition_key.to_owned(), row_key.to_owned()))
            .map(|_| ())
            .ok_or_else(|| row_not_found(table, partition_key, row_key))
    }
}

#[async_trait]
impl BlobBackend for MemoryBackend {
    async fn create_container_if_not_exists(&self, container: &str) -> Result<bool> {
        Ok(create_if_absent(&mut self.state()?.containers, container))
    }

    async fn put_blob(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<Url> {
        let url = resource_url(&self.blob_base, &[container, name])?;
        let mut state = self.state()?;
        let blobs = state
            .containers
            .get_mut(container)
            .ok_or_else(|| StorageError::NotFound(format!("container {container}")))?;
        blobs.insert(
            name.to_owned(),
            StoredBlob {
                data,
                content_type: content_type.to_owned(),
            },
        );
        Ok(url)
    }

    async fn delete_blob_if_exists(&self, container: &str, name: &str) -> Result<bool> {
        let mut state = self.state()?;
        Ok(state
            .containers
            .get_mut(container)
            .is_some_and(|blobs| blobs.remove(name).is_some()))
    }
}

#[async_trait]
impl QueueBackend for MemoryBackend {
    async fn create_queue_if_not_exists(&self, queue: &str) -> Result<bool> {
        Ok(create_if_absent(&mut self.state()?.queues, queue))
    }

    async fn send_message(&self, queue: &str, text: &str) -> Result<()> {
        let mut state = self.state()?;
        state
            .queues
            .get_mut(queue)
            .ok_or_else(|| StorageError::NotFound(format!("queue {queue}")))?
            .push_back(text.to_owned());
        Ok(())
    }

    async fn receive_message(&self, queue: &str) -> Result<Option<String>> {
        let mut state = self.state()?;
        Ok(state
            .queues
            .get_mut(queue)
            .ok_or_else(|| StorageError::NotFound(format!("queue {queue}")))?
            .pop_front())
    }
}

#[async_trait]
impl ShareBackend for MemoryBackend {
    async fn create_share_if_not_exists(&self, share: &str) -> Result<bool> {
        Ok(create_if_absent(&mut self.state()?.shares, share))
    }

    async fn create_directory_if_not_exists(&self, share: &str, directory: &str) -> Result<bool> {
        let mut state = self.state()?;
        let files = state
            .shares
            .get_mut(share)
            .ok_or_else(|| StorageError::NotFound(format!("share {share}")))?;
        let parent = directory.rsplit_once('/').map_or("", |(parent, _)| parent);
        if !files.has_directory(parent) {
            return Err(StorageError::NotFound(format!("directory {share}/{parent}")));
        }
        Ok(files.directories.insert(directory.to_owned()))
    }

    async fn put_file(&self, share: &str, directory: &str, name: &str, data: Bytes) -> Result<()> {
        let mut state = self.state()?;
        let files = state
            .shares
            .get_mut(share)
            .ok_or_else(|| StorageError::NotFound(format!("share {share}")))?;
        if !files.has_directory(directory) {
            return Err(StorageError::NotFound(format!("directory {share}/{directory}")));
        }
        files
            .files
            .insert((directory.to_owned(), name.to_owned()), data);
        Ok(())
    }

    async fn get_file(&self, share: &str, directory: &str, name: &str) -> Result<Bytes> {
        let state = self.state()?;
        let files = state
            .shares
            .get(share)
            .ok_or_else(|| StorageError::NotFound(format!("share {share}")))?;
        if !files.has_directory(directory) {
            return Err(StorageError::NotFound(format!("directory {share}/{directory}")));
        }
        files
            .files
            .get(&(directory.to_owned(), name.to_owned()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("file {share}/{directory}/{name}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Map, json};

    use super::*;

    fn row(pk: &str, rk: &str, etag: Option<ETag>) -> TableRow {
        let mut properties = Map::new();
        properties.insert("PartitionKey".to_owned(), json!(pk));
        properties.insert("RowKey".to_owned(), json!(rk));
        TableRow {
            partition_key: pk.to_owned(),
            row_key: rk.to_owned(),
            properties,
            etag,
            timestamp: None,
        }
    }

    #[tokio::test]
    async fn test_conditional_write_detects_mismatch() {
        let backend = MemoryBackend::new();
        backend.create_table_if_not_exists("T").await.unwrap();

        let first = backend.upsert_row("T", row("P", "1", None)).await.unwrap();
        let second = backend
            .upsert_row("T", row("P", "1", Some(first.etag.clone())))
            .await
            .unwrap();
        assert_ne!(first.etag, second.etag);

        let err = backend
            .upsert_row("T", row("P", "1", Some(first.etag)))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_conditional_write_on_removed_row_is_not_found() {
        let backend = MemoryBackend::new();
        backend.create_table_if_not_exists("T").await.unwrap();
        let receipt = backend.upsert_row("T", row("P", "1", None)).await.unwrap();
        backend.delete_row("T", "P", "1").await.unwrap();

        let err = backend
            .upsert_row("T", row("P", "1", Some(receipt.etag)))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_missing_table_is_not_found() {
        let backend = MemoryBackend::new();
        assert!(backend.get_row("Nope", "P", "1").await.unwrap_err().is_not_found());
        assert!(backend.query_rows("Nope", None).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_queue_is_fifo_and_consumes() {
        let backend = MemoryBackend::new();
        backend.create_queue_if_not_exists("q").await.unwrap();
        backend.send_message("q", "one").await.unwrap();
        backend.send_message("q", "two").await.unwrap();

        assert_eq!(backend.receive_message("q").await.unwrap().as_deref(), Some("one"));
        assert_eq!(backend.receive_message("q").await.unwrap().as_deref(), Some("two"));
        assert_eq!(backend.receive_message("q").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_nested_directory_requires_parent() {
        let backend = MemoryBackend::new();
        backend.create_share_if_not_exists("s").await.unwrap();

        let err = backend
            .create_directory_if_not_exists("s", "a/b")
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        assert!(backend.create_directory_if_not_exists("s", "a").await.unwrap());
        assert!(backend.create_directory_if_not_exists("s", "a/b").await.unwrap());
        assert!(!backend.create_directory_if_not_exists("s", "a/b").await.unwrap());
    }

    #[tokio::test]
    async fn test_blob_requires_container() {
        let backend = MemoryBackend::new();
        let err = backend
            .put_blob("missing", "x.png", Bytes::from_static(b"x"), "image/png")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(!backend.delete_blob_if_exists("missing", "x.png").await.unwrap());
    }
}
