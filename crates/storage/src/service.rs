//! The storage facade.
//!
//! [`StorageService`] is the only storage type callers use. It owns one
//! adapter per storage primitive, delegates every operation to the matching
//! adapter, and provisions the well-known resources at startup.

use std::sync::Arc;

use abc_retail_core::TableEntity;
use bytes::Bytes;
use tracing::{info, instrument};
use url::Url;

use crate::backend::azure::AzureStorageClient;
use crate::backend::memory::MemoryBackend;
use crate::backend::StorageBackends;
use crate::config::StorageConfig;
use crate::entity_store::EntityStore;
use crate::error::Result;
use crate::file_share::FileShare;
use crate::message_queue::MessageQueue;
use crate::object_store::ObjectStore;
use crate::resources::{ProvisionReport, ResourceManifest};

/// Storage access shared across the application.
///
/// Cheaply cloneable via `Arc`; clones share the same backend handles and
/// may be used concurrently.
#[derive(Clone)]
pub struct StorageService {
    inner: Arc<StorageServiceInner>,
}

struct StorageServiceInner {
    backends: StorageBackends,
    entities: EntityStore,
    objects: ObjectStore,
    queues: MessageQueue,
    files: FileShare,
}

impl StorageService {
    /// Create the facade over explicit backend handles.
    #[must_use]
    pub fn new(backends: StorageBackends) -> Self {
        let entities = EntityStore::new(backends.tables.clone());
        let objects = ObjectStore::new(backends.blobs.clone());
        let queues = MessageQueue::new(backends.queues.clone());
        let files = FileShare::new(backends.shares.clone());

        Self {
            inner: Arc::new(StorageServiceInner {
                backends,
                entities,
                objects,
                queues,
                files,
            }),
        }
    }

    /// Create the facade for the storage account named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` if the connection string is invalid.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let client = AzureStorageClient::from_config(config)?;
        info!(account = %client.account().name, "storage account configured");
        Ok(Self::new(StorageBackends::from_single(client)))
    }

    /// Create the facade over a fresh in-process backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(StorageBackends::from_single(MemoryBackend::new()))
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Point lookup of an entity.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no such entity exists.
    pub async fn get_entity<T: TableEntity>(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<T> {
        self.inner.entities.get(table, partition_key, row_key).await
    }

    /// Every entity in a table, optionally restricted to one partition.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::DataCorruption` if a stored row does not decode.
    pub async fn list_entities<T: TableEntity>(
        &self,
        table: &str,
        partition_key: Option<&str>,
    ) -> Result<Vec<T>> {
        self.inner.entities.list(table, partition_key).await
    }

    /// Insert or replace an entity, normalizing its temporal fields to UTC.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the entity's version tag is stale.
    pub async fn upsert_entity<T: TableEntity>(&self, table: &str, entity: &mut T) -> Result<()> {
        self.inner.entities.upsert(table, entity).await
    }

    /// Remove an entity.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no such entity exists.
    pub async fn delete_entity(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<()> {
        self.inner.entities.delete(table, partition_key, row_key).await
    }

    // =========================================================================
    // Objects
    // =========================================================================

    /// Upload a payload under a fresh name and return its URL.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the container was never provisioned.
    pub async fn upload_file(&self, data: Bytes, file_name: &str, container: &str) -> Result<Url> {
        self.inner.objects.upload(data, file_name, container).await
    }

    /// Delete an object. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::BackendUnavailable` if the backend cannot be reached.
    pub async fn delete_blob(&self, name: &str, container: &str) -> Result<bool> {
        self.inner.objects.delete(name, container).await
    }

    // =========================================================================
    // Queues
    // =========================================================================

    /// Enqueue a text message.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the queue was never provisioned.
    pub async fn send_message(&self, queue: &str, text: &str) -> Result<()> {
        self.inner.queues.send(queue, text).await
    }

    /// Take at most one message off a queue.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the queue was never provisioned.
    pub async fn receive_message(&self, queue: &str) -> Result<Option<String>> {
        self.inner.queues.receive(queue).await
    }

    // =========================================================================
    // File shares
    // =========================================================================

    /// Upload a file into a share, creating the share and directories as needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` if the file name is unsafe.
    pub async fn upload_to_share(
        &self,
        data: Bytes,
        file_name: &str,
        share: &str,
        directory: &str,
    ) -> Result<()> {
        self.inner.files.upload(data, file_name, share, directory).await
    }

    /// Read a whole file from a share.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the share, directory or file does not exist.
    pub async fn download_from_share(
        &self,
        file_name: &str,
        share: &str,
        directory: &str,
    ) -> Result<Bytes> {
        self.inner.files.download(file_name, share, directory).await
    }

    // =========================================================================
    // Provisioning
    // =========================================================================

    /// Create every resource in the manifest that does not exist yet.
    ///
    /// Safe to run against an already-provisioned account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::BackendUnavailable` if any create request fails.
    #[instrument(skip_all)]
    pub async fn provision(&self, manifest: &ResourceManifest) -> Result<ProvisionReport> {
        let backends = &self.inner.backends;
        let mut report = ProvisionReport::default();

        for table in &manifest.tables {
            let created = backends.tables.create_table_if_not_exists(table).await?;
            report.record(format!("table:{table}"), created);
        }
        for container in &manifest.containers {
            let created = backends.blobs.create_container_if_not_exists(container).await?;
            report.record(format!("container:{container}"), created);
        }
        for queue in &manifest.queues {
            let created = backends.queues.create_queue_if_not_exists(queue).await?;
            report.record(format!("queue:{queue}"), created);
        }
        for share in &manifest.shares {
            let created = backends.shares.create_share_if_not_exists(&share.name).await?;
            report.record(format!("share:{}", share.name), created);

            for directory in &share.directories {
                let mut path = String::new();
                for segment in directory.split('/').filter(|s| !s.is_empty()) {
                    if !path.is_empty() {
                        path.push('/');
                    }
                    path.push_str(segment);
                    let created = backends
                        .shares
                        .create_directory_if_not_exists(&share.name, &path)
                        .await?;
                    report.record(format!("directory:{}/{path}", share.name), created);
                }
            }
        }

        info!(
            created = report.created.len(),
            existing = report.existing.len(),
            "storage provisioned"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService")
            .field("backends", &self.inner.backends)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use abc_retail_core::{Customer, Product};

    use super::*;
    use crate::resources::{
        CONTRACTS_SHARE, CUSTOMERS_TABLE, ORDERS_QUEUE, PAYMENT_PROOFS_DIRECTORY,
        PRODUCT_IMAGES_CONTAINER, PRODUCTS_TABLE, ShareManifest,
    };

    async fn provisioned() -> StorageService {
        let storage = StorageService::in_memory();
        storage.provision(&ResourceManifest::default()).await.unwrap();
        storage
    }

    #[tokio::test]
    async fn test_provision_twice_is_idempotent() {
        let storage = StorageService::in_memory();
        let manifest = ResourceManifest::default();

        let first = storage.provision(&manifest).await.unwrap();
        assert!(first.existing.is_empty());
        assert_eq!(first.created.len(), 9);
        assert!(
            first
                .created
                .contains(&"directory:contracts/payment-proofs".to_owned())
        );

        let second = storage.provision(&manifest).await.unwrap();
        assert!(second.created.is_empty());
        assert_eq!(second.existing, first.created);
    }

    #[tokio::test]
    async fn test_provision_nested_share_directories() {
        let storage = StorageService::in_memory();
        let manifest = ResourceManifest {
            tables: vec![],
            containers: vec![],
            queues: vec![],
            shares: vec![ShareManifest {
                name: "archive".into(),
                directories: vec!["2026/q4".into()],
            }],
        };

        let report = storage.provision(&manifest).await.unwrap();
        assert_eq!(
            report.created,
            ["share:archive", "directory:archive/2026", "directory:archive/2026/q4"]
        );
    }

    #[tokio::test]
    async fn test_facade_round_trip_across_primitives() {
        let storage = provisioned().await;

        let mut customer =
            Customer::new("Grace", "Hopper", "grace", "grace@example.com", "Arlington");
        storage.upsert_entity(CUSTOMERS_TABLE, &mut customer).await.unwrap();
        let read: Customer = storage
            .get_entity(CUSTOMERS_TABLE, "Customer", customer.id.as_str())
            .await
            .unwrap();
        assert_eq!(read.username, "grace");

        let url = storage
            .upload_file(Bytes::from_static(b"img"), "mug.png", PRODUCT_IMAGES_CONTAINER)
            .await
            .unwrap();
        assert!(url.path().ends_with(".png"));

        storage.send_message(ORDERS_QUEUE, "hello").await.unwrap();
        assert_eq!(
            storage.receive_message(ORDERS_QUEUE).await.unwrap().as_deref(),
            Some("hello")
        );

        storage
            .upload_to_share(
                Bytes::from_static(b"proof"),
                "proof.pdf",
                CONTRACTS_SHARE,
                PAYMENT_PROOFS_DIRECTORY,
            )
            .await
            .unwrap();
        let data = storage
            .download_from_share("proof.pdf", CONTRACTS_SHARE, PAYMENT_PROOFS_DIRECTORY)
            .await
            .unwrap();
        assert_eq!(data, Bytes::from_static(b"proof"));
    }

    #[tokio::test]
    async fn test_read_between_stock_writes_sees_whole_values() {
        let storage = provisioned().await;
        let mut product = Product::new("Lamp", "Desk lamp", "30".parse().unwrap(), 10);
        storage.upsert_entity(PRODUCTS_TABLE, &mut product).await.unwrap();

        let reader = storage.clone();
        let id = product.id.clone();
        let read = tokio::spawn(async move {
            reader
                .get_entity::<Product>(PRODUCTS_TABLE, "Product", id.as_str())
                .await
                .unwrap()
                .stock_available
        });

        product.stock_available = 7;
        storage.upsert_entity(PRODUCTS_TABLE, &mut product).await.unwrap();

        let observed = read.await.unwrap();
        assert!(observed == 10 || observed == 7);
    }

    #[tokio::test]
    async fn test_unprovisioned_container_upload_fails() {
        let storage = StorageService::in_memory();
        let err = storage
            .upload_file(Bytes::from_static(b"x"), "a.png", PRODUCT_IMAGES_CONTAINER)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
