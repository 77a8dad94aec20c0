//! Object store adapter.
//!
//! Stores user-submitted payloads under a freshly generated name so that
//! user-supplied file names never reach the backend. Containers are not
//! created here; provisioning must have created them.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use crate::backend::BlobBackend;
use crate::error::Result;

/// Store for opaque binary objects.
#[derive(Clone)]
pub struct ObjectStore {
    blobs: Arc<dyn BlobBackend>,
}

impl ObjectStore {
    /// Create a store over a blob backend.
    #[must_use]
    pub fn new(blobs: Arc<dyn BlobBackend>) -> Self {
        Self { blobs }
    }

    /// Upload a payload and return its retrieval URL.
    ///
    /// The stored name is a new UUID carrying the original extension, so two
    /// uploads of identical content under the same file name get distinct URLs.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the container does not exist.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn upload(&self, data: Bytes, file_name: &str, container: &str) -> Result<Url> {
        let name = storage_name(file_name);
        let content_type = content_type_for(&name);

        let url = self.blobs.put_blob(container, &name, data, content_type).await?;
        debug!(%url, content_type, "object uploaded");
        Ok(url)
    }

    /// Delete an object by its stored name. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::BackendUnavailable` if the backend cannot be reached.
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str, container: &str) -> Result<bool> {
        let existed = self.blobs.delete_blob_if_exists(container, name).await?;
        debug!(existed, "object delete");
        Ok(existed)
    }
}

impl std::fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore").finish_non_exhaustive()
    }
}

/// Extension of a user-supplied file name, lowercased, if it is plain ASCII
/// alphanumerics.
fn safe_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
}

/// A fresh storage name for an uploaded file.
fn storage_name(file_name: &str) -> String {
    let id = Uuid::new_v4();
    match safe_extension(file_name) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

/// Content type recorded with the object, derived from its extension.
fn content_type_for(name: &str) -> &'static str {
    match safe_extension(name).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
