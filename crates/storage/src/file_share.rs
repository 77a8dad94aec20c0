//! Hierarchical file adapter.
//!
//! Uploads create the share and every level of the directory path when they
//! are missing, so repeated uploads into the same location are safe.
//! Downloads never create anything.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, instrument, warn};

use crate::backend::ShareBackend;
use crate::error::{Result, StorageError};

/// Files in named shares under optional directory paths.
#[derive(Clone)]
pub struct FileShare {
    shares: Arc<dyn ShareBackend>,
}

impl FileShare {
    /// Create an adapter over a share backend.
    #[must_use]
    pub fn new(shares: Arc<dyn ShareBackend>) -> Self {
        Self { shares }
    }

    /// Upload a file, creating the share and directory path if absent.
    ///
    /// `directory` may be nested (`a/b/c`) or empty for the share root.
    /// An existing file of the same name is replaced.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` if the file name is empty, `.`,
    /// `..`, or contains a path separator.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn upload(
        &self,
        data: Bytes,
        file_name: &str,
        share: &str,
        directory: &str,
    ) -> Result<()> {
        validate_file_name(file_name)?;
        let segments = directory_segments(directory);

        if self.shares.create_share_if_not_exists(share).await? {
            debug!("share created");
        }

        let mut path = String::new();
        for segment in &segments {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(segment);
            if self.shares.create_directory_if_not_exists(share, &path).await? {
                debug!(directory = %path, "directory created");
            }
        }

        self.shares.put_file(share, &path, file_name, data).await?;
        debug!("file uploaded");
        Ok(())
    }

    /// Read a whole file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the share, directory or file does not exist.
    #[instrument(skip(self))]
    pub async fn download(&self, file_name: &str, share: &str, directory: &str) -> Result<Bytes> {
        validate_file_name(file_name)?;
        let path = directory_segments(directory).join("/");

        let data = self.shares.get_file(share, &path, file_name).await?;
        debug!(size = data.len(), "file downloaded");
        Ok(data)
    }
}

impl std::fmt::Debug for FileShare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileShare").finish_non_exhaustive()
    }
}

fn directory_segments(directory: &str) -> Vec<&str> {
    directory.split('/').filter(|s| !s.is_empty()).collect()
}

fn validate_file_name(file_name: &str) -> Result<()> {
    if file_name.is_empty()
        || file_name == "."
        || file_name == ".."
        || file_name.contains(['/', '\\'])
    {
        warn!(file_name, "rejected file name");
        return Err(StorageError::InvalidInput(format!(
            "invalid file name: {file_name:?}"
        )));
    }
    Ok(())
}
