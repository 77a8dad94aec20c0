//! File service operations.
//!
//! A file is created at its final size and then filled with ranged writes of
//! at most [`MAX_RANGE_BYTES`] each.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use url::Url;

use super::{AzureStorageClient, Service, created_or_existing, error_from_response};
use crate::backend::{ShareBackend, resource_url};
use crate::error::{Result, StorageError};

/// Largest range the file service accepts in one write.
const MAX_RANGE_BYTES: usize = 4 * 1024 * 1024;

impl AzureStorageClient {
    fn file_url(&self, share: &str, directory: &str, name: Option<&str>) -> Result<Url> {
        let mut segments = vec![share];
        segments.extend(directory.split('/').filter(|s| !s.is_empty()));
        segments.extend(name);
        resource_url(&self.inner.account.file_endpoint, &segments)
    }
}

#[async_trait]
impl ShareBackend for AzureStorageClient {
    async fn create_share_if_not_exists(&self, share: &str) -> Result<bool> {
        let mut url = resource_url(&self.inner.account.file_endpoint, &[share])?;
        url.set_query(Some("restype=share"));

        let response = self
            .send(Service::File, Method::PUT, url, HeaderMap::new(), None)
            .await?;
        created_or_existing(response, &format!("share {share}")).await
    }

    async fn create_directory_if_not_exists(&self, share: &str, directory: &str) -> Result<bool> {
        let mut url = self.file_url(share, directory, None)?;
        url.set_query(Some("restype=directory"));

        let response = self
            .send(Service::File, Method::PUT, url, HeaderMap::new(), None)
            .await?;
        created_or_existing(response, &format!("directory {share}/{directory}")).await
    }

    async fn put_file(&self, share: &str, directory: &str, name: &str, data: Bytes) -> Result<()> {
        let url = self.file_url(share, directory, Some(name))?;
        let resource = format!("file {share}/{directory}/{name}");

        let mut headers = HeaderMap::new();
        headers.insert("x-ms-type", HeaderValue::from_static("file"));
        headers.insert("x-ms-content-length", HeaderValue::from(data.len()));

        let response = self
            .send(Service::File, Method::PUT, url.clone(), headers, Some(Bytes::new()))
            .await?;
        if response.status() != StatusCode::CREATED {
            return Err(error_from_response(response, &resource).await);
        }

        for (start, end) in ranges(data.len()) {
            let mut range_url = url.clone();
            range_url.set_query(Some("comp=range"));

            let mut headers = HeaderMap::new();
            headers.insert("x-ms-write", HeaderValue::from_static("update"));
            let range = HeaderValue::from_str(&format!("bytes={start}-{end}"))
                .map_err(|e| StorageError::InvalidInput(e.to_string()))?;
            headers.insert("x-ms-range", range);

            let chunk = data.slice(start..=end);
            let response = self
                .send(Service::File, Method::PUT, range_url, headers, Some(chunk))
                .await?;
            if response.status() != StatusCode::CREATED {
                return Err(error_from_response(response, &resource).await);
            }
        }

        Ok(())
    }

    async fn get_file(&self, share: &str, directory: &str, name: &str) -> Result<Bytes> {
        let url = self.file_url(share, directory, Some(name))?;
        let response = self
            .send(Service::File, Method::GET, url, HeaderMap::new(), None)
            .await?;

        if response.status().is_success() {
            Ok(response.bytes().await?)
        } else {
            Err(error_from_response(response, &format!("file {share}/{directory}/{name}")).await)
        }
    }
}

/// Inclusive byte ranges covering `len` bytes in writable chunks.
fn ranges(len: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..len)
        .step_by(MAX_RANGE_BYTES)
        .map(move |start| (start, (start + MAX_RANGE_BYTES).min(len) - 1))
}
