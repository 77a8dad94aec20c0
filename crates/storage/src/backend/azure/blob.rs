//! Blob service operations.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use url::Url;

use super::{AzureStorageClient, Service, created_or_existing, error_from_response};
use crate::backend::{BlobBackend, resource_url};
use crate::error::{Result, StorageError};

#[async_trait]
impl BlobBackend for AzureStorageClient {
    async fn create_container_if_not_exists(&self, container: &str) -> Result<bool> {
        let mut url = resource_url(&self.inner.account.blob_endpoint, &[container])?;
        url.set_query(Some("restype=container"));

        let response = self
            .send(Service::Blob, Method::PUT, url, HeaderMap::new(), None)
            .await?;
        created_or_existing(response, &format!("container {container}")).await
    }

    async fn put_blob(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<Url> {
        let url = resource_url(&self.inner.account.blob_endpoint, &[container, name])?;
        let mut headers = HeaderMap::new();
        headers.insert("x-ms-blob-type", HeaderValue::from_static("BlockBlob"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(content_type)
                .map_err(|e| StorageError::InvalidInput(format!("invalid content type: {e}")))?,
        );

        let response = self
            .send(Service::Blob, Method::PUT, url.clone(), headers, Some(data))
            .await?;

        if response.status() == StatusCode::CREATED {
            Ok(url)
        } else {
            Err(error_from_response(response, &format!("blob {container}/{name}")).await)
        }
    }

    async fn delete_blob_if_exists(&self, container: &str, name: &str) -> Result<bool> {
        let url = resource_url(&self.inner.account.blob_endpoint, &[container, name])?;
        let response = self
            .send(Service::Blob, Method::DELETE, url, HeaderMap::new(), None)
            .await?;

        match response.status() {
            StatusCode::ACCEPTED => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(error_from_response(response, &format!("blob {container}/{name}")).await),
        }
    }
}
