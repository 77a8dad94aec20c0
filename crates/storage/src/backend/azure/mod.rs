//! Storage account REST backend.
//!
//! Talks to the table, blob, queue and file services of one storage account
//! over HTTPS with a single shared `reqwest` client. Requests are authorized
//! either with Shared Key signatures (Shared Key Lite for tables) or with a
//! SAS token taken from the connection string.
//!
//! # Status mapping
//!
//! | HTTP            | Error                |
//! |-----------------|----------------------|
//! | 404             | `NotFound`           |
//! | 409, 412        | `Conflict`           |
//! | 400, 413, 416   | `InvalidInput`       |
//! | anything else   | `BackendUnavailable` |
//!
//! "Already exists" answers to create requests are not errors; they are
//! reported as `false` by the `create_*_if_not_exists` operations.

mod auth;
mod blob;
mod file;
mod queue;
mod table;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Response, StatusCode};
use secrecy::{ExposeSecret, SecretSlice};
use tracing::debug;
use url::Url;

use crate::config::StorageConfig;
use crate::connection::{AccountCredential, StorageAccount};
use crate::error::{Result, StorageError};

use self::auth::SigningScheme;

/// REST API version sent to the blob, queue and file services.
const STORAGE_API_VERSION: &str = "2021-08-06";

/// REST API version sent to the table service.
const TABLE_API_VERSION: &str = "2019-02-02";

/// The storage service a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Service {
    Blob,
    Queue,
    Table,
    File,
}

impl Service {
    const fn api_version(self) -> &'static str {
        match self {
            Self::Table => TABLE_API_VERSION,
            Self::Blob | Self::Queue | Self::File => STORAGE_API_VERSION,
        }
    }

    const fn signing_scheme(self) -> SigningScheme {
        match self {
            Self::Table => SigningScheme::Table,
            Self::Blob | Self::Queue | Self::File => SigningScheme::BlobQueueFile,
        }
    }
}

/// Client for one storage account's REST services.
///
/// Cheaply cloneable; every clone shares the same HTTP connection pool.
#[derive(Clone)]
pub struct AzureStorageClient {
    inner: Arc<AzureStorageClientInner>,
}

struct AzureStorageClientInner {
    http: reqwest::Client,
    account: StorageAccount,
    /// Decoded account key, when the account uses shared key auth.
    key: Option<SecretSlice<u8>>,
}

impl std::fmt::Debug for AzureStorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureStorageClient")
            .field("account", &self.inner.account.name)
            .field("key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl AzureStorageClient {
    /// Create a client for a parsed account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::BackendUnavailable` if the HTTP client cannot be built.
    pub fn new(account: StorageAccount, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let key = account.credential.decoded_key().map(SecretSlice::from);

        Ok(Self {
            inner: Arc::new(AzureStorageClientInner { http, account, key }),
        })
    }

    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` if the connection string is invalid.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let account =
            StorageAccount::from_connection_string(config.connection_string.expose_secret())?;
        Self::new(account, config.http_timeout)
    }

    /// The account this client talks to.
    #[must_use]
    pub fn account(&self) -> &StorageAccount {
        &self.inner.account
    }

    /// Sign and send one request.
    ///
    /// The returned response may carry any status; callers map failures with
    /// [`error_from_response`].
    async fn send(
        &self,
        service: Service,
        method: Method,
        mut url: Url,
        mut headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Result<Response> {
        if let AccountCredential::SharedAccessSignature(sas) = &self.inner.account.credential {
            let query = match url.query() {
                Some(existing) if !existing.is_empty() => {
                    format!("{existing}&{}", sas.expose_secret())
                }
                _ => sas.expose_secret().to_owned(),
            };
            url.set_query(Some(&query));
        }

        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        insert_header(&mut headers, "x-ms-date", &date)?;
        insert_header(&mut headers, "x-ms-version", service.api_version())?;

        if let Some(key) = &self.inner.key {
            let scheme = service.signing_scheme();
            let string_to_sign = auth::string_to_sign(
                scheme,
                &method,
                &url,
                &headers,
                body.as_ref().map_or(0, Bytes::len),
                &self.inner.account.name,
            );
            let signature = auth::sign(key.expose_secret(), &string_to_sign)?;
            let authorization = format!(
                "{} {}:{signature}",
                scheme.authorization_kind(),
                self.inner.account.name
            );
            insert_header(&mut headers, "authorization", &authorization)?;
        }

        debug!(service = ?service, method = %method, path = %url.path(), "storage request");

        let mut request = self.inner.http.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }
        Ok(request.send().await?)
    }
}

/// Insert a header, rejecting values that are not valid header text.
fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<()> {
    let value = HeaderValue::from_str(value)
        .map_err(|e| StorageError::InvalidInput(format!("invalid {name} header: {e}")))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

/// Map a failed response to a storage error.
async fn error_from_response(response: Response, resource: &str) -> StorageError {
    let status = response.status();
    let code = response
        .headers()
        .get("x-ms-error-code")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = response.text().await.unwrap_or_default();
    debug!(%status, error_code = ?code, body = %body, "storage request failed");

    let detail = code.map_or_else(
        || format!("{resource} (HTTP {status})"),
        |code| format!("{resource}: {code} (HTTP {status})"),
    );
    error_for_status(status, detail)
}

fn error_for_status(status: StatusCode, detail: String) -> StorageError {
    match status.as_u16() {
        404 => StorageError::NotFound(detail),
        409 | 412 => StorageError::Conflict(detail),
        400 | 413 | 416 => StorageError::InvalidInput(detail),
        _ => StorageError::BackendUnavailable(detail),
    }
}

/// Interpret the answer to a create-if-absent request.
///
/// Returns `true` if the resource was created, `false` if it already existed.
async fn created_or_existing(response: Response, resource: &str) -> Result<bool> {
    match response.status() {
        StatusCode::CREATED => Ok(true),
        // Queue service answers 204 when an identical queue already exists.
        StatusCode::NO_CONTENT | StatusCode::CONFLICT => Ok(false),
        _ => Err(error_from_response(response, resource).await),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_for_status() {
        let map = |code: u16| error_for_status(StatusCode::from_u16(code).unwrap(), String::new());
        assert!(matches!(map(404), StorageError::NotFound(_)));
        assert!(matches!(map(409), StorageError::Conflict(_)));
        assert!(matches!(map(412), StorageError::Conflict(_)));
        assert!(matches!(map(400), StorageError::InvalidInput(_)));
        assert!(matches!(map(403), StorageError::BackendUnavailable(_)));
        assert!(matches!(map(503), StorageError::BackendUnavailable(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let account = StorageAccount::development().unwrap();
        let client = AzureStorageClient::new(account, Duration::from_secs(5)).unwrap();
        let debug_output = format!("{client:?}");
        assert!(debug_output.contains("devstoreaccount1"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
