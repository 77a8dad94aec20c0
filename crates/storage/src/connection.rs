//! Storage account connection strings.
//!
//! Parses the `Key=Value;Key=Value` connection strings issued for a storage
//! account into endpoints and a credential.
//!
//! # Supported keys
//!
//! - `DefaultEndpointsProtocol` - `https` (default) or `http`
//! - `AccountName` / `AccountKey` - shared key credential
//! - `SharedAccessSignature` - SAS token credential
//! - `EndpointSuffix` - DNS suffix (default: `core.windows.net`)
//! - `BlobEndpoint`, `QueueEndpoint`, `TableEndpoint`, `FileEndpoint` - explicit overrides
//! - `UseDevelopmentStorage=true` - the local emulator's well-known account
//!
//! Keys are matched case-insensitively. Values may contain `=` (base64 keys do).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

/// Errors that can occur when parsing a connection string.
#[derive(Debug, Error)]
pub enum ConnectionStringError {
    #[error("connection string is empty")]
    Empty,
    #[error("malformed connection string segment: {0}")]
    MalformedSegment(String),
    #[error("connection string has no AccountName and no endpoint to derive it from")]
    MissingAccountName,
    #[error("connection string has neither AccountKey nor SharedAccessSignature")]
    MissingCredential,
    #[error("AccountKey is not valid base64")]
    InvalidAccountKey,
    #[error("invalid {0}: {1}")]
    InvalidEndpoint(&'static str, String),
}

/// How requests to the account are authorized.
#[derive(Debug, Clone)]
pub enum AccountCredential {
    /// Base64 account key used to sign every request.
    SharedKey(SecretString),
    /// SAS token appended to every request URL (without leading `?`).
    SharedAccessSignature(SecretString),
}

impl AccountCredential {
    /// Decode the account key, if this is a shared key credential.
    pub(crate) fn decoded_key(&self) -> Option<Vec<u8>> {
        match self {
            Self::SharedKey(key) => STANDARD.decode(key.expose_secret()).ok(),
            Self::SharedAccessSignature(_) => None,
        }
    }
}

/// A parsed storage account: name, credential and per-service endpoints.
#[derive(Debug, Clone)]
pub struct StorageAccount {
    pub name: String,
    pub credential: AccountCredential,
    pub blob_endpoint: Url,
    pub queue_endpoint: Url,
    pub table_endpoint: Url,
    pub file_endpoint: Url,
}

impl StorageAccount {
    /// Parse a connection string.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionStringError` if the string is empty or malformed,
    /// has no usable credential, or names an invalid endpoint.
    pub fn from_connection_string(connection_string: &str) -> Result<Self, ConnectionStringError> {
        let pairs = parse_pairs(connection_string)?;
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.as_str())
        };

        if get("UseDevelopmentStorage").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
            return Self::development();
        }

        let protocol = get("DefaultEndpointsProtocol").unwrap_or("https");
        let suffix = get("EndpointSuffix").unwrap_or(DEFAULT_ENDPOINT_SUFFIX);

        let explicit = [
            get("BlobEndpoint"),
            get("QueueEndpoint"),
            get("TableEndpoint"),
            get("FileEndpoint"),
        ];
        let name = match get("AccountName") {
            Some(name) => name.to_owned(),
            None => explicit
                .iter()
                .flatten()
                .find_map(|endpoint| account_from_endpoint(endpoint))
                .ok_or(ConnectionStringError::MissingAccountName)?,
        };

        let endpoint = |label: &'static str, explicit: Option<&str>, service: &str| {
            let raw = explicit.map_or_else(
                || format!("{protocol}://{name}.{service}.{suffix}"),
                str::to_owned,
            );
            Url::parse(&raw)
                .map_err(|e| ConnectionStringError::InvalidEndpoint(label, e.to_string()))
        };

        let [blob, queue, table, file] = explicit;
        let blob_endpoint = endpoint("BlobEndpoint", blob, "blob")?;
        let queue_endpoint = endpoint("QueueEndpoint", queue, "queue")?;
        let table_endpoint = endpoint("TableEndpoint", table, "table")?;
        let file_endpoint = endpoint("FileEndpoint", file, "file")?;

        let credential = if let Some(key) = get("AccountKey") {
            if STANDARD.decode(key).is_err() {
                return Err(ConnectionStringError::InvalidAccountKey);
            }
            AccountCredential::SharedKey(SecretString::from(key.to_owned()))
        } else if let Some(sas) = get("SharedAccessSignature") {
            AccountCredential::SharedAccessSignature(SecretString::from(
                sas.trim_start_matches('?').to_owned(),
            ))
        } else {
            return Err(ConnectionStringError::MissingCredential);
        };

        Ok(Self {
            name,
            credential,
            blob_endpoint,
            queue_endpoint,
            table_endpoint,
            file_endpoint,
        })
    }

    /// The local emulator's well-known account on its default ports.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the endpoints are constants.
    pub fn development() -> Result<Self, ConnectionStringError> {
        let endpoint = |label: &'static str, port: u16| {
            Url::parse(&format!("http://127.0.0.1:{port}/{DEV_ACCOUNT_NAME}"))
                .map_err(|e| ConnectionStringError::InvalidEndpoint(label, e.to_string()))
        };

        Ok(Self {
            name: DEV_ACCOUNT_NAME.to_owned(),
            credential: AccountCredential::SharedKey(SecretString::from(DEV_ACCOUNT_KEY)),
            blob_endpoint: endpoint("BlobEndpoint", 10000)?,
            queue_endpoint: endpoint("QueueEndpoint", 10001)?,
            table_endpoint: endpoint("TableEndpoint", 10002)?,
            file_endpoint: endpoint("FileEndpoint", 10003)?,
        })
    }
}

/// Split a connection string into trimmed `(key, value)` pairs.
fn parse_pairs(connection_string: &str) -> Result<Vec<(String, String)>, ConnectionStringError> {
    let pairs = connection_string
        .split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment
                .split_once('=')
                .map(|(k, v)| (k.trim().to_owned(), v.trim().to_owned()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| ConnectionStringError::MalformedSegment(segment.to_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if pairs.is_empty() {
        return Err(ConnectionStringError::Empty);
    }
    Ok(pairs)
}

/// Derive the account name from an endpoint host such as `acct.blob.core.windows.net`.
fn account_from_endpoint(endpoint: &str) -> Option<String> {
    let url = Url::parse(endpoint).ok()?;
    let host = url.host_str()?;
    host.split('.').next().map(str::to_owned)
}
