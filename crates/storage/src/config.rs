//! Storage configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AZURE_STORAGE_CONNECTION_STRING` - Storage account connection string
//!   (falls back to `ConnectionStrings__AzureStorage`)
//!
//! ## Optional
//! - `STORAGE_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storage access configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage account connection string (contains the account key)
    pub connection_string: SecretString,
    /// Timeout applied to every backend request
    pub http_timeout: Duration,
}

impl StorageConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the connection string is missing or the
    /// timeout is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let connection_string = get_connection_string("AZURE_STORAGE_CONNECTION_STRING")?;
        let timeout_secs = get_env_or_default(
            "STORAGE_HTTP_TIMEOUT_SECS",
            &DEFAULT_HTTP_TIMEOUT_SECS.to_string(),
        );
        let http_timeout = parse_timeout(&timeout_secs)
            .map_err(|e| ConfigError::InvalidEnvVar("STORAGE_HTTP_TIMEOUT_SECS".to_string(), e))?;

        Ok(Self {
            connection_string,
            http_timeout,
        })
    }

    /// Build a configuration from an explicit connection string.
    #[must_use]
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: SecretString::from(connection_string.into()),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get the connection string with fallback to the hosting framework's
/// `ConnectionStrings__AzureStorage` key.
fn get_connection_string(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("ConnectionStrings__AzureStorage") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a timeout given in whole seconds.
fn parse_timeout(value: &str) -> Result<Duration, String> {
    let secs = value.trim().parse::<u64>().map_err(|e| e.to_string())?;
    if secs == 0 {
        return Err("must be greater than zero".to_string());
    }
    Ok(Duration::from_secs(secs))
}
