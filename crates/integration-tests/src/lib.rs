//! Integration tests for ABC Retail storage.
//!
//! These tests talk to a real storage endpoint and are `#[ignore]`d by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! # Start Azurite (tables, blobs and queues)
//! docker run -p 10000:10000 -p 10001:10001 -p 10002:10002 \
//!     mcr.microsoft.com/azure-storage/azurite
//!
//! # Run the emulator tests
//! cargo test -p abc-retail-integration-tests -- --ignored
//! ```
//!
//! Azurite has no file service. File share tests run only when
//! `AZURE_STORAGE_CONNECTION_STRING` names a real storage account.
//!
//! # Test Categories
//!
//! - `azurite_storage` - Entity, object and queue round trips plus provisioning
//! - `file_share` - File share round trips against a real account

#![cfg_attr(not(test), forbid(unsafe_code))]

use abc_retail_storage::{StorageConfig, StorageService};

/// Connection string for the emulator tests.
///
/// Uses `AZURITE_CONNECTION_STRING` when set, otherwise the local emulator.
#[must_use]
pub fn azurite_connection_string() -> String {
    std::env::var("AZURITE_CONNECTION_STRING")
        .unwrap_or_else(|_| "UseDevelopmentStorage=true".to_string())
}

/// A facade connected to the emulator.
///
/// # Panics
///
/// Panics if the connection string is invalid.
#[must_use]
pub fn azurite_storage() -> StorageService {
    let config = StorageConfig::new(azurite_connection_string());
    StorageService::from_config(&config).expect("Failed to configure storage")
}

/// A name no other test run uses, valid for tables, containers, queues and shares.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}{}", uuid::Uuid::new_v4().simple())
}
