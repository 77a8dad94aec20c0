//! Storage provisioning command.
//!
//! # Usage
//!
//! ```bash
//! abc-cli provision
//! ```

use abc_retail_storage::{ProvisionReport, ResourceManifest, StorageService};

use super::CommandResult;

/// Create every well-known table, container, queue, share and directory.
///
/// # Errors
///
/// Returns an error if any create request fails.
pub async fn run(storage: &StorageService) -> CommandResult<ProvisionReport> {
    tracing::info!("Provisioning storage resources...");
    let report = storage.provision(&ResourceManifest::default()).await?;

    for resource in &report.created {
        tracing::info!("  created  {resource}");
    }
    for resource in &report.existing {
        tracing::info!("  exists   {resource}");
    }
    tracing::info!("Provisioning complete!");

    Ok(report)
}
