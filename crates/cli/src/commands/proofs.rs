//! Proof-of-payment commands.
//!
//! An uploaded proof is kept twice: as an object in the `paymentproofs`
//! container under a generated name, and as a file under its original name
//! in the `payment-proofs` directory of the `contracts` share.
//!
//! # Usage
//!
//! ```bash
//! abc-cli proof upload ./receipt.pdf
//! abc-cli proof download receipt.pdf --output ./copy.pdf
//! ```

use std::path::Path;

use abc_retail_storage::StorageService;
use abc_retail_storage::resources::{
    CONTRACTS_SHARE, PAYMENT_PROOFS_CONTAINER, PAYMENT_PROOFS_DIRECTORY,
};
use bytes::Bytes;
use url::Url;

use super::{CommandError, CommandResult, file_name_of};

/// Extensions accepted for proofs of payment.
const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "jpg", "jpeg", "png"];

/// Upload a proof of payment. Returns the object URL.
///
/// # Errors
///
/// Returns `CommandError::InvalidInput` if the file is not a PDF, JPG, JPEG or PNG.
/// Returns an error if the file cannot be read or either upload fails.
pub async fn upload(storage: &StorageService, path: &Path) -> CommandResult<Url> {
    let file_name = file_name_of(path)?;
    check_extension(file_name)?;

    let data = Bytes::from(tokio::fs::read(path).await?);

    let url = storage
        .upload_file(data.clone(), file_name, PAYMENT_PROOFS_CONTAINER)
        .await?;
    storage
        .upload_to_share(data, file_name, CONTRACTS_SHARE, PAYMENT_PROOFS_DIRECTORY)
        .await?;

    tracing::info!("File uploaded successfully!");
    tracing::info!("  Object: {url}");
    tracing::info!("  Share:  {CONTRACTS_SHARE}/{PAYMENT_PROOFS_DIRECTORY}/{file_name}");
    Ok(url)
}

/// Download a proof of payment from the contracts share to a local file.
///
/// # Errors
///
/// Returns `StorageError::NotFound` if no proof with that name was uploaded.
pub async fn download(storage: &StorageService, name: &str, output: &Path) -> CommandResult<u64> {
    let data = storage
        .download_from_share(name, CONTRACTS_SHARE, PAYMENT_PROOFS_DIRECTORY)
        .await?;
    tokio::fs::write(output, &data).await?;

    let size = data.len() as u64;
    tracing::info!("Downloaded {name} ({size} bytes) to {}", output.display());
    Ok(size)
}

fn check_extension(file_name: &str) -> CommandResult<()> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        tracing::warn!(file_name, "rejected proof of payment extension");
        Err(CommandError::InvalidInput(
            "Only PDF, JPG, JPEG, and PNG files are allowed.".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::commands::provision;

    async fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("abc-cli-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        dir
    }

    #[test]
    fn test_check_extension() {
        assert!(check_extension("receipt.pdf").is_ok());
        assert!(check_extension("scan.JPG").is_ok());
        assert!(check_extension("scan.jpeg").is_ok());
        assert!(check_extension("photo.png").is_ok());
        assert!(check_extension("notes.txt").unwrap_err().is_invalid_input());
        assert!(check_extension("noextension").unwrap_err().is_invalid_input());
    }

    #[tokio::test]
    async fn test_upload_then_download() {
        let storage = StorageService::in_memory();
        provision::run(&storage).await.unwrap();
        let dir = temp_dir().await;
        let source = dir.join("receipt.pdf");
        tokio::fs::write(&source, b"%PDF-1.7 paid").await.unwrap();

        let url = upload(&storage, &source).await.unwrap();
        assert!(url.path().ends_with(".pdf"));

        let output = dir.join("copy.pdf");
        let size = download(&storage, "receipt.pdf", &output).await.unwrap();
        assert_eq!(size, 13);
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"%PDF-1.7 paid");

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_rejected_extension_uploads_nothing() {
        let storage = StorageService::in_memory();
        provision::run(&storage).await.unwrap();
        let dir = temp_dir().await;
        let source = dir.join("payload.exe");
        tokio::fs::write(&source, b"MZ").await.unwrap();

        let err = upload(&storage, &source).await.unwrap_err();
        assert!(err.is_invalid_input());

        let err = download(&storage, "payload.exe", &dir.join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Storage(ref e) if e.is_not_found()));

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
