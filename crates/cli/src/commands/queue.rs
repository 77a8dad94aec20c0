//! Queue inspection command.
//!
//! # Usage
//!
//! ```bash
//! abc-cli queue receive
//! abc-cli queue receive --queue notifications
//! ```

use abc_retail_storage::StorageService;

use super::CommandResult;

/// Take one message off a queue and log it.
///
/// # Errors
///
/// Returns `StorageError::NotFound` if the queue does not exist.
pub async fn receive(storage: &StorageService, queue: &str) -> CommandResult<Option<String>> {
    let message = storage.receive_message(queue).await?;
    match &message {
        Some(text) => tracing::info!("{queue}: {text}"),
        None => tracing::info!("{queue}: no messages"),
    }
    Ok(message)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use abc_retail_storage::resources::NOTIFICATIONS_QUEUE;

    use super::*;
    use crate::commands::provision;

    #[tokio::test]
    async fn test_receive_empty_then_message() {
        let storage = StorageService::in_memory();
        provision::run(&storage).await.unwrap();

        assert_eq!(receive(&storage, NOTIFICATIONS_QUEUE).await.unwrap(), None);

        storage
            .send_message(NOTIFICATIONS_QUEUE, "restock soon")
            .await
            .unwrap();
        assert_eq!(
            receive(&storage, NOTIFICATIONS_QUEUE).await.unwrap().as_deref(),
            Some("restock soon")
        );
    }
}
