//! Queue adapter.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::backend::QueueBackend;
use crate::error::Result;

/// Publish/receive of plain text messages on named queues.
#[derive(Clone)]
pub struct MessageQueue {
    queues: Arc<dyn QueueBackend>,
}

impl MessageQueue {
    /// Create an adapter over a queue backend.
    #[must_use]
    pub fn new(queues: Arc<dyn QueueBackend>) -> Self {
        Self { queues }
    }

    /// Enqueue a message.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the queue does not exist.
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub async fn send(&self, queue: &str, text: &str) -> Result<()> {
        self.queues.send_message(queue, text).await?;
        debug!("message sent");
        Ok(())
    }

    /// Take at most one message off the queue.
    ///
    /// A returned message has been deleted from the queue and will not be
    /// delivered again. Returns `None` when the queue is empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the queue does not exist.
    #[instrument(skip(self))]
    pub async fn receive(&self, queue: &str) -> Result<Option<String>> {
        let message = self.queues.receive_message(queue).await?;
        debug!(received = message.is_some(), "queue receive");
        Ok(message)
    }
}

impl std::fmt::Debug for MessageQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageQueue").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;

    #[tokio::test]
    async fn test_receive_consumes_message() {
        let backend = Arc::new(MemoryBackend::new());
        backend.create_queue_if_not_exists("orders").await.unwrap();
        let queue = MessageQueue::new(backend.clone());

        queue.send("orders", "New order created: o-1").await.unwrap();
        assert_eq!(backend.queue_len("orders"), 1);

        let text = queue.receive("orders").await.unwrap();
        assert_eq!(text.as_deref(), Some("New order created: o-1"));
        assert_eq!(backend.queue_len("orders"), 0);
        assert_eq!(queue.receive("orders").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_send_to_missing_queue_fails() {
        let queue = MessageQueue::new(Arc::new(MemoryBackend::new()));
        let err = queue.send("nowhere", "hello").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
