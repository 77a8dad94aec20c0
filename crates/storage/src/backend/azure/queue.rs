//! Queue service operations.
//!
//! Message bodies travel as XML envelopes; the text is stored as given.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use super::{AzureStorageClient, Service, created_or_existing, error_from_response};
use crate::backend::{QueueBackend, resource_url};
use crate::error::{Result, StorageError};

#[derive(Debug, Serialize)]
#[serde(rename = "QueueMessage")]
struct OutgoingMessage<'a> {
    #[serde(rename = "MessageText")]
    message_text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct QueueMessagesList {
    #[serde(rename = "QueueMessage", default)]
    messages: Vec<ReceivedMessage>,
}

#[derive(Debug, Deserialize)]
struct ReceivedMessage {
    #[serde(rename = "MessageId")]
    message_id: String,
    #[serde(rename = "PopReceipt")]
    pop_receipt: String,
    #[serde(rename = "MessageText", default)]
    message_text: String,
}

#[async_trait]
impl QueueBackend for AzureStorageClient {
    async fn create_queue_if_not_exists(&self, queue: &str) -> Result<bool> {
        let url = resource_url(&self.inner.account.queue_endpoint, &[queue])?;
        let response = self
            .send(Service::Queue, Method::PUT, url, HeaderMap::new(), None)
            .await?;
        created_or_existing(response, &format!("queue {queue}")).await
    }

    async fn send_message(&self, queue: &str, text: &str) -> Result<()> {
        let url = resource_url(&self.inner.account.queue_endpoint, &[queue, "messages"])?;
        let body = quick_xml::se::to_string(&OutgoingMessage { message_text: text })
            .map_err(|e| StorageError::InvalidInput(format!("message encoding: {e}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/xml"));

        let response = self
            .send(Service::Queue, Method::POST, url, headers, Some(Bytes::from(body)))
            .await?;

        if response.status() == StatusCode::CREATED {
            Ok(())
        } else {
            Err(error_from_response(response, &format!("queue {queue}")).await)
        }
    }

    async fn receive_message(&self, queue: &str) -> Result<Option<String>> {
        let mut url = resource_url(&self.inner.account.queue_endpoint, &[queue, "messages"])?;
        url.set_query(Some("numofmessages=1"));

        let response = self
            .send(Service::Queue, Method::GET, url, HeaderMap::new(), None)
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response, &format!("queue {queue}")).await);
        }

        let body = response.text().await?;
        let Some(message) = parse_messages(&body)?.messages.into_iter().next() else {
            return Ok(None);
        };

        let mut url = resource_url(
            &self.inner.account.queue_endpoint,
            &[queue, "messages", &message.message_id],
        )?;
        url.query_pairs_mut()
            .append_pair("popreceipt", &message.pop_receipt);

        let response = self
            .send(Service::Queue, Method::DELETE, url, HeaderMap::new(), None)
            .await?;
        if !response.status().is_success() {
            let resource = format!("queue {queue} message {}", message.message_id);
            return Err(error_from_response(response, &resource).await);
        }

        Ok(Some(message.message_text))
    }
}

fn parse_messages(body: &str) -> Result<QueueMessagesList> {
    if body.trim().is_empty() {
        return Ok(QueueMessagesList::default());
    }
    quick_xml::de::from_str(body)
        .map_err(|e| StorageError::DataCorruption(format!("queue response: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_outgoing_message_envelope() {
        let xml = quick_xml::se::to_string(&OutgoingMessage {
            message_text: "New order created: o-1 & more",
        })
        .unwrap();
        assert_eq!(
            xml,
            concat!(
                "<QueueMessage><MessageText>",
                "New order created: o-1 &amp; more",
                "</MessageText></QueueMessage>"
            )
        );
    }

    #[test]
    fn test_parse_received_message() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<QueueMessagesList>
  <QueueMessage>
    <MessageId>5974b586-0df3-4e2d-ad0c-18e3892bfca2</MessageId>
    <InsertionTime>Mon, 19 Oct 2026 10:00:00 GMT</InsertionTime>
    <ExpirationTime>Mon, 26 Oct 2026 10:00:00 GMT</ExpirationTime>
    <PopReceipt>YzQ4Yzg1MDIGM0MDFiZDAwYzEw</PopReceipt>
    <TimeNextVisible>Mon, 19 Oct 2026 10:00:30 GMT</TimeNextVisible>
    <DequeueCount>1</DequeueCount>
    <MessageText>New order created: o-1</MessageText>
  </QueueMessage>
</QueueMessagesList>"#;

        let list = parse_messages(body).unwrap();
        assert_eq!(list.messages.len(), 1);
        assert_eq!(list.messages[0].message_id, "5974b586-0df3-4e2d-ad0c-18e3892bfca2");
        assert_eq!(list.messages[0].pop_receipt, "YzQ4Yzg1MDIGM0MDFiZDAwYzEw");
        assert_eq!(list.messages[0].message_text, "New order created: o-1");
    }

    #[test]
    fn test_parse_empty_queue() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?><QueueMessagesList />"#;
        assert!(parse_messages(body).unwrap().messages.is_empty());
        assert!(parse_messages("").unwrap().messages.is_empty());
    }
}
