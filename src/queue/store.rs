//! Queue access through the Azure SDK

use crate::auth::{cloud_location, storage_credentials};
use crate::config::{StorageAccount, StorageService};
use crate::error::{sdk_status, AzstoreError, Result};
use crate::queue::models::QueueMessage;
use crate::utils::helpers::to_utc;
use async_trait::async_trait;
use azure_core::StatusCode;
use azure_storage_queues::prelude::*;
use azure_storage_queues::{PopReceipt, QueueServiceClientBuilder};
use base64::Engine;
use std::time::Duration;

/// Raw queue operations used by [`crate::queue::QueueStorage`]
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn queue_exists(&self, queue: &str) -> Result<bool>;

    async fn create_queue(&self, queue: &str) -> Result<()>;

    async fn delete_queue(&self, queue: &str) -> Result<()>;

    async fn put_message(&self, queue: &str, text: String, ttl: Duration) -> Result<()>;

    /// Up to `count` messages without changing their visibility.
    async fn peek_messages(&self, queue: &str, count: u8) -> Result<Vec<QueueMessage>>;

    /// Up to `count` messages, hidden from other consumers for `visibility`.
    async fn get_messages(
        &self,
        queue: &str,
        count: u8,
        visibility: Duration,
    ) -> Result<Vec<QueueMessage>>;

    async fn delete_message(&self, queue: &str, message_id: &str, pop_receipt: &str) -> Result<()>;
}

/// How message text is carried in the `MessageText` element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageEncoding {
    /// Base64, as the classic storage SDKs write it
    Base64,
    /// Plain text, XML escaped
    Plain,
}

impl MessageEncoding {
    pub fn encode(self, text: &str) -> String {
        match self {
            Self::Base64 => base64::engine::general_purpose::STANDARD.encode(text),
            // the SDK puts the text into the request body as is
            Self::Plain => quick_xml::escape::escape(text).into_owned(),
        }
    }

    pub fn decode(self, wire: &str) -> Result<String> {
        match self {
            Self::Base64 => {
                let bytes = base64::engine::general_purpose::STANDARD.decode(wire.trim())?;
                Ok(String::from_utf8(bytes)?)
            }
            Self::Plain => Ok(wire.to_string()),
        }
    }
}

/// [`QueueStore`] backed by `azure_storage_queues`
pub struct AzureQueueStore {
    service: QueueServiceClient,
    encoding: MessageEncoding,
}

impl AzureQueueStore {
    pub fn new(account: &StorageAccount, base64_messages: bool) -> Result<Self> {
        let credentials = storage_credentials(account)?;
        let location = cloud_location(account, StorageService::Queue)?;
        tracing::debug!("Using queue location {:?}", location);

        let service = QueueServiceClientBuilder::with_location(location, credentials).build();
        let encoding = if base64_messages {
            MessageEncoding::Base64
        } else {
            MessageEncoding::Plain
        };

        Ok(Self { service, encoding })
    }

    fn queue_client(&self, queue: &str) -> QueueClient {
        self.service.queue_client(queue)
    }
}

#[async_trait]
impl QueueStore for AzureQueueStore {
    async fn queue_exists(&self, queue: &str) -> Result<bool> {
        match self.queue_client(queue).get_metadata().await {
            Ok(_) => Ok(true),
            Err(e) if sdk_status(&e) == Some(StatusCode::NotFound) => Ok(false),
            Err(e) => Err(AzstoreError::azure_api(format!(
                "Failed to check queue '{queue}': {e}"
            ))),
        }
    }

    async fn create_queue(&self, queue: &str) -> Result<()> {
        self.queue_client(queue)
            .create()
            .await
            .map_err(|e| AzstoreError::azure_api(format!("Failed to create queue '{queue}': {e}")))?;
        Ok(())
    }

    async fn delete_queue(&self, queue: &str) -> Result<()> {
        self.queue_client(queue)
            .delete()
            .await
            .map_err(|e| AzstoreError::azure_api(format!("Failed to delete queue '{queue}': {e}")))?;
        Ok(())
    }

    async fn put_message(&self, queue: &str, text: String, ttl: Duration) -> Result<()> {
        self.queue_client(queue)
            .put_message(self.encoding.encode(&text))
            .ttl(ttl)
            .await
            .map_err(|e| AzstoreError::azure_api(format!("Failed to add message to '{queue}': {e}")))?;
        Ok(())
    }

    async fn peek_messages(&self, queue: &str, count: u8) -> Result<Vec<QueueMessage>> {
        let response = self
            .queue_client(queue)
            .peek_messages()
            .number_of_messages(count)
            .await
            .map_err(|e| AzstoreError::azure_api(format!("Failed to peek queue '{queue}': {e}")))?;

        response
            .messages
            .into_iter()
            .map(|message| {
                Ok(QueueMessage {
                    text: self.encoding.decode(&message.message_text)?,
                    message_id: message.message_id,
                    insertion_time: to_utc(message.insertion_time),
                    expiration_time: to_utc(message.expiration_time),
                    dequeue_count: message.dequeue_count.into(),
                    pop_receipt: None,
                    time_next_visible: None,
                })
            })
            .collect()
    }

    async fn get_messages(
        &self,
        queue: &str,
        count: u8,
        visibility: Duration,
    ) -> Result<Vec<QueueMessage>> {
        let response = self
            .queue_client(queue)
            .get_messages()
            .number_of_messages(count)
            .visibility_timeout(visibility)
            .await
            .map_err(|e| AzstoreError::azure_api(format!("Failed to receive from '{queue}': {e}")))?;

        response
            .messages
            .into_iter()
            .map(|message| {
                Ok(QueueMessage {
                    text: self.encoding.decode(&message.message_text)?,
                    message_id: message.message_id,
                    insertion_time: to_utc(message.insertion_time),
                    expiration_time: to_utc(message.expiration_time),
                    dequeue_count: message.dequeue_count.into(),
                    pop_receipt: Some(message.pop_receipt),
                    time_next_visible: Some(to_utc(message.time_next_visible)),
                })
            })
            .collect()
    }

    async fn delete_message(&self, queue: &str, message_id: &str, pop_receipt: &str) -> Result<()> {
        let receipt = PopReceipt::new(message_id, pop_receipt);
        match self.queue_client(queue).pop_receipt_client(receipt).delete().await {
            Ok(_) => Ok(()),
            Err(e) if sdk_status(&e) == Some(StatusCode::NotFound) => Err(AzstoreError::azure_api(
                format!("Message {message_id} was already deleted or its pop receipt expired"),
            )),
            Err(e) => Err(AzstoreError::azure_api(format!(
                "Failed to delete message {message_id}: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_encoding() {
        let encoding = MessageEncoding::Base64;
        assert_eq!(encoding.encode("hello"), "aGVsbG8=");
        assert_eq!(encoding.decode("aGVsbG8=").unwrap(), "hello");
        assert!(matches!(
            encoding.decode("not base64!"),
            Err(AzstoreError::Base64Error(_))
        ));
    }

    #[test]
    fn test_plain_encoding_escapes_markup() {
        let encoding = MessageEncoding::Plain;
        assert_eq!(encoding.encode("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(encoding.encode("{\"a\":1}"), "{&quot;a&quot;:1}");
        assert_eq!(encoding.decode("plain").unwrap(), "plain");
    }

    #[test]
    fn test_store_for_emulator() {
        let account = StorageAccount::parse("UseDevelopmentStorage=true").unwrap();
        let store = AzureQueueStore::new(&account, false).unwrap();
        assert_eq!(store.encoding, MessageEncoding::Plain);
    }
}
