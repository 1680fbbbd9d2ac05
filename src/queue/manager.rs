//! Queue facade
//!
//! Text, raw message and typed (JSON) variants of peek and receive. Received
//! messages are deleted with their pop receipt once collected; typed receives
//! deserialize first, so a payload of the wrong shape stays on the queue.

use crate::config::{QueueConfig, StorageAccount};
use crate::error::{AzstoreError, Result};
use crate::queue::models::QueueMessage;
use crate::queue::store::{AzureQueueStore, QueueStore};
use crate::utils::helpers::require_name;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Name-addressed operations on storage queues
#[derive(Clone)]
pub struct QueueStorage {
    store: Arc<dyn QueueStore>,
    settings: QueueConfig,
}

impl QueueStorage {
    pub fn new(store: Arc<dyn QueueStore>, settings: QueueConfig) -> Self {
        Self { store, settings }
    }

    /// Facade over the account's queue endpoint.
    pub fn from_account(account: &StorageAccount, settings: QueueConfig) -> Result<Self> {
        let store = AzureQueueStore::new(account, settings.base64_messages)?;
        Ok(Self::new(Arc::new(store), settings))
    }

    async fn ensure_queue(&self, queue: &str) -> Result<()> {
        require_name("Queue", queue)?;
        if !self.store.queue_exists(queue).await? {
            return Err(AzstoreError::queue_not_found(queue));
        }
        Ok(())
    }

    /// Add each message in order. `None` uses the configured time-to-live.
    pub async fn add_messages<I, S>(&self, queue: &str, messages: I, ttl: Option<Duration>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ensure_queue(queue).await?;
        let ttl = ttl.unwrap_or_else(|| self.settings.message_ttl());

        let mut added = 0usize;
        for message in messages {
            self.store.put_message(queue, message.into(), ttl).await?;
            added += 1;
        }

        tracing::info!("Added {added} messages to queue {queue}");
        Ok(())
    }

    /// Serialize each object as JSON and add it as a message.
    pub async fn add_objects<T: Serialize>(
        &self,
        queue: &str,
        objects: &[T],
        ttl: Option<Duration>,
    ) -> Result<()> {
        let messages = objects
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.add_messages(queue, messages, ttl).await
    }

    /// Next visible message, left on the queue.
    pub async fn peek_message(&self, queue: &str) -> Result<Option<QueueMessage>> {
        self.ensure_queue(queue).await?;
        let message = self.store.peek_messages(queue, 1).await?.into_iter().next();
        if message.is_none() {
            tracing::debug!("Queue {queue} is empty");
        }
        Ok(message)
    }

    pub async fn peek_message_text(&self, queue: &str) -> Result<Option<String>> {
        Ok(self.peek_message(queue).await?.map(|m| m.text))
    }

    /// Next visible message deserialized from JSON, left on the queue.
    pub async fn peek_message_as<T: DeserializeOwned>(&self, queue: &str) -> Result<Option<T>> {
        self.peek_message(queue)
            .await?
            .map(|m| serde_json::from_str(&m.text).map_err(AzstoreError::from))
            .transpose()
    }

    /// Receive a batch and delete every message of it.
    pub async fn receive_messages(&self, queue: &str) -> Result<Vec<QueueMessage>> {
        self.receive_with(queue, Ok).await
    }

    pub async fn receive_messages_text(&self, queue: &str) -> Result<Vec<String>> {
        self.receive_with(queue, |m| Ok(m.text)).await
    }

    /// Receive a batch and deserialize each message from JSON before deleting it.
    pub async fn receive_messages_as<T: DeserializeOwned>(&self, queue: &str) -> Result<Vec<T>> {
        self.receive_with(queue, |m| Ok(serde_json::from_str(&m.text)?))
            .await
    }

    async fn receive_with<T, F>(&self, queue: &str, mut convert: F) -> Result<Vec<T>>
    where
        F: FnMut(QueueMessage) -> Result<T>,
    {
        self.ensure_queue(queue).await?;

        let batch = self
            .store
            .get_messages(
                queue,
                self.settings.batch_size,
                self.settings.visibility_timeout(),
            )
            .await?;
        tracing::debug!("Received {} messages from queue {queue}", batch.len());

        let mut results = Vec::with_capacity(batch.len());
        let mut consumed: Vec<String> = Vec::new();
        for message in batch {
            let message_id = message.message_id.clone();
            let pop_receipt = message.pop_receipt.clone().ok_or_else(|| {
                AzstoreError::azure_api(format!("Message {message_id} has no pop receipt"))
            })?;

            let converted = match convert(message) {
                Ok(value) => value,
                Err(e) => {
                    if !consumed.is_empty() {
                        tracing::warn!(
                            "Receive from {queue} failed at message {message_id}; already deleted: {}",
                            consumed.join(", ")
                        );
                    }
                    return Err(e);
                }
            };
            results.push(converted);
            self.store
                .delete_message(queue, &message_id, &pop_receipt)
                .await?;
            consumed.push(message_id);
        }

        Ok(results)
    }

    /// Create the queue unless it exists. Returns whether it was created.
    pub async fn create_queue(&self, queue: &str) -> Result<bool> {
        require_name("Queue", queue)?;
        if self.store.queue_exists(queue).await? {
            return Ok(false);
        }
        self.store.create_queue(queue).await?;
        tracing::info!("Created queue {queue}");
        Ok(true)
    }

    /// Delete the queue if it exists. Returns whether it was deleted.
    pub async fn delete_queue(&self, queue: &str) -> Result<bool> {
        require_name("Queue", queue)?;
        if !self.store.queue_exists(queue).await? {
            return Ok(false);
        }
        self.store.delete_queue(queue).await?;
        tracing::info!("Deleted queue {queue}");
        Ok(true)
    }
}
