//! Data models for queue operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message read from a queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMessage {
    pub message_id: String,
    pub insertion_time: DateTime<Utc>,
    pub expiration_time: DateTime<Utc>,
    pub dequeue_count: u64,
    /// Present on received messages, absent on peeked ones
    pub pop_receipt: Option<String>,
    pub time_next_visible: Option<DateTime<Utc>>,
    pub text: String,
}

/// Sample payload carried as JSON message text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub password: String,
    pub email: String,
    pub tenant_id: Uuid,
    pub is_active: bool,
}
