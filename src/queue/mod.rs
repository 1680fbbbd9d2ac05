//! Azure Queue Storage access through the Azure SDK

pub mod manager;
pub mod models;
pub mod store;

pub use manager::QueueStorage;
pub use models::{QueueMessage, User};
pub use store::{AzureQueueStore, MessageEncoding, QueueStore};
