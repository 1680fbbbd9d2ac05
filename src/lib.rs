//! azstore - uniform facades over Azure Storage
//!
//! [`blob::BlobStorage`], [`file::FileStorage`], [`queue::QueueStorage`] and
//! [`table::TableStorage`] address remote resources by name, check that they
//! exist, and return typed results. Blob, queue and table access go through
//! the Azure SDK; file shares use the REST API signed with `reqsign`.

pub mod auth;
pub mod blob;
pub mod cli;
pub mod config;
pub mod error;
pub mod file;
pub mod models;
pub mod queue;
pub mod table;
pub mod utils;

// Re-export commonly used types
pub use error::{AzstoreError, Result};
pub use models::{DownloadDataType, DownloadedData, UploadDataType};
