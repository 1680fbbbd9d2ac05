//! Azure Files access over REST

pub mod manager;
pub mod models;
pub mod store;

pub use manager::{FileStorage, MAX_RANGE_SIZE};
pub use models::FileListItem;
pub use store::{AzureFileShareStore, FileShareStore};
