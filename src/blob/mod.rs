//! Azure Blob Storage access
//!
//! Blob operations go through the Azure SDK; [`BlobStorage`] adds the
//! existence checks and data shaping on top.

pub mod manager;
pub mod models;
pub mod store;

pub use manager::BlobStorage;
pub use models::*;
pub use store::{AzureBlobStore, BlobStore};
