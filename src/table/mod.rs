//! Azure Table Storage access through the Azure SDK

pub mod entities;
pub mod manager;
pub mod store;

pub use entities::{Merchant, Reseller, TableEntity};
pub use manager::TableStorage;
pub use store::{AzureTableStore, TableStore};
