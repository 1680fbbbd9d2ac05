//! Authorization for storage requests
//!
//! The SDK clients (blob, queue, table) take [`StorageCredentials`] and a
//! [`CloudLocation`] built from the connection string. File share REST calls
//! are signed with `reqsign`.
//!
//! [`StorageCredentials`]: azure_storage::StorageCredentials
//! [`CloudLocation`]: azure_storage::CloudLocation

pub mod credentials;
pub mod signer;

pub use credentials::{cloud_location, storage_credentials};
pub use signer::RequestSigner;
