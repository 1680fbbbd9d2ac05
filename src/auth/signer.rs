//! Request signing for the file share REST API

use crate::config::{StorageAccount, StorageCredential};
use crate::error::{AzstoreError, Result};
use reqsign::{AzureStorageConfig, AzureStorageLoader, AzureStorageSigner};
use std::fmt;

/// Signs requests with the account key, or appends the SAS token
pub struct RequestSigner {
    account: String,
    loader: AzureStorageLoader,
    signer: AzureStorageSigner,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(account: &StorageAccount) -> Self {
        let config = match &account.credential {
            StorageCredential::SharedKey { account, key } => AzureStorageConfig {
                account_name: Some(account.clone()),
                account_key: Some(key.clone()),
                ..Default::default()
            },
            StorageCredential::Sas(token) => AzureStorageConfig {
                account_name: Some(account.account_name.clone()),
                sas_token: Some(token.clone()),
                ..Default::default()
            },
        };

        Self {
            account: account.account_name.clone(),
            loader: AzureStorageLoader::new(config),
            signer: AzureStorageSigner::new(),
        }
    }

    /// Authorize the request in place. `x-ms-date` is set by the signer.
    pub async fn sign(&self, request: &mut http::Request<Vec<u8>>) -> Result<()> {
        let credential = self
            .loader
            .load()
            .await
            .map_err(|e| AzstoreError::config(format!("Failed to load storage credential: {e}")))?
            .ok_or_else(|| {
                AzstoreError::config(format!(
                    "No usable credential for storage account '{}'",
                    self.account
                ))
            })?;

        self.signer
            .sign(request, &credential)
            .map_err(|e| AzstoreError::invalid_argument(format!("Failed to sign request: {e}")))
    }
}
