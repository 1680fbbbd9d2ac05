//! SDK credentials and locations for a storage account

use crate::config::{StorageAccount, StorageCredential, StorageService};
use crate::error::Result;
use azure_storage::{CloudLocation, StorageCredentials};

/// Credentials for the `azure_storage_*` clients.
pub fn storage_credentials(account: &StorageAccount) -> Result<StorageCredentials> {
    let credentials = match &account.credential {
        StorageCredential::SharedKey { account, key } => {
            StorageCredentials::access_key(account.clone(), key.clone())
        }
        StorageCredential::Sas(token) => StorageCredentials::sas_token(token.as_str())?,
    };
    Ok(credentials)
}

/// Map the account's endpoint for `service` onto the SDK's location model.
///
/// Loopback hosts are the emulator, `{account}.{service}.core.windows.net` is
/// the public cloud, anything else is passed through as a custom base URL.
pub fn cloud_location(account: &StorageAccount, service: StorageService) -> Result<CloudLocation> {
    let endpoint = account.require_endpoint(service)?;
    let host = endpoint.host_str().unwrap_or_default();

    if host == "127.0.0.1" || host == "localhost" {
        return Ok(CloudLocation::Emulator {
            address: host.to_string(),
            port: endpoint.port_or_known_default().unwrap_or(80),
        });
    }

    let name = &account.account_name;
    if host == format!("{name}.{}.core.windows.net", service.subdomain()) {
        return Ok(CloudLocation::Public {
            account: name.clone(),
        });
    }

    Ok(CloudLocation::Custom {
        account: name.clone(),
        uri: endpoint.as_str().trim_end_matches('/').to_string(),
    })
}
