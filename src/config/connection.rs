//! Storage account connection strings
//!
//! Parses the `Key=Value;Key=Value` connection string format used by Azure
//! Storage into a [`StorageAccount`]: the account name, its credential and the
//! endpoint of every storage service.

use crate::error::{AzstoreError, Result};
use base64::Engine;
use std::collections::HashMap;
use std::fmt;
use url::Url;

/// Account name of the local storage emulator (Azurite)
pub const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";

/// Well-known shared key of the local storage emulator
pub const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Storage services reachable through one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageService {
    Blob,
    File,
    Queue,
    Table,
}

impl StorageService {
    pub fn subdomain(self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::File => "file",
            Self::Queue => "queue",
            Self::Table => "table",
        }
    }

    fn endpoint_key(self) -> &'static str {
        match self {
            Self::Blob => "blobendpoint",
            Self::File => "fileendpoint",
            Self::Queue => "queueendpoint",
            Self::Table => "tableendpoint",
        }
    }

    fn emulator_port(self) -> Option<u16> {
        match self {
            Self::Blob => Some(10000),
            Self::Queue => Some(10001),
            Self::Table => Some(10002),
            Self::File => None,
        }
    }
}

impl fmt::Display for StorageService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subdomain())
    }
}

/// Credential carried by a connection string
#[derive(Clone, PartialEq, Eq)]
pub enum StorageCredential {
    /// Account name plus the Base64 encoded account key
    SharedKey { account: String, key: String },
    /// Shared access signature query string, without the leading `?`
    Sas(String),
}

impl fmt::Debug for StorageCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SharedKey { account, .. } => f
                .debug_struct("SharedKey")
                .field("account", account)
                .field("key", &"<redacted>")
                .finish(),
            Self::Sas(_) => f.debug_tuple("Sas").field(&"<redacted>").finish(),
        }
    }
}

/// A storage account resolved from a connection string
#[derive(Debug, Clone)]
pub struct StorageAccount {
    pub account_name: String,
    pub credential: StorageCredential,
    pub use_development_storage: bool,
    blob_endpoint: Option<Url>,
    file_endpoint: Option<Url>,
    queue_endpoint: Option<Url>,
    table_endpoint: Option<Url>,
}

impl StorageAccount {
    /// Parse an Azure Storage connection string.
    pub fn parse(connection_string: &str) -> Result<Self> {
        let params = parse_connection_string(connection_string);

        if params.is_empty() {
            return Err(AzstoreError::invalid_connection_string(
                "connection string is empty",
            ));
        }

        let use_development_storage = params
            .get("usedevelopmentstorage")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if use_development_storage {
            return Self::development(&params);
        }

        let account_name = params
            .get("accountname")
            .cloned()
            .filter(|name| !name.is_empty());
        let protocol = params
            .get("defaultendpointsprotocol")
            .map(|p| p.to_lowercase())
            .unwrap_or_else(|| "https".to_string());
        if protocol != "https" && protocol != "http" {
            return Err(AzstoreError::invalid_connection_string(format!(
                "unsupported DefaultEndpointsProtocol '{protocol}'"
            )));
        }
        let suffix = params
            .get("endpointsuffix")
            .cloned()
            .unwrap_or_else(|| DEFAULT_ENDPOINT_SUFFIX.to_string());

        let credential = if let Some(key) = params.get("accountkey") {
            let account = account_name.clone().ok_or_else(|| {
                AzstoreError::invalid_connection_string("AccountKey requires AccountName")
            })?;
            validate_account_key(key)?;
            StorageCredential::SharedKey {
                account,
                key: key.clone(),
            }
        } else if let Some(sas) = params.get("sharedaccesssignature") {
            StorageCredential::Sas(sas.trim_start_matches('?').to_string())
        } else {
            return Err(AzstoreError::invalid_connection_string(
                "missing AccountKey or SharedAccessSignature",
            ));
        };

        let mut endpoints: HashMap<StorageService, Url> = HashMap::new();
        for service in [
            StorageService::Blob,
            StorageService::File,
            StorageService::Queue,
            StorageService::Table,
        ] {
            let endpoint = match params.get(service.endpoint_key()) {
                Some(explicit) => Some(parse_endpoint(explicit)?),
                None => match &account_name {
                    Some(account) => Some(parse_endpoint(&format!(
                        "{protocol}://{account}.{}.{suffix}",
                        service.subdomain()
                    ))?),
                    None => None,
                },
            };
            if let Some(endpoint) = endpoint {
                endpoints.insert(service, endpoint);
            }
        }

        if endpoints.is_empty() {
            return Err(AzstoreError::invalid_connection_string(
                "missing AccountName and no service endpoints given",
            ));
        }

        let account_name = account_name
            .or_else(|| endpoints.values().find_map(account_from_endpoint))
            .unwrap_or_default();

        Ok(Self {
            account_name,
            credential,
            use_development_storage: false,
            blob_endpoint: endpoints.remove(&StorageService::Blob),
            file_endpoint: endpoints.remove(&StorageService::File),
            queue_endpoint: endpoints.remove(&StorageService::Queue),
            table_endpoint: endpoints.remove(&StorageService::Table),
        })
    }

    fn development(params: &HashMap<String, String>) -> Result<Self> {
        let proxy = params
            .get("developmentstorageproxyuri")
            .map(|uri| parse_endpoint(uri))
            .transpose()?;

        let endpoint = |service: StorageService| -> Result<Option<Url>> {
            if let Some(explicit) = params.get(service.endpoint_key()) {
                return parse_endpoint(explicit).map(Some);
            }
            let Some(port) = service.emulator_port() else {
                return Ok(None);
            };
            let host = proxy
                .as_ref()
                .and_then(|p| p.host_str().map(str::to_string))
                .unwrap_or_else(|| "127.0.0.1".to_string());
            parse_endpoint(&format!("http://{host}:{port}/{DEV_ACCOUNT_NAME}")).map(Some)
        };

        Ok(Self {
            account_name: DEV_ACCOUNT_NAME.to_string(),
            credential: StorageCredential::SharedKey {
                account: DEV_ACCOUNT_NAME.to_string(),
                key: DEV_ACCOUNT_KEY.to_string(),
            },
            use_development_storage: true,
            blob_endpoint: endpoint(StorageService::Blob)?,
            file_endpoint: endpoint(StorageService::File)?,
            queue_endpoint: endpoint(StorageService::Queue)?,
            table_endpoint: endpoint(StorageService::Table)?,
        })
    }

    /// Endpoint of a service, if the connection string makes one reachable.
    pub fn endpoint(&self, service: StorageService) -> Option<&Url> {
        match service {
            StorageService::Blob => self.blob_endpoint.as_ref(),
            StorageService::File => self.file_endpoint.as_ref(),
            StorageService::Queue => self.queue_endpoint.as_ref(),
            StorageService::Table => self.table_endpoint.as_ref(),
        }
    }

    /// Endpoint of a service or a configuration error naming the missing service.
    pub fn require_endpoint(&self, service: StorageService) -> Result<&Url> {
        self.endpoint(service).ok_or_else(|| {
            AzstoreError::config(format!(
                "The connection string has no {service} endpoint for account '{}'",
                self.account_name
            ))
        })
    }
}

/// Parse a connection string into lower-cased keys and their values
pub fn parse_connection_string(connection_string: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for pair in connection_string.split(';') {
        // values (keys, SAS tokens) may themselves contain '='
        if let Some((key, value)) = pair.split_once('=') {
            let key = key.trim();
            if !key.is_empty() {
                params.insert(key.to_lowercase(), value.trim().to_string());
            }
        }
    }

    params
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| AzstoreError::invalid_connection_string(format!("invalid endpoint '{raw}': {e}")))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(AzstoreError::invalid_connection_string(format!(
            "invalid endpoint '{raw}'"
        )));
    }
    Ok(url)
}

fn validate_account_key(key: &str) -> Result<()> {
    base64::engine::general_purpose::STANDARD
        .decode(key)
        .map(|_| ())
        .map_err(|e| AzstoreError::invalid_connection_string(format!("AccountKey is not valid Base64: {e}")))
}

/// Pull the account name out of a `https://{account}.{service}.{suffix}` endpoint
fn account_from_endpoint(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    if host.parse::<std::net::IpAddr>().is_ok() || host == "localhost" {
        // path-style endpoint: http://127.0.0.1:10000/{account}
        return url
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
    }
    host.split('.').next().map(str::to_string)
}
