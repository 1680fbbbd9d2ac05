use crate::models::DownloadDataType;
use thiserror::Error;

/// Main error type for azstore operations
#[derive(Debug, Error)]
pub enum AzstoreError {
    #[error("Blob container does not exist: {name}")]
    ContainerNotFound { name: String },

    #[error("Blob does not exist: {container}/{name}")]
    BlobNotFound { container: String, name: String },

    #[error("File share does not exist: {name}")]
    ShareNotFound { name: String },

    #[error("Directory entry does not exist: {share}/{path}")]
    DirectoryNotFound { share: String, path: String },

    #[error("File does not exist: {share}/{path}")]
    FileNotFound { share: String, path: String },

    #[error("Queue does not exist: {name}")]
    QueueNotFound { name: String },

    #[error("Table does not exist: {name}")]
    TableNotFound { name: String },

    #[error("Data type {0:?} is not supported")]
    UnsupportedDataType(DownloadDataType),

    #[error("Downloaded data is {actual}, expected {expected}")]
    DataTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Azure API error: {0}")]
    AzureApiError(String),

    #[error("Storage service returned HTTP {status}{}: {message}", code_suffix(.code))]
    ServiceError {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Configuration loading error: {0}")]
    ConfigLoadError(#[from] ::config::ConfigError),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::DeError),

    #[error("Content is not valid UTF-8: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("Base64 decoding error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl AzstoreError {
    pub fn container_not_found<S: Into<String>>(name: S) -> Self {
        Self::ContainerNotFound { name: name.into() }
    }

    pub fn blob_not_found<S: Into<String>>(container: S, name: S) -> Self {
        Self::BlobNotFound {
            container: container.into(),
            name: name.into(),
        }
    }

    pub fn share_not_found<S: Into<String>>(name: S) -> Self {
        Self::ShareNotFound { name: name.into() }
    }

    pub fn directory_not_found<S: Into<String>>(share: S, path: S) -> Self {
        Self::DirectoryNotFound {
            share: share.into(),
            path: path.into(),
        }
    }

    pub fn file_not_found<S: Into<String>>(share: S, path: S) -> Self {
        Self::FileNotFound {
            share: share.into(),
            path: path.into(),
        }
    }

    pub fn queue_not_found<S: Into<String>>(name: S) -> Self {
        Self::QueueNotFound { name: name.into() }
    }

    pub fn table_not_found<S: Into<String>>(name: S) -> Self {
        Self::TableNotFound { name: name.into() }
    }

    pub fn azure_api<S: Into<String>>(msg: S) -> Self {
        Self::AzureApiError(msg.into())
    }

    pub fn invalid_connection_string<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConnectionString(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::NetworkError(msg.into())
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// True for the "resource does not exist" family raised before delegating.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ContainerNotFound { .. }
                | Self::BlobNotFound { .. }
                | Self::ShareNotFound { .. }
                | Self::DirectoryNotFound { .. }
                | Self::FileNotFound { .. }
                | Self::QueueNotFound { .. }
                | Self::TableNotFound { .. }
        ) || matches!(self, Self::ServiceError { status: 404, .. })
    }
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref()
        .map(|c| format!(" ({c})"))
        .unwrap_or_default()
}

/// Result type alias for azstore operations
pub type Result<T> = std::result::Result<T, AzstoreError>;

/// Convert Azure Core errors to AzstoreError
impl From<azure_core::Error> for AzstoreError {
    fn from(error: azure_core::Error) -> Self {
        Self::AzureApiError(error.to_string())
    }
}

/// HTTP status of a failed SDK call, when the service answered at all.
pub(crate) fn sdk_status(error: &azure_core::Error) -> Option<azure_core::StatusCode> {
    match error.kind() {
        azure_core::error::ErrorKind::HttpResponse { status, .. } => Some(*status),
        _ => None,
    }
}

/// Lets the identity conversion of downloaded data share the download path
impl From<std::convert::Infallible> for AzstoreError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}
