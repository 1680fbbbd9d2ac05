//! Data-shape tags shared by the blob and file facades
//!
//! Downloads are requested with a [`DownloadDataType`] and come back as
//! [`DownloadedData`], which converts into `String` or `Vec<u8>` through
//! `TryFrom`. Asking for one shape and converting into the other is an error.

use crate::error::{AzstoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shape requested when downloading a blob or file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadDataType {
    Text = 1,
    ByteArray,
    /// Not implemented; requesting it fails with `UnsupportedDataType`.
    Stream,
}

/// Shape of the payload handed to an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadDataType {
    Text = 1,
    ByteArray,
    /// Not implemented; requesting it fails with `UnsupportedDataType`.
    Stream,
}

impl FromStr for DownloadDataType {
    type Err = AzstoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "bytes" | "byte-array" | "bytearray" => Ok(Self::ByteArray),
            "stream" => Ok(Self::Stream),
            other => Err(AzstoreError::invalid_argument(format!(
                "Unknown data type '{other}'. Use text, bytes or stream"
            ))),
        }
    }
}

impl FromStr for UploadDataType {
    type Err = AzstoreError;

    fn from_str(s: &str) -> Result<Self> {
        DownloadDataType::from_str(s).map(|kind| match kind {
            DownloadDataType::Text => Self::Text,
            DownloadDataType::ByteArray => Self::ByteArray,
            DownloadDataType::Stream => Self::Stream,
        })
    }
}

impl fmt::Display for DownloadDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::ByteArray => write!(f, "bytes"),
            Self::Stream => write!(f, "stream"),
        }
    }
}

impl DownloadDataType {
    /// Fail early for shapes that have no download path.
    pub fn ensure_supported(self) -> Result<()> {
        match self {
            Self::Stream => Err(AzstoreError::UnsupportedDataType(self)),
            _ => Ok(()),
        }
    }
}

impl UploadDataType {
    /// Check a raw payload against the declared shape and hand back the bytes to send.
    pub fn prepare(self, payload: Vec<u8>) -> Result<Vec<u8>> {
        match self {
            Self::Text => {
                // text uploads must be valid UTF-8
                let text = String::from_utf8(payload)?;
                Ok(text.into_bytes())
            }
            Self::ByteArray => Ok(payload),
            Self::Stream => Err(AzstoreError::UnsupportedDataType(DownloadDataType::Stream)),
        }
    }
}

/// Downloaded content in the shape that was requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadedData {
    Text(String),
    Bytes(Vec<u8>),
}

impl DownloadedData {
    /// Shape raw content according to the requested data type.
    pub fn from_content(content: Vec<u8>, data_type: DownloadDataType) -> Result<Self> {
        match data_type {
            DownloadDataType::Text => Ok(Self::Text(String::from_utf8(content)?)),
            DownloadDataType::ByteArray => Ok(Self::Bytes(content)),
            DownloadDataType::Stream => Err(AzstoreError::UnsupportedDataType(data_type)),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Bytes(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }
}

impl TryFrom<DownloadedData> for String {
    type Error = AzstoreError;

    fn try_from(data: DownloadedData) -> Result<Self> {
        match data {
            DownloadedData::Text(text) => Ok(text),
            other => Err(AzstoreError::DataTypeMismatch {
                expected: "text",
                actual: other.kind(),
            }),
        }
    }
}

impl TryFrom<DownloadedData> for Vec<u8> {
    type Error = AzstoreError;

    fn try_from(data: DownloadedData) -> Result<Self> {
        match data {
            DownloadedData::Bytes(bytes) => Ok(bytes),
            other => Err(AzstoreError::DataTypeMismatch {
                expected: "bytes",
                actual: other.kind(),
            }),
        }
    }
}
