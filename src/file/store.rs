//! File share access over the Azure Files REST API, signed with `reqsign`

use crate::config::{StorageAccount, StorageService};
use crate::error::{AzstoreError, Result};
use crate::file::models::{parse_listing_page, FileListItem};
use crate::utils::helpers::path_segments;
use crate::utils::network::ServiceClient;
use crate::utils::paging::collect_marked_pages;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use url::Url;

const X_MS_TYPE: &str = "x-ms-type";
const X_MS_CONTENT_LENGTH: &str = "x-ms-content-length";
const X_MS_WRITE: &str = "x-ms-write";
const X_MS_RANGE: &str = "x-ms-range";

/// Raw file share operations used by [`crate::file::FileStorage`].
///
/// `directory` and `path` are `/` separated and relative to the share root;
/// an empty directory is the root itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileShareStore: Send + Sync {
    async fn share_exists(&self, share: &str) -> Result<bool>;

    async fn directory_exists(&self, share: &str, directory: &str) -> Result<bool>;

    async fn file_exists(&self, share: &str, path: &str) -> Result<bool>;

    async fn download(&self, share: &str, path: &str) -> Result<Vec<u8>>;

    /// Create an empty file of the given length, replacing nothing.
    async fn create_file(&self, share: &str, path: &str, length: u64) -> Result<()>;

    /// Write `data` at `offset`; at most 4 MiB per call.
    async fn write_range(&self, share: &str, path: &str, offset: u64, data: Vec<u8>) -> Result<()>;

    async fn delete_file(&self, share: &str, path: &str) -> Result<()>;

    /// All entries of a directory, across continuation markers.
    async fn list_directory(&self, share: &str, directory: &str) -> Result<Vec<FileListItem>>;
}

/// [`FileShareStore`] speaking the REST protocol
#[derive(Debug, Clone)]
pub struct AzureFileShareStore {
    client: ServiceClient,
}

impl AzureFileShareStore {
    pub fn new(account: &StorageAccount, http: Client) -> Result<Self> {
        Ok(Self {
            client: ServiceClient::new(account, StorageService::File, http)?,
        })
    }

    fn resource_url(&self, share: &str, path: &str) -> Result<Url> {
        let segments: Vec<&str> = std::iter::once(share).chain(path_segments(path)).collect();
        self.client.url(&segments)
    }

    fn with_query(mut url: Url, pairs: &[(&str, &str)]) -> Url {
        url.query_pairs_mut().extend_pairs(pairs);
        url
    }
}

fn header_value(value: impl ToString) -> Result<HeaderValue> {
    HeaderValue::from_str(&value.to_string())
        .map_err(|e| AzstoreError::invalid_argument(format!("Invalid header value: {e}")))
}

#[async_trait]
impl FileShareStore for AzureFileShareStore {
    async fn share_exists(&self, share: &str) -> Result<bool> {
        let url = Self::with_query(self.client.url(&[share])?, &[("restype", "share")]);
        self.client.exists(Method::HEAD, url, HeaderMap::new()).await
    }

    async fn directory_exists(&self, share: &str, directory: &str) -> Result<bool> {
        if path_segments(directory).next().is_none() {
            return Ok(true);
        }
        let url = Self::with_query(
            self.resource_url(share, directory)?,
            &[("restype", "directory")],
        );
        self.client.exists(Method::HEAD, url, HeaderMap::new()).await
    }

    async fn file_exists(&self, share: &str, path: &str) -> Result<bool> {
        let url = self.resource_url(share, path)?;
        self.client.exists(Method::HEAD, url, HeaderMap::new()).await
    }

    async fn download(&self, share: &str, path: &str) -> Result<Vec<u8>> {
        let url = self.resource_url(share, path)?;
        let response = self
            .client
            .send_checked(Method::GET, url, HeaderMap::new(), None)
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn create_file(&self, share: &str, path: &str, length: u64) -> Result<()> {
        let url = self.resource_url(share, path)?;
        let mut headers = HeaderMap::new();
        headers.insert(X_MS_TYPE, HeaderValue::from_static("file"));
        headers.insert(X_MS_CONTENT_LENGTH, header_value(length)?);

        self.client
            .send_checked(Method::PUT, url, headers, Some(Vec::new()))
            .await?;
        tracing::debug!("Created {share}/{path} with length {length}");
        Ok(())
    }

    async fn write_range(&self, share: &str, path: &str, offset: u64, data: Vec<u8>) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let url = Self::with_query(self.resource_url(share, path)?, &[("comp", "range")]);
        let end = offset + data.len() as u64 - 1;

        let mut headers = HeaderMap::new();
        headers.insert(X_MS_WRITE, HeaderValue::from_static("update"));
        headers.insert(X_MS_RANGE, header_value(format!("bytes={offset}-{end}"))?);

        self.client
            .send_checked(Method::PUT, url, headers, Some(data))
            .await?;
        tracing::trace!("Wrote range {offset}-{end} of {share}/{path}");
        Ok(())
    }

    async fn delete_file(&self, share: &str, path: &str) -> Result<()> {
        let url = self.resource_url(share, path)?;
        self.client
            .send_checked(Method::DELETE, url, HeaderMap::new(), None)
            .await?;
        Ok(())
    }

    async fn list_directory(&self, share: &str, directory: &str) -> Result<Vec<FileListItem>> {
        let base = Self::with_query(
            self.resource_url(share, directory)?,
            &[("restype", "directory"), ("comp", "list")],
        );

        collect_marked_pages(|marker: Option<String>| {
            let url = match &marker {
                Some(marker) => Self::with_query(base.clone(), &[("marker", marker.as_str())]),
                None => base.clone(),
            };
            async move {
                let body = self
                    .client
                    .send_checked(Method::GET, url, HeaderMap::new(), None)
                    .await?
                    .text()
                    .await?;
                parse_listing_page(&body)
            }
        })
        .await
    }
}
