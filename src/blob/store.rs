//! Blob service access through the Azure SDK

use crate::auth::{cloud_location, storage_credentials};
use crate::blob::models::{BlobInfo, BlobListItem};
use crate::config::{StorageAccount, StorageService};
use crate::error::{AzstoreError, Result};
use crate::utils::helpers::to_utc;
use crate::utils::paging::collect_pages;
use async_trait::async_trait;
use azure_storage_blobs::prelude::*;

/// Raw blob service operations used by [`crate::blob::BlobStorage`]
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn container_exists(&self, container: &str) -> Result<bool>;

    async fn create_container(&self, container: &str) -> Result<()>;

    async fn delete_container(&self, container: &str) -> Result<()>;

    async fn blob_exists(&self, container: &str, blob: &str) -> Result<bool>;

    /// Full blob content; empty for 0-byte blobs.
    async fn download(&self, container: &str, blob: &str) -> Result<Vec<u8>>;

    /// Create or overwrite a block blob.
    async fn upload(&self, container: &str, blob: &str, data: Vec<u8>) -> Result<()>;

    async fn delete_blob(&self, container: &str, blob: &str) -> Result<()>;

    /// Virtual directories and blobs directly under the container root.
    async fn list_top_level(&self, container: &str) -> Result<Vec<BlobListItem>>;
}

/// [`BlobStore`] backed by `azure_storage_blobs`
pub struct AzureBlobStore {
    service: BlobServiceClient,
}

impl AzureBlobStore {
    pub fn new(account: &StorageAccount) -> Result<Self> {
        let credentials = storage_credentials(account)?;
        let location = cloud_location(account, StorageService::Blob)?;
        tracing::debug!("Using blob location {:?}", location);

        let service = ClientBuilder::with_location(location, credentials).blob_service_client();
        Ok(Self { service })
    }

    fn blob_client(&self, container: &str, blob: &str) -> BlobClient {
        self.service.container_client(container).blob_client(blob)
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn container_exists(&self, container: &str) -> Result<bool> {
        self.service
            .container_client(container)
            .exists()
            .await
            .map_err(|e| AzstoreError::azure_api(format!("Failed to check container '{container}': {e}")))
    }

    async fn create_container(&self, container: &str) -> Result<()> {
        self.service
            .container_client(container)
            .create()
            .await
            .map_err(|e| AzstoreError::azure_api(format!("Failed to create container '{container}': {e}")))?;
        Ok(())
    }

    async fn delete_container(&self, container: &str) -> Result<()> {
        self.service
            .container_client(container)
            .delete()
            .await
            .map_err(|e| AzstoreError::azure_api(format!("Failed to delete container '{container}': {e}")))?;
        Ok(())
    }

    async fn blob_exists(&self, container: &str, blob: &str) -> Result<bool> {
        self.blob_client(container, blob)
            .exists()
            .await
            .map_err(|e| AzstoreError::azure_api(format!("Failed to check blob '{blob}': {e}")))
    }

    async fn download(&self, container: &str, blob: &str) -> Result<Vec<u8>> {
        let blob_client = self.blob_client(container, blob);

        let properties = blob_client
            .get_properties()
            .await
            .map_err(|e| AzstoreError::azure_api(format!("Failed to read properties of '{blob}': {e}")))?;

        // get_content() answers 416 for 0-byte blobs
        if properties.blob.properties.content_length == 0 {
            return Ok(Vec::new());
        }

        blob_client
            .get_content()
            .await
            .map_err(|e| AzstoreError::azure_api(format!("Failed to download blob '{blob}': {e}")))
    }

    async fn upload(&self, container: &str, blob: &str, data: Vec<u8>) -> Result<()> {
        let length = data.len();
        self.blob_client(container, blob)
            .put_block_blob(data)
            .await
            .map_err(|e| AzstoreError::azure_api(format!("Failed to upload blob '{blob}': {e}")))?;

        tracing::debug!("Uploaded {length} bytes to {container}/{blob}");
        Ok(())
    }

    async fn delete_blob(&self, container: &str, blob: &str) -> Result<()> {
        self.blob_client(container, blob)
            .delete()
            .await
            .map_err(|e| AzstoreError::azure_api(format!("Failed to delete blob '{blob}': {e}")))?;
        Ok(())
    }

    async fn list_top_level(&self, container: &str) -> Result<Vec<BlobListItem>> {
        let pages = self
            .service
            .container_client(container)
            .list_blobs()
            .delimiter("/")
            .into_stream();

        collect_pages(pages, "blobs", |page| {
            let directories = page.blobs.prefixes().map(|prefix| BlobListItem::Directory {
                prefix: prefix.name.clone(),
            });
            let blobs = page.blobs.blobs().map(|item| {
                BlobListItem::Blob(BlobInfo {
                    name: item.name.clone(),
                    size: item.properties.content_length,
                    content_type: item.properties.content_type.clone(),
                    last_modified: to_utc(item.properties.last_modified),
                    etag: item.properties.etag.to_string(),
                })
            });
            directories.chain(blobs).collect()
        })
        .await
    }
}
