//! Blob storage facade
//!
//! [`BlobStorage`] checks that the addressed container (and blob) exist before
//! delegating to a [`BlobStore`], so callers get a precise "does not exist"
//! error instead of a raw service failure.

use crate::blob::models::{sort_listing, BlobListItem};
use crate::blob::store::{AzureBlobStore, BlobStore};
use crate::config::StorageAccount;
use crate::error::{AzstoreError, Result};
use crate::models::{DownloadDataType, DownloadedData};
use crate::utils::helpers::require_name;
use std::sync::Arc;

/// Name-addressed operations on blob containers
#[derive(Clone)]
pub struct BlobStorage {
    store: Arc<dyn BlobStore>,
}

impl BlobStorage {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Facade over the account's blob endpoint.
    pub fn from_account(account: &StorageAccount) -> Result<Self> {
        Ok(Self::new(Arc::new(AzureBlobStore::new(account)?)))
    }

    async fn ensure_container(&self, container: &str) -> Result<()> {
        require_name("Container", container)?;
        if !self.store.container_exists(container).await? {
            return Err(AzstoreError::container_not_found(container));
        }
        Ok(())
    }

    /// Download a blob in the requested shape and convert it into `T`.
    pub async fn get_blob_information<T>(
        &self,
        container: &str,
        blob_name: &str,
        data_type: DownloadDataType,
    ) -> Result<T>
    where
        T: TryFrom<DownloadedData>,
        AzstoreError: From<T::Error>,
    {
        self.ensure_container(container).await?;
        require_name("Blob", blob_name)?;

        if !self.store.blob_exists(container, blob_name).await? {
            return Err(AzstoreError::blob_not_found(container, blob_name));
        }
        data_type.ensure_supported()?;

        let content = self.store.download(container, blob_name).await?;
        tracing::debug!("Downloaded {} bytes from {container}/{blob_name}", content.len());

        Ok(T::try_from(DownloadedData::from_content(content, data_type)?)?)
    }

    /// Upload `data` as a block blob, replacing any blob of the same name.
    pub async fn upload_blob(&self, data: Vec<u8>, container: &str, blob_name: &str) -> Result<()> {
        self.ensure_container(container).await?;
        require_name("Blob", blob_name)?;

        if self.store.blob_exists(container, blob_name).await? {
            tracing::debug!("Replacing existing blob {container}/{blob_name}");
            self.store.delete_blob(container, blob_name).await?;
        }

        self.store.upload(container, blob_name, data).await?;
        tracing::info!("Uploaded blob {container}/{blob_name}");
        Ok(())
    }

    /// Delete a blob; deleting a blob that does not exist is a no-op.
    pub async fn delete_blob(&self, container: &str, blob_name: &str) -> Result<()> {
        self.ensure_container(container).await?;
        require_name("Blob", blob_name)?;

        if !self.store.blob_exists(container, blob_name).await? {
            tracing::warn!("Blob {container}/{blob_name} does not exist, nothing to delete");
            return Ok(());
        }

        self.store.delete_blob(container, blob_name).await?;
        tracing::info!("Deleted blob {container}/{blob_name}");
        Ok(())
    }

    /// Top-level virtual directories and blobs of a container.
    pub async fn get_directory_list(&self, container: &str) -> Result<Vec<BlobListItem>> {
        self.ensure_container(container).await?;

        let mut items = self.store.list_top_level(container).await?;
        tracing::debug!("Container {container} lists {} top-level items", items.len());
        sort_listing(&mut items);
        Ok(items)
    }

    /// Create the container unless it exists. Returns whether it was created.
    pub async fn create_container(&self, container: &str) -> Result<bool> {
        require_name("Container", container)?;
        if self.store.container_exists(container).await? {
            return Ok(false);
        }

        self.store.create_container(container).await?;
        tracing::info!("Created container {container}");
        Ok(true)
    }

    /// Delete the container if it exists. Returns whether it was deleted.
    pub async fn delete_container(&self, container: &str) -> Result<bool> {
        require_name("Container", container)?;
        if !self.store.container_exists(container).await? {
            return Ok(false);
        }

        self.store.delete_container(container).await?;
        tracing::info!("Deleted container {container}");
        Ok(true)
    }
}
