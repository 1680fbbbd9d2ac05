//! File share facade

use crate::config::StorageAccount;
use crate::error::{AzstoreError, Result};
use crate::file::models::FileListItem;
use crate::file::store::{AzureFileShareStore, FileShareStore};
use crate::models::{DownloadDataType, DownloadedData};
use crate::utils::helpers::{join_path, normalize_directory, require_name};
use reqwest::Client;
use std::sync::Arc;

/// Largest range accepted by a single `Put Range` call
pub const MAX_RANGE_SIZE: usize = 4 * 1024 * 1024;

/// Name-addressed operations on file shares
#[derive(Clone)]
pub struct FileStorage {
    store: Arc<dyn FileShareStore>,
}

impl FileStorage {
    pub fn new(store: Arc<dyn FileShareStore>) -> Self {
        Self { store }
    }

    /// Facade over the account's file endpoint.
    pub fn from_account(account: &StorageAccount, http: Client) -> Result<Self> {
        Ok(Self::new(Arc::new(AzureFileShareStore::new(account, http)?)))
    }

    /// Share then directory must exist. Returns the normalized directory.
    async fn ensure_directory<'a>(&self, share: &str, directory: &'a str) -> Result<&'a str> {
        require_name("Share", share)?;
        if !self.store.share_exists(share).await? {
            return Err(AzstoreError::share_not_found(share));
        }

        let directory = normalize_directory(directory);
        if !self.store.directory_exists(share, directory).await? {
            return Err(AzstoreError::directory_not_found(share, directory));
        }
        Ok(directory)
    }

    /// Download a file in the requested shape and convert it into `T`.
    pub async fn get_file_information<T>(
        &self,
        share: &str,
        directory: &str,
        file_name: &str,
        data_type: DownloadDataType,
    ) -> Result<T>
    where
        T: TryFrom<DownloadedData>,
        AzstoreError: From<T::Error>,
    {
        let directory = self.ensure_directory(share, directory).await?;
        require_name("File", file_name)?;

        let path = join_path(directory, file_name);
        if !self.store.file_exists(share, &path).await? {
            return Err(AzstoreError::file_not_found(share, path.as_str()));
        }
        data_type.ensure_supported()?;

        let content = self.store.download(share, &path).await?;
        tracing::debug!("Downloaded {} bytes from {share}/{path}", content.len());

        Ok(T::try_from(DownloadedData::from_content(content, data_type)?)?)
    }

    /// Upload `data`, replacing any file of the same name. The file is
    /// created with its final length and then written range by range.
    pub async fn upload_file(
        &self,
        data: Vec<u8>,
        share: &str,
        directory: &str,
        file_name: &str,
    ) -> Result<()> {
        let directory = self.ensure_directory(share, directory).await?;
        require_name("File", file_name)?;

        let path = join_path(directory, file_name);
        if self.store.file_exists(share, &path).await? {
            tracing::debug!("Replacing existing file {share}/{path}");
            self.store.delete_file(share, &path).await?;
        }

        self.store.create_file(share, &path, data.len() as u64).await?;

        let mut offset = 0u64;
        for chunk in data.chunks(MAX_RANGE_SIZE) {
            self.store
                .write_range(share, &path, offset, chunk.to_vec())
                .await?;
            offset += chunk.len() as u64;
        }

        tracing::info!("Uploaded file {share}/{path} ({offset} bytes)");
        Ok(())
    }

    /// Delete a file; deleting a file that does not exist is a no-op.
    pub async fn delete_file(&self, share: &str, directory: &str, file_name: &str) -> Result<()> {
        let directory = self.ensure_directory(share, directory).await?;
        require_name("File", file_name)?;

        let path = join_path(directory, file_name);
        if !self.store.file_exists(share, &path).await? {
            tracing::warn!("File {share}/{path} does not exist, nothing to delete");
            return Ok(());
        }

        self.store.delete_file(share, &path).await?;
        tracing::info!("Deleted file {share}/{path}");
        Ok(())
    }

    /// Files and sub-directories directly under `directory`.
    pub async fn get_directory_list(&self, share: &str, directory: &str) -> Result<Vec<FileListItem>> {
        let directory = self.ensure_directory(share, directory).await?;
        let items = self.store.list_directory(share, directory).await?;
        tracing::debug!("{share}/{directory} holds {} entries", items.len());
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::store::MockFileShareStore;
    use mockall::Sequence;

    fn storage(store: MockFileShareStore) -> FileStorage {
        FileStorage::new(Arc::new(store))
    }

    fn existing_share_and_directory(store: &mut MockFileShareStore) {
        store
            .expect_share_exists()
            .withf(|s| s == "docs")
            .returning(|_| Ok(true));
        store.expect_directory_exists().returning(|_, _| Ok(true));
    }

    #[tokio::test]
    async fn test_download_text_from_subdirectory() {
        let mut store = MockFileShareStore::new();
        existing_share_and_directory(&mut store);
        store
            .expect_file_exists()
            .withf(|s, p| s == "docs" && p == "reports/q1.csv")
            .returning(|_, _| Ok(true));
        store
            .expect_download()
            .withf(|_, p| p == "reports/q1.csv")
            .returning(|_, _| Ok(b"a,b\n1,2".to_vec()));

        let text: String = storage(store)
            .get_file_information("docs", "/reports/", "q1.csv", DownloadDataType::Text)
            .await
            .unwrap();
        assert_eq!(text, "a,b\n1,2");
    }

    #[tokio::test]
    async fn test_missing_share() {
        let mut store = MockFileShareStore::new();
        store.expect_share_exists().returning(|_| Ok(false));
        store.expect_directory_exists().never();

        let err = storage(store)
            .upload_file(vec![1], "nope", "", "a.bin")
            .await
            .unwrap_err();
        assert!(matches!(err, AzstoreError::ShareNotFound { ref name } if name == "nope"));
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let mut store = MockFileShareStore::new();
        store.expect_share_exists().returning(|_| Ok(true));
        store.expect_directory_exists().returning(|_, _| Ok(false));

        let err = storage(store)
            .get_directory_list("docs", "missing/")
            .await
            .unwrap_err();
        assert!(
            matches!(err, AzstoreError::DirectoryNotFound { ref path, .. } if path == "missing")
        );
    }

    #[tokio::test]
    async fn test_missing_file() {
        let mut store = MockFileShareStore::new();
        existing_share_and_directory(&mut store);
        store.expect_file_exists().returning(|_, _| Ok(false));
        store.expect_download().never();

        let err = storage(store)
            .get_file_information::<Vec<u8>>("docs", "", "gone.bin", DownloadDataType::ByteArray)
            .await
            .unwrap_err();
        assert!(matches!(err, AzstoreError::FileNotFound { ref path, .. } if path == "gone.bin"));
    }

    #[tokio::test]
    async fn test_upload_writes_in_ranges() {
        let mut store = MockFileShareStore::new();
        let mut seq = Sequence::new();
        existing_share_and_directory(&mut store);
        store.expect_file_exists().returning(|_, _| Ok(true));
        store
            .expect_delete_file()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        store
            .expect_create_file()
            .withf(|_, p, len| p == "big.bin" && *len == (MAX_RANGE_SIZE + 10) as u64)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        store
            .expect_write_range()
            .withf(|_, _, offset, data| *offset == 0 && data.len() == MAX_RANGE_SIZE)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(()));
        store
            .expect_write_range()
            .withf(|_, _, offset, data| *offset == MAX_RANGE_SIZE as u64 && data.len() == 10)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(()));

        storage(store)
            .upload_file(vec![7u8; MAX_RANGE_SIZE + 10], "docs", "", "big.bin")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upload_empty_file_creates_without_ranges() {
        let mut store = MockFileShareStore::new();
        existing_share_and_directory(&mut store);
        store.expect_file_exists().returning(|_, _| Ok(false));
        store.expect_delete_file().never();
        store
            .expect_create_file()
            .withf(|_, _, len| *len == 0)
            .times(1)
            .returning(|_, _, _| Ok(()));
        store.expect_write_range().never();

        storage(store)
            .upload_file(Vec::new(), "docs", "", "empty.txt")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_absent_file_is_noop() {
        let mut store = MockFileShareStore::new();
        existing_share_and_directory(&mut store);
        store.expect_file_exists().returning(|_, _| Ok(false));
        store.expect_delete_file().never();

        storage(store).delete_file("docs", "", "gone.txt").await.unwrap();
    }

    #[tokio::test]
    async fn test_directory_list_passes_normalized_path() {
        let mut store = MockFileShareStore::new();
        existing_share_and_directory(&mut store);
        store
            .expect_list_directory()
            .withf(|s, d| s == "docs" && d == "reports/2024")
            .returning(|_, _| {
                Ok(vec![FileListItem::File {
                    name: "q1.csv".to_string(),
                    size: 7,
                }])
            });

        let items = storage(store)
            .get_directory_list("docs", "/reports/2024/")
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name(), "q1.csv");
    }
}
