//! Table access through the Azure SDK

use crate::auth::{cloud_location, storage_credentials};
use crate::config::{StorageAccount, StorageService};
use crate::error::{sdk_status, AzstoreError, Result};
use crate::utils::paging::collect_pages;
use async_trait::async_trait;
use azure_core::StatusCode;
use azure_data_tables::prelude::*;
use azure_data_tables::clients::TableServiceClientBuilder;
use azure_data_tables::IfMatchCondition;
use serde_json::Value;

/// Raw table operations used by [`crate::table::TableStorage`]
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn table_exists(&self, table: &str) -> Result<bool>;

    async fn create_table(&self, table: &str) -> Result<()>;

    async fn delete_table(&self, table: &str) -> Result<()>;

    /// Every table name in the account.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Insert the entity or merge it into the existing one.
    async fn insert_or_merge(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
        entity: Value,
    ) -> Result<()>;

    async fn get_entity(&self, table: &str, partition_key: &str, row_key: &str) -> Result<Option<Value>>;

    /// Unconditional delete.
    async fn delete_entity(&self, table: &str, partition_key: &str, row_key: &str) -> Result<()>;
}

/// [`TableStore`] backed by `azure_data_tables`
pub struct AzureTableStore {
    service: TableServiceClient,
}

impl AzureTableStore {
    pub fn new(account: &StorageAccount) -> Result<Self> {
        let credentials = storage_credentials(account)?;
        let location = cloud_location(account, StorageService::Table)?;
        tracing::debug!("Using table location {:?}", location);

        let service = TableServiceClientBuilder::with_location(location, credentials).build();
        Ok(Self { service })
    }

    fn entity_client(&self, table: &str, partition_key: &str, row_key: &str) -> EntityClient {
        self.service
            .table_client(table)
            .partition_key_client(partition_key)
            .entity_client(row_key)
    }
}

#[async_trait]
impl TableStore for AzureTableStore {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        // table names are case-insensitive
        let tables = self.list_tables().await?;
        Ok(tables.iter().any(|name| name.eq_ignore_ascii_case(table)))
    }

    async fn create_table(&self, table: &str) -> Result<()> {
        match self.service.table_client(table).create().await {
            Ok(_) => Ok(()),
            Err(e) if sdk_status(&e) == Some(StatusCode::Conflict) => {
                tracing::debug!("Table {table} already exists");
                Ok(())
            }
            Err(e) => Err(AzstoreError::azure_api(format!(
                "Failed to create table '{table}': {e}"
            ))),
        }
    }

    async fn delete_table(&self, table: &str) -> Result<()> {
        match self.service.table_client(table).delete().await {
            Ok(_) => Ok(()),
            Err(e) if sdk_status(&e) == Some(StatusCode::NotFound) => Ok(()),
            Err(e) => Err(AzstoreError::azure_api(format!(
                "Failed to delete table '{table}': {e}"
            ))),
        }
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let pages = self.service.list().into_stream();
        collect_pages(pages, "tables", |page| {
            page.tables.into_iter().map(|table| table.name).collect()
        })
        .await
    }

    async fn insert_or_merge(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
        entity: Value,
    ) -> Result<()> {
        self.entity_client(table, partition_key, row_key)
            .insert_or_merge(&entity)?
            .await
            .map_err(|e| {
                AzstoreError::azure_api(format!(
                    "Failed to store entity ({partition_key}, {row_key}) in '{table}': {e}"
                ))
            })?;
        Ok(())
    }

    async fn get_entity(&self, table: &str, partition_key: &str, row_key: &str) -> Result<Option<Value>> {
        match self
            .entity_client(table, partition_key, row_key)
            .get::<Value>()
            .await
        {
            Ok(response) => Ok(Some(response.entity)),
            Err(e) if sdk_status(&e) == Some(StatusCode::NotFound) => Ok(None),
            Err(e) => Err(AzstoreError::azure_api(format!(
                "Failed to read entity ({partition_key}, {row_key}) from '{table}': {e}"
            ))),
        }
    }

    async fn delete_entity(&self, table: &str, partition_key: &str, row_key: &str) -> Result<()> {
        self.entity_client(table, partition_key, row_key)
            .delete()
            .if_match(IfMatchCondition::Any)
            .await
            .map_err(|e| {
                AzstoreError::azure_api(format!(
                    "Failed to delete entity ({partition_key}, {row_key}) from '{table}': {e}"
                ))
            })?;
        Ok(())
    }
}
