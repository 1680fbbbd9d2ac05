//! Table storage facade

use crate::config::StorageAccount;
use crate::error::{AzstoreError, Result};
use crate::table::entities::TableEntity;
use crate::table::store::{AzureTableStore, TableStore};
use crate::utils::helpers::require_name;
use std::sync::Arc;

/// Name-addressed operations on tables and their entities
#[derive(Clone)]
pub struct TableStorage {
    store: Arc<dyn TableStore>,
}

impl TableStorage {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Facade over the account's table endpoint.
    pub fn from_account(account: &StorageAccount) -> Result<Self> {
        Ok(Self::new(Arc::new(AzureTableStore::new(account)?)))
    }

    async fn ensure_table(&self, table: &str) -> Result<()> {
        require_name("Table", table)?;
        if !self.store.table_exists(table).await? {
            return Err(AzstoreError::table_not_found(table));
        }
        Ok(())
    }

    /// Create the table unless it exists. Returns whether it was created.
    pub async fn create_table(&self, table: &str) -> Result<bool> {
        require_name("Table", table)?;
        if self.store.table_exists(table).await? {
            return Ok(false);
        }
        self.store.create_table(table).await?;
        tracing::info!("Created table {table}");
        Ok(true)
    }

    /// Delete the table if it exists. Returns whether it was deleted.
    pub async fn delete_table(&self, table: &str) -> Result<bool> {
        require_name("Table", table)?;
        if !self.store.table_exists(table).await? {
            return Ok(false);
        }
        self.store.delete_table(table).await?;
        tracing::info!("Deleted table {table}");
        Ok(true)
    }

    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let tables = self.store.list_tables().await?;
        tracing::debug!("Account holds {} tables", tables.len());
        Ok(tables)
    }

    /// Insert the entity into `table_name`, merging into an existing row with
    /// the same keys.
    pub async fn insert_or_update<E: TableEntity>(&self, table_name: &str, entity: &E) -> Result<()> {
        self.ensure_table(table_name).await?;

        let value = serde_json::to_value(entity)?;
        self.store
            .insert_or_merge(table_name, entity.partition_key(), entity.row_key(), value)
            .await?;

        tracing::debug!(
            "Stored entity ({}, {}) in {table_name}",
            entity.partition_key(),
            entity.row_key()
        );
        Ok(())
    }

    /// Entity of type `E` from its own table, `None` when no row has these keys.
    pub async fn get_entity<E: TableEntity>(&self, partition_key: &str, row_key: &str) -> Result<Option<E>> {
        self.ensure_table(E::TABLE_NAME).await?;

        self.store
            .get_entity(E::TABLE_NAME, partition_key, row_key)
            .await?
            .map(|value| serde_json::from_value(value).map_err(AzstoreError::from))
            .transpose()
    }

    /// Delete the entity from its own table regardless of its version.
    pub async fn delete_entity<E: TableEntity>(&self, entity: &E) -> Result<()> {
        self.ensure_table(E::TABLE_NAME).await?;

        self.store
            .delete_entity(E::TABLE_NAME, entity.partition_key(), entity.row_key())
            .await?;
        tracing::info!(
            "Deleted entity ({}, {}) from {}",
            entity.partition_key(),
            entity.row_key(),
            E::TABLE_NAME
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::entities::{Merchant, Reseller};
    use crate::table::store::MockTableStore;
    use serde_json::json;

    fn storage(store: MockTableStore) -> TableStorage {
        TableStorage::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_create_table_when_missing() {
        let mut store = MockTableStore::new();
        store.expect_table_exists().returning(|_| Ok(false));
        store
            .expect_create_table()
            .withf(|t| t == "Merchant")
            .times(1)
            .returning(|_| Ok(()));

        assert!(storage(store).create_table("Merchant").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_table_is_noop() {
        let mut store = MockTableStore::new();
        store.expect_table_exists().returning(|_| Ok(false));
        store.expect_delete_table().never();

        assert!(!storage(store).delete_table("Merchant").await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_or_update_sends_entity() {
        let mut store = MockTableStore::new();
        store.expect_table_exists().returning(|_| Ok(true));
        store
            .expect_insert_or_merge()
            .withf(|t, pk, rk, value| {
                t == "Partners"
                    && pk == "contoso"
                    && rk == "retail"
                    && value["Domain"] == "contoso.com"
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let mut merchant = Merchant::new("contoso", "retail");
        merchant.domain = "contoso.com".to_string();
        storage(store)
            .insert_or_update("Partners", &merchant)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insert_into_missing_table() {
        let mut store = MockTableStore::new();
        store.expect_table_exists().returning(|_| Ok(false));
        store.expect_insert_or_merge().never();

        let err = storage(store)
            .insert_or_update("Missing", &Merchant::new("a", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, AzstoreError::TableNotFound { ref name } if name == "Missing"));
    }

    #[tokio::test]
    async fn test_get_entity_uses_entity_table() {
        let mut store = MockTableStore::new();
        store
            .expect_table_exists()
            .withf(|t| t == "Reseller")
            .returning(|_| Ok(true));
        store
            .expect_get_entity()
            .withf(|t, pk, rk| t == "Reseller" && pk == "fabrikam" && rk == "wholesale")
            .returning(|_, _, _| {
                Ok(Some(json!({
                    "PartitionKey": "fabrikam",
                    "RowKey": "wholesale",
                    "ResellerId": "7b0b6b8e-7f4e-4c8f-9d6a-0f6f8b1f0c11"
                })))
            });

        let reseller: Reseller = storage(store)
            .get_entity("fabrikam", "wholesale")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reseller.partition_key, "fabrikam");
        assert_eq!(
            reseller.reseller_id.to_string(),
            "7b0b6b8e-7f4e-4c8f-9d6a-0f6f8b1f0c11"
        );
    }

    #[tokio::test]
    async fn test_get_absent_entity_is_none() {
        let mut store = MockTableStore::new();
        store.expect_table_exists().returning(|_| Ok(true));
        store.expect_get_entity().returning(|_, _, _| Ok(None));

        let merchant = storage(store)
            .get_entity::<Merchant>("nobody", "none")
            .await
            .unwrap();
        assert!(merchant.is_none());
    }

    #[tokio::test]
    async fn test_delete_entity() {
        let mut store = MockTableStore::new();
        store.expect_table_exists().returning(|_| Ok(true));
        store
            .expect_delete_entity()
            .withf(|t, pk, rk| t == "Merchant" && pk == "contoso" && rk == "retail")
            .times(1)
            .returning(|_, _, _| Ok(()));

        storage(store)
            .delete_entity(&Merchant::new("contoso", "retail"))
            .await
            .unwrap();
    }
}
