//! Table entity types
//!
//! An entity lives in the table named by [`TableEntity::TABLE_NAME`] and is
//! addressed by its partition key and row key. Properties travel as
//! PascalCase JSON; the service-maintained `Timestamp` is read but never sent.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A row stored in table storage
pub trait TableEntity: Serialize + DeserializeOwned + Send + Sync {
    /// Table holding entities of this type
    const TABLE_NAME: &'static str;

    fn partition_key(&self) -> &str;

    fn row_key(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Merchant {
    pub partition_key: String,
    pub row_key: String,
    #[serde(default)]
    pub merchant_id: Uuid,
    #[serde(default)]
    pub domain: String,
    #[serde(default, skip_serializing)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Merchant {
    /// `identifier` becomes the partition key, `category` the row key.
    pub fn new(identifier: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            partition_key: identifier.into(),
            row_key: category.into(),
            merchant_id: Uuid::nil(),
            domain: String::new(),
            timestamp: None,
        }
    }
}

impl TableEntity for Merchant {
    const TABLE_NAME: &'static str = "Merchant";

    fn partition_key(&self) -> &str {
        &self.partition_key
    }

    fn row_key(&self) -> &str {
        &self.row_key
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Reseller {
    pub partition_key: String,
    pub row_key: String,
    #[serde(default)]
    pub reseller_id: Uuid,
    #[serde(default, skip_serializing)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Reseller {
    /// `identifier` becomes the partition key, `category` the row key.
    pub fn new(identifier: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            partition_key: identifier.into(),
            row_key: category.into(),
            reseller_id: Uuid::nil(),
            timestamp: None,
        }
    }
}

impl TableEntity for Reseller {
    const TABLE_NAME: &'static str = "Reseller";

    fn partition_key(&self) -> &str {
        &self.partition_key
    }

    fn row_key(&self) -> &str {
        &self.row_key
    }
}
