//! Entity store adapter.
//!
//! Generic CRUD over partitioned tables for every [`TableEntity`] kind.
//! Entities are serialized to a property map (PascalCase, identity as
//! `RowKey`) and the partition key is added on write. Temporal fields are
//! normalized to UTC before every write through
//! [`TableEntity::normalize_temporal_fields`].

use std::sync::Arc;

use abc_retail_core::TableEntity;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::backend::{TableBackend, TableRow};
use crate::error::{Result, StorageError};

/// Suffix of the property annotation naming a value's wire type.
const ODATA_TYPE_SUFFIX: &str = "@odata.type";
const EDM_DATETIME: &str = "Edm.DateTime";

/// Store for table entities.
#[derive(Clone)]
pub struct EntityStore {
    tables: Arc<dyn TableBackend>,
}

impl EntityStore {
    /// Create a store over a table backend.
    #[must_use]
    pub fn new(tables: Arc<dyn TableBackend>) -> Self {
        Self { tables }
    }

    /// Point lookup by (partition, row) key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no such entity exists.
    /// Returns `StorageError::DataCorruption` if the stored row does not decode as `T`.
    #[instrument(skip(self), fields(kind = T::PARTITION))]
    pub async fn get<T: TableEntity>(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<T> {
        validate_key("partition key", partition_key)?;
        validate_key("row key", row_key)?;

        let row = self.tables.get_row(table, partition_key, row_key).await?;
        entity_from_row(table, row)
    }

    /// Every entity in the table, optionally restricted to one partition.
    ///
    /// Follows continuation until the result set is exhausted; the order of
    /// the returned entities is unspecified.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::DataCorruption` if any row does not decode as `T`.
    #[instrument(skip(self), fields(kind = T::PARTITION))]
    pub async fn list<T: TableEntity>(
        &self,
        table: &str,
        partition_key: Option<&str>,
    ) -> Result<Vec<T>> {
        if let Some(pk) = partition_key {
            validate_key("partition key", pk)?;
        }

        let rows = self.tables.query_rows(table, partition_key).await?;
        let entities = rows
            .into_iter()
            .map(|row| entity_from_row(table, row))
            .collect::<Result<Vec<T>>>()?;

        debug!(count = entities.len(), "listed entities");
        Ok(entities)
    }

    /// Insert or replace an entity.
    ///
    /// Temporal fields are normalized to UTC first. If the entity carries a
    /// version tag the write is conditional on it. On success the entity's
    /// metadata holds the new version tag.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` if a key is empty or contains
    /// disallowed characters.
    /// Returns `StorageError::Conflict` if the stored version tag no longer matches.
    #[instrument(skip(self, entity), fields(kind = T::PARTITION, row_key = %entity.row_key()))]
    pub async fn upsert<T: TableEntity>(&self, table: &str, entity: &mut T) -> Result<()> {
        entity.normalize_temporal_fields();
        let row = row_from_entity(entity)?;

        let receipt = self.tables.upsert_row(table, row).await?;

        let metadata = entity.metadata_mut();
        metadata.etag = Some(receipt.etag);
        if receipt.timestamp.is_some() {
            metadata.timestamp = receipt.timestamp;
        }
        debug!("entity written");
        Ok(())
    }

    /// Remove an entity.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no such entity exists.
    #[instrument(skip(self))]
    pub async fn delete(&self, table: &str, partition_key: &str, row_key: &str) -> Result<()> {
        validate_key("partition key", partition_key)?;
        validate_key("row key", row_key)?;

        self.tables.delete_row(table, partition_key, row_key).await?;
        debug!("entity deleted");
        Ok(())
    }
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore").finish_non_exhaustive()
    }
}

/// Reject keys the table service cannot address.
fn validate_key(what: &str, key: &str) -> Result<()> {
    if key.is_empty() {
        warn!(what, "rejected empty key");
        return Err(StorageError::InvalidInput(format!("{what} must not be empty")));
    }
    if let Some(c) = key
        .chars()
        .find(|c| matches!(c, '/' | '\\' | '#' | '?') || c.is_control())
    {
        warn!(what, key, "rejected key with disallowed character");
        return Err(StorageError::InvalidInput(format!(
            "{what} contains disallowed character {c:?}"
        )));
    }
    Ok(())
}

fn row_from_entity<T: TableEntity>(entity: &T) -> Result<TableRow> {
    let partition_key = entity.partition_key().to_owned();
    let row_key = entity.row_key().to_owned();
    validate_key("partition key", &partition_key)?;
    validate_key("row key", &row_key)?;

    let Value::Object(mut properties) = serde_json::to_value(entity)
        .map_err(|e| StorageError::InvalidInput(format!("entity encoding: {e}")))?
    else {
        return Err(StorageError::InvalidInput(format!(
            "{} does not serialize to a property map",
            T::PARTITION
        )));
    };
    properties.insert("PartitionKey".to_owned(), Value::String(partition_key.clone()));
    properties.insert("RowKey".to_owned(), Value::String(row_key.clone()));
    for name in T::DATETIME_PROPERTIES {
        if matches!(properties.get(*name), Some(Value::String(_))) {
            properties.insert(
                format!("{name}{ODATA_TYPE_SUFFIX}"),
                Value::String(EDM_DATETIME.to_owned()),
            );
        }
    }

    Ok(TableRow {
        partition_key,
        row_key,
        properties,
        etag: entity.metadata().etag.clone(),
        timestamp: None,
    })
}

fn entity_from_row<T: TableEntity>(table: &str, row: TableRow) -> Result<T> {
    let TableRow {
        partition_key,
        row_key,
        mut properties,
        etag,
        timestamp,
    } = row;
    properties.remove("PartitionKey");
    properties.retain(|key, _| !key.ends_with(ODATA_TYPE_SUFFIX));

    let mut entity: T = serde_json::from_value(Value::Object(properties)).map_err(|e| {
        StorageError::DataCorruption(format!(
            "{table}/{partition_key}/{row_key} is not a valid {}: {e}",
            T::PARTITION
        ))
    })?;

    let metadata = entity.metadata_mut();
    metadata.etag = etag;
    metadata.timestamp = timestamp;
    Ok(entity)
}
