//! The capability shared by every stored entity kind.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Opaque version tag assigned by the backend on every write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ETag(String);

impl ETag {
    /// Wrap a version tag returned by the backend.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Get the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ETag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-assigned metadata carried alongside an entity's fields.
///
/// Never serialized with the entity; the entity store fills it on read and
/// refreshes it after every successful write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMetadata {
    /// Version tag of the stored row this entity was read from or written as.
    pub etag: Option<ETag>,
    /// Last-modified time reported by the backend.
    pub timestamp: Option<DateTime<Utc>>,
}

/// An entity that can be stored in a partitioned table.
///
/// Implementations serialize their own fields (PascalCase, identity as
/// `RowKey`); partition key and metadata are supplied through this trait.
pub trait TableEntity: Serialize + DeserializeOwned + Send + Sync {
    /// Partition shared by every row of this kind (the kind name).
    const PARTITION: &'static str;

    /// Serialized names of the properties stored as typed date/times
    /// (`Edm.DateTime`) rather than strings.
    const DATETIME_PROPERTIES: &'static [&'static str] = &[];

    /// Identity of this entity, used as its row key.
    fn row_key(&self) -> &str;

    /// Partition this entity is stored under.
    fn partition_key(&self) -> &str {
        Self::PARTITION
    }

    /// Server-assigned metadata.
    fn metadata(&self) -> &EntityMetadata;

    /// Mutable access to the server-assigned metadata.
    fn metadata_mut(&mut self) -> &mut EntityMetadata;

    /// Tag every date/time field that is not already UTC as UTC.
    ///
    /// Called by the entity store before every write. Kinds without temporal
    /// fields implement this as a no-op.
    fn normalize_temporal_fields(&mut self);
}
