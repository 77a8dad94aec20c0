//! Customer entity.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityMetadata, TableEntity};
use crate::types::CustomerId;

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    #[serde(rename = "RowKey")]
    pub id: CustomerId,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub shipping_address: String,
    #[serde(skip)]
    pub metadata: EntityMetadata,
}

impl Customer {
    /// Create a customer with a freshly generated identity.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        shipping_address: impl Into<String>,
    ) -> Self {
        Self {
            id: CustomerId::generate(),
            name: name.into(),
            surname: surname.into(),
            username: username.into(),
            email: email.into(),
            shipping_address: shipping_address.into(),
            metadata: EntityMetadata::default(),
        }
    }
}

impl TableEntity for Customer {
    const PARTITION: &'static str = "Customer";

    fn row_key(&self) -> &str {
        self.id.as_str()
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.metadata
    }

    fn normalize_temporal_fields(&mut self) {}
}
