//! Product entity.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityMetadata, TableEntity};
use crate::types::{Price, ProductId};

/// A catalogue product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Product {
    #[serde(rename = "RowKey")]
    pub id: ProductId,
    pub product_name: String,
    pub description: String,
    pub price: Price,
    pub stock_available: u32,
    /// URL of the product image, or empty when none was uploaded.
    #[serde(default)]
    pub image_url: String,
    #[serde(skip)]
    pub metadata: EntityMetadata,
}

impl Product {
    /// Create a product with a freshly generated identity and no image.
    #[must_use]
    pub fn new(
        product_name: impl Into<String>,
        description: impl Into<String>,
        price: Price,
        stock_available: u32,
    ) -> Self {
        Self {
            id: ProductId::generate(),
            product_name: product_name.into(),
            description: description.into(),
            price,
            stock_available,
            image_url: String::new(),
            metadata: EntityMetadata::default(),
        }
    }
}

impl TableEntity for Product {
    const PARTITION: &'static str = "Product";

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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_stored_as_string() {
        let product = Product::new("Mug", "Ceramic", "7.50".parse().unwrap(), 12);
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["Price"], "7.50");
        assert_eq!(value["StockAvailable"], 12);
        assert_eq!(value["ImageUrl"], "");
    }

    #[test]
    fn test_negative_stock_rejected_on_read() {
        let json = serde_json::json!({
            "RowKey": "p1",
            "ProductName": "Mug",
            "Description": "",
            "Price": "1.00",
            "StockAvailable": -1,
        });
        assert!(serde_json::from_value::<Product>(json).is_err());
    }
}
