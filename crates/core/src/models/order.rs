//! Order entity.
//!
//! An order references a customer and a product by identity and captures a
//! denormalized copy of the customer's username and the product's name and
//! unit price at the time it is placed. Those copies are never re-synced.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityMetadata, TableEntity};
use crate::models::{Customer, Product};
use crate::types::{CustomerId, OrderId, OrderStatus, Price, ProductId, TableDateTime};

/// Errors that can occur when constructing an [`Order`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Quantity must be at least one.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// Unit price times quantity does not fit the price range.
    #[error("order total overflows ({unit_price} x {quantity})")]
    TotalOverflow { unit_price: Price, quantity: u32 },
}

fn order_total(unit_price: Price, quantity: u32) -> Result<Price, OrderError> {
    if quantity == 0 {
        return Err(OrderError::ZeroQuantity);
    }
    unit_price
        .checked_mul(quantity)
        .ok_or(OrderError::TotalOverflow {
            unit_price,
            quantity,
        })
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Order {
    #[serde(rename = "RowKey")]
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub username: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub order_date: TableDateTime,
    pub quantity: u32,
    pub unit_price: Price,
    pub total_price: Price,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(skip)]
    pub metadata: EntityMetadata,
}

impl Order {
    /// Create an order with a freshly generated identity.
    ///
    /// Captures the customer's username and the product's name and price,
    /// and computes the total as unit price × quantity.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::ZeroQuantity` if `quantity` is zero.
    /// Returns `OrderError::TotalOverflow` if the total does not fit a price.
    pub fn new(
        customer: &Customer,
        product: &Product,
        quantity: u32,
        order_date: impl Into<TableDateTime>,
        status: OrderStatus,
    ) -> Result<Self, OrderError> {
        let total_price = order_total(product.price, quantity)?;

        Ok(Self {
            id: OrderId::generate(),
            customer_id: customer.id.clone(),
            username: customer.username.clone(),
            product_id: product.id.clone(),
            product_name: product.product_name.clone(),
            order_date: order_date.into(),
            quantity,
            unit_price: product.price,
            total_price,
            status,
            metadata: EntityMetadata::default(),
        })
    }

    /// Change the quantity and recompute the total from the captured unit price.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::ZeroQuantity` or `OrderError::TotalOverflow`; the
    /// order is left unchanged on error.
    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), OrderError> {
        self.total_price = order_total(self.unit_price, quantity)?;
        self.quantity = quantity;
        Ok(())
    }
}

impl TableEntity for Order {
    const PARTITION: &'static str = "Order";
    const DATETIME_PROPERTIES: &'static [&'static str] = &["OrderDate"];

    fn row_key(&self) -> &str {
        self.id.as_str()
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.metadata
    }

    fn normalize_temporal_fields(&mut self) {
        self.order_date.normalize();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn fixtures() -> (Customer, Product) {
        let customer = Customer::new(
            "Grace",
            "Hopper",
            "ghopper",
            "grace@example.com",
            "Arlington",
        );
        let product = Product::new("Compiler", "A-0", "12.25".parse().unwrap(), 10);
        (customer, product)
    }

    #[test]
    fn test_new_captures_denormalized_fields() {
        let (customer, product) = fixtures();
        let order = Order::new(&customer, &product, 3, TableDateTime::now(), OrderStatus::default())
            .unwrap();

        assert_eq!(order.customer_id, customer.id);
        assert_eq!(order.username, "ghopper");
        assert_eq!(order.product_name, "Compiler");
        assert_eq!(order.unit_price, product.price);
        assert_eq!(order.total_price.to_string(), "36.75");
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let (customer, product) = fixtures();
        let err = Order::new(&customer, &product, 0, TableDateTime::now(), OrderStatus::Pending)
            .unwrap_err();
        assert_eq!(err, OrderError::ZeroQuantity);
    }

    #[test]
    fn test_datetime_properties_match_serialized_names() {
        let (customer, product) = fixtures();
        let order =
            Order::new(&customer, &product, 1, TableDateTime::now(), OrderStatus::Pending).unwrap();
        let value = serde_json::to_value(&order).unwrap();
        for name in Order::DATETIME_PROPERTIES {
            assert!(value.get(name).is_some_and(serde_json::Value::is_string), "{name}");
        }
    }

    #[test]
    fn test_total_overflow_rejected() {
        let (customer, _) = fixtures();
        let price = "79228162514264337593543950335".parse().unwrap();
        let product = Product::new("Yacht", "", price, 10);

        let err = Order::new(&customer, &product, 2, TableDateTime::now(), OrderStatus::Pending)
            .unwrap_err();
        assert!(matches!(err, OrderError::TotalOverflow { quantity: 2, .. }));
    }

    #[test]
    fn test_set_quantity_recomputes_total() {
        let (customer, product) = fixtures();
        let mut order =
            Order::new(&customer, &product, 1, TableDateTime::now(), OrderStatus::Pending).unwrap();

        order.set_quantity(4).unwrap();
        assert_eq!(order.quantity, 4);
        assert_eq!(order.total_price.to_string(), "49.00");

        assert_eq!(order.set_quantity(0), Err(OrderError::ZeroQuantity));
        assert_eq!(order.quantity, 4);
    }

    #[test]
    fn test_normalize_temporal_fields_tags_order_date() {
        let (customer, product) = fixtures();
        let naive = NaiveDate::from_ymd_opt(2024, 12, 24)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        let mut order = Order::new(&customer, &product, 1, naive, OrderStatus::Pending).unwrap();
        assert!(!order.order_date.is_utc());

        order.normalize_temporal_fields();

        assert_eq!(order.order_date, TableDateTime::Utc(naive.and_utc()));
    }
}
