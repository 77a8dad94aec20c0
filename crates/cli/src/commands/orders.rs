//! Order commands.
//!
//! Placing an order performs three independent writes in this order: the
//! product's reduced stock, the order itself, then a notification on the
//! `orders` queue. Nothing ties them together; a failure part-way leaves the
//! earlier writes in place.
//!
//! # Usage
//!
//! ```bash
//! abc-cli order place --customer <id> --product <id> --quantity 2
//! abc-cli order place --customer <id> --product <id> --quantity 1 --date 2026-03-14T09:30:00
//! abc-cli order list
//! abc-cli order show <id>
//! abc-cli order update <id> --status completed
//! abc-cli order update <id> --quantity 3 --date 2026-03-15T10:00:00Z
//! abc-cli order remove <id>
//! ```

use abc_retail_core::{Customer, Order, OrderStatus, Product, TableDateTime, TableEntity};
use abc_retail_storage::StorageService;
use abc_retail_storage::resources::{CUSTOMERS_TABLE, ORDERS_QUEUE, ORDERS_TABLE, PRODUCTS_TABLE};

use super::{CommandError, CommandResult};

/// A request to place an order.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub customer_id: String,
    pub product_id: String,
    pub quantity: u32,
    /// Order time; `Unspecified` values are stored as UTC wall-clock time.
    pub order_date: TableDateTime,
    pub status: OrderStatus,
}

/// Place an order against current stock.
///
/// # Errors
///
/// Returns `CommandError::InvalidInput` if the quantity exceeds available stock.
/// Returns `StorageError::NotFound` if the customer or product does not exist.
/// Returns `StorageError::Conflict` if the product changed while the order was placed.
pub async fn place(storage: &StorageService, request: OrderRequest) -> CommandResult<Order> {
    let customer: Customer = storage
        .get_entity(CUSTOMERS_TABLE, Customer::PARTITION, &request.customer_id)
        .await?;
    let mut product: Product = storage
        .get_entity(PRODUCTS_TABLE, Product::PARTITION, &request.product_id)
        .await?;

    if request.quantity > product.stock_available {
        tracing::warn!(
            product = %product.id,
            requested = request.quantity,
            available = product.stock_available,
            "insufficient stock"
        );
        return Err(CommandError::InvalidInput(format!(
            "insufficient stock: {} requested, {} available",
            request.quantity, product.stock_available
        )));
    }

    let mut order = Order::new(
        &customer,
        &product,
        request.quantity,
        request.order_date,
        request.status,
    )?;

    product.stock_available -= request.quantity;
    storage.upsert_entity(PRODUCTS_TABLE, &mut product).await?;
    storage.upsert_entity(ORDERS_TABLE, &mut order).await?;
    storage
        .send_message(ORDERS_QUEUE, &format!("New order created: {}", order.id))
        .await?;

    tracing::info!(
        "Order placed: {} ({} x {} for {}, total {})",
        order.id,
        order.quantity,
        order.product_name,
        order.username,
        order.total_price
    );
    Ok(order)
}

/// List every order.
///
/// # Errors
///
/// Returns an error if the table cannot be read.
pub async fn list(storage: &StorageService) -> CommandResult<Vec<Order>> {
    let orders: Vec<Order> = storage
        .list_entities(ORDERS_TABLE, Some(Order::PARTITION))
        .await?;

    tracing::info!("{} order(s)", orders.len());
    for o in &orders {
        tracing::info!(
            "  {}  {}  {} x {}  {}  {}",
            o.id,
            o.order_date,
            o.quantity,
            o.product_name,
            o.total_price,
            o.status
        );
    }
    Ok(orders)
}

/// Show one order.
///
/// # Errors
///
/// Returns `StorageError::NotFound` if no such order exists.
pub async fn show(storage: &StorageService, id: &str) -> CommandResult<Order> {
    let order: Order = storage
        .get_entity(ORDERS_TABLE, Order::PARTITION, id)
        .await?;

    tracing::info!("Order {}", order.id);
    tracing::info!("  Customer: {} ({})", order.username, order.customer_id);
    tracing::info!("  Product:  {} ({})", order.product_name, order.product_id);
    tracing::info!("  Date:     {}", order.order_date);
    tracing::info!("  Quantity: {} at {}", order.quantity, order.unit_price);
    tracing::info!("  Total:    {}", order.total_price);
    tracing::info!("  Status:   {}", order.status);
    Ok(order)
}

/// Changes to an existing order; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct OrderChanges {
    /// New quantity; the total is recomputed from the captured unit price.
    pub quantity: Option<u32>,
    pub order_date: Option<TableDateTime>,
    pub status: Option<OrderStatus>,
}

/// Rewrite an order with the given changes.
///
/// The whole record is written back, conditional on the version read.
/// Product stock is not adjusted.
///
/// # Errors
///
/// Returns `CommandError::Order` if the new quantity is zero or the total overflows.
/// Returns `StorageError::NotFound` if no such order exists.
/// Returns `StorageError::Conflict` if the order changed since it was read.
pub async fn update(
    storage: &StorageService,
    id: &str,
    changes: OrderChanges,
) -> CommandResult<Order> {
    let mut order: Order = storage
        .get_entity(ORDERS_TABLE, Order::PARTITION, id)
        .await?;

    if let Some(quantity) = changes.quantity {
        order.set_quantity(quantity)?;
    }
    if let Some(order_date) = changes.order_date {
        order.order_date = order_date;
    }
    if let Some(status) = changes.status {
        order.status = status;
    }
    storage.upsert_entity(ORDERS_TABLE, &mut order).await?;

    tracing::info!(
        "Order updated: {} ({} x {}, total {}, {})",
        order.id,
        order.quantity,
        order.product_name,
        order.total_price,
        order.status
    );
    Ok(order)
}

/// Remove an order. Stock is not restored.
///
/// # Errors
///
/// Returns `StorageError::NotFound` if no such order exists.
pub async fn remove(storage: &StorageService, id: &str) -> CommandResult<()> {
    storage
        .delete_entity(ORDERS_TABLE, Order::PARTITION, id)
        .await?;
    tracing::info!("Order removed: {id}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use abc_retail_core::Price;
    use chrono::NaiveDate;

    use super::*;
    use crate::commands::customers::{self, NewCustomer};
    use crate::commands::products::{self, NewProduct};
    use crate::commands::provision;

    struct Fixture {
        storage: StorageService,
        customer: Customer,
        product: Product,
    }

    async fn fixture(stock: u32) -> Fixture {
        let storage = StorageService::in_memory();
        provision::run(&storage).await.unwrap();

        let customer = customers::add(
            &storage,
            NewCustomer {
                name: "Grace".into(),
                surname: "Hopper".into(),
                username: "grace".into(),
                email: "grace@example.com".into(),
                shipping_address: "Arlington".into(),
            },
        )
        .await
        .unwrap();
        let product = products::add(
            &storage,
            NewProduct {
                name: "Lamp".into(),
                description: "Desk lamp".into(),
                price: "30.00".parse().unwrap(),
                stock,
            },
            None,
        )
        .await
        .unwrap();

        Fixture {
            storage,
            customer,
            product,
        }
    }

    fn request(f: &Fixture, quantity: u32) -> OrderRequest {
        OrderRequest {
            customer_id: f.customer.id.to_string(),
            product_id: f.product.id.to_string(),
            quantity,
            order_date: TableDateTime::now(),
            status: OrderStatus::Pending,
        }
    }

    #[tokio::test]
    async fn test_place_decrements_stock_and_notifies() {
        let f = fixture(10).await;

        let order = place(&f.storage, request(&f, 3)).await.unwrap();
        assert_eq!(order.total_price, "90.00".parse::<Price>().unwrap());
        assert_eq!(order.username, "grace");

        let product: Product = f
            .storage
            .get_entity(PRODUCTS_TABLE, "Product", f.product.id.as_str())
            .await
            .unwrap();
        assert_eq!(product.stock_available, 7);

        let message = f.storage.receive_message(ORDERS_QUEUE).await.unwrap();
        assert_eq!(message, Some(format!("New order created: {}", order.id)));
    }

    #[tokio::test]
    async fn test_place_rejects_insufficient_stock() {
        let f = fixture(2).await;

        let err = place(&f.storage, request(&f, 3)).await.unwrap_err();
        assert!(err.is_invalid_input());

        assert!(list(&f.storage).await.unwrap().is_empty());
        assert_eq!(f.storage.receive_message(ORDERS_QUEUE).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_place_unknown_customer_is_not_found() {
        let f = fixture(2).await;
        let mut req = request(&f, 1);
        req.customer_id = "nobody".into();

        let err = place(&f.storage, req).await.unwrap_err();
        assert!(matches!(err, CommandError::Storage(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn test_unspecified_date_stored_as_utc() {
        let f = fixture(5).await;
        let wall_clock = NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let mut req = request(&f, 1);
        req.order_date = TableDateTime::Unspecified(wall_clock);

        let order = place(&f.storage, req).await.unwrap();
        let read = show(&f.storage, order.id.as_str()).await.unwrap();
        assert_eq!(read.order_date, TableDateTime::Utc(wall_clock.and_utc()));
    }

    #[tokio::test]
    async fn test_update_status_and_remove() {
        let f = fixture(5).await;
        let order = place(&f.storage, request(&f, 1)).await.unwrap();

        let changes = OrderChanges {
            status: Some(OrderStatus::Completed),
            ..OrderChanges::default()
        };
        let updated = update(&f.storage, order.id.as_str(), changes).await.unwrap();
        assert_eq!(updated.status, OrderStatus::Completed);
        assert_eq!(
            show(&f.storage, order.id.as_str()).await.unwrap().status,
            OrderStatus::Completed
        );

        remove(&f.storage, order.id.as_str()).await.unwrap();
        assert!(list(&f.storage).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_quantity_recomputes_total_and_keeps_stock() {
        let f = fixture(10).await;
        let order = place(&f.storage, request(&f, 2)).await.unwrap();
        let wall_clock = NaiveDate::from_ymd_opt(2026, 3, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();

        let changes = OrderChanges {
            quantity: Some(4),
            order_date: Some(TableDateTime::Unspecified(wall_clock)),
            status: None,
        };
        let updated = update(&f.storage, order.id.as_str(), changes).await.unwrap();

        assert_eq!(updated.quantity, 4);
        assert_eq!(updated.total_price, "120.00".parse::<Price>().unwrap());
        assert_eq!(updated.unit_price, order.unit_price);
        assert_eq!(updated.order_date, TableDateTime::Utc(wall_clock.and_utc()));
        let read = show(&f.storage, order.id.as_str()).await.unwrap();
        assert_eq!(read.quantity, 4);
        assert_eq!(read.total_price, updated.total_price);
        assert_eq!(read.order_date, updated.order_date);

        let product: Product = f
            .storage
            .get_entity(PRODUCTS_TABLE, Product::PARTITION, f.product.id.as_str())
            .await
            .unwrap();
        assert_eq!(product.stock_available, 8);
    }

    #[tokio::test]
    async fn test_update_zero_quantity_leaves_order_unchanged() {
        let f = fixture(5).await;
        let order = place(&f.storage, request(&f, 1)).await.unwrap();

        let changes = OrderChanges {
            quantity: Some(0),
            ..OrderChanges::default()
        };
        let err = update(&f.storage, order.id.as_str(), changes).await.unwrap_err();
        assert!(matches!(err, CommandError::Order(_)));

        let read = show(&f.storage, order.id.as_str()).await.unwrap();
        assert_eq!(read.quantity, 1);
        assert_eq!(read.total_price, order.total_price);
        assert_eq!(read.metadata.etag, order.metadata.etag);
    }
}
