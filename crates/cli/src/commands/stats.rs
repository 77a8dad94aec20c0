//! Store overview: entity counts and featured products.
//!
//! # Usage
//!
//! ```bash
//! abc-cli stats
//! ```

use std::cmp::Reverse;

use abc_retail_core::{Customer, Order, Product, TableEntity};
use abc_retail_storage::StorageService;
use abc_retail_storage::resources::{CUSTOMERS_TABLE, ORDERS_TABLE, PRODUCTS_TABLE};

use super::CommandResult;

/// How many of the most expensive products are featured.
const FEATURED_PRODUCTS: usize = 5;

/// Counts and featured products across the store.
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub customer_count: usize,
    pub product_count: usize,
    pub order_count: usize,
    /// Most expensive products first.
    pub featured_products: Vec<Product>,
}

/// Gather and log store statistics.
///
/// # Errors
///
/// Returns an error if any table cannot be read.
pub async fn run(storage: &StorageService) -> CommandResult<StoreStats> {
    let customers: Vec<Customer> = storage
        .list_entities(CUSTOMERS_TABLE, Some(Customer::PARTITION))
        .await?;
    let mut products: Vec<Product> = storage
        .list_entities(PRODUCTS_TABLE, Some(Product::PARTITION))
        .await?;
    let orders: Vec<Order> = storage
        .list_entities(ORDERS_TABLE, Some(Order::PARTITION))
        .await?;

    let product_count = products.len();
    products.sort_by_key(|p| Reverse(p.price));
    products.truncate(FEATURED_PRODUCTS);

    let stats = StoreStats {
        customer_count: customers.len(),
        product_count,
        order_count: orders.len(),
        featured_products: products,
    };

    tracing::info!("Customers: {}", stats.customer_count);
    tracing::info!("Products:  {}", stats.product_count);
    tracing::info!("Orders:    {}", stats.order_count);
    tracing::info!("Featured products:");
    for p in &stats.featured_products {
        tracing::info!("  {}  {}", p.price, p.product_name);
    }

    Ok(stats)
}
