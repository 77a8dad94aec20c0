//! Customer management commands.
//!
//! # Usage
//!
//! ```bash
//! abc-cli customer add --name Ada --surname Lovelace --username ada \
//!     --email ada@example.com --address "1 Analytical Way"
//! abc-cli customer update <id> --email ada@example.org
//! abc-cli customer list
//! abc-cli customer remove <id>
//! ```

use abc_retail_core::{Customer, TableEntity};
use abc_retail_storage::StorageService;
use abc_retail_storage::resources::CUSTOMERS_TABLE;

use super::CommandResult;

/// Details for a new customer.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub shipping_address: String,
}

/// Register a customer under a fresh identity.
///
/// # Errors
///
/// Returns an error if the write fails.
pub async fn add(storage: &StorageService, details: NewCustomer) -> CommandResult<Customer> {
    let mut customer = Customer::new(
        details.name,
        details.surname,
        details.username,
        details.email,
        details.shipping_address,
    );
    storage.upsert_entity(CUSTOMERS_TABLE, &mut customer).await?;

    tracing::info!("Customer created: {} ({})", customer.username, customer.id);
    Ok(customer)
}

/// Changes to an existing customer; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub shipping_address: Option<String>,
}

/// Rewrite a customer record with the given changes.
///
/// The whole record is written back, conditional on the version read.
///
/// # Errors
///
/// Returns `StorageError::NotFound` if no such customer exists.
/// Returns `StorageError::Conflict` if the customer changed since it was read.
pub async fn update(
    storage: &StorageService,
    id: &str,
    changes: CustomerChanges,
) -> CommandResult<Customer> {
    let mut customer: Customer = storage
        .get_entity(CUSTOMERS_TABLE, Customer::PARTITION, id)
        .await?;

    let CustomerChanges {
        name,
        surname,
        username,
        email,
        shipping_address,
    } = changes;
    for (field, value) in [
        (&mut customer.name, name),
        (&mut customer.surname, surname),
        (&mut customer.username, username),
        (&mut customer.email, email),
        (&mut customer.shipping_address, shipping_address),
    ] {
        if let Some(value) = value {
            *field = value;
        }
    }
    storage.upsert_entity(CUSTOMERS_TABLE, &mut customer).await?;

    tracing::info!("Customer updated: {} ({})", customer.username, customer.id);
    Ok(customer)
}

/// List every customer.
///
/// # Errors
///
/// Returns an error if the table cannot be read.
pub async fn list(storage: &StorageService) -> CommandResult<Vec<Customer>> {
    let customers: Vec<Customer> = storage
        .list_entities(CUSTOMERS_TABLE, Some(Customer::PARTITION))
        .await?;

    tracing::info!("{} customer(s)", customers.len());
    for c in &customers {
        tracing::info!(
            "  {}  {} {} <{}>  {}",
            c.id,
            c.name,
            c.surname,
            c.email,
            c.shipping_address
        );
    }
    Ok(customers)
}

/// Remove a customer. Existing orders keep their denormalized copy.
///
/// # Errors
///
/// Returns `StorageError::NotFound` if no such customer exists.
pub async fn remove(storage: &StorageService, id: &str) -> CommandResult<()> {
    storage
        .delete_entity(CUSTOMERS_TABLE, Customer::PARTITION, id)
        .await?;
    tracing::info!("Customer removed: {id}");
    Ok(())
}
