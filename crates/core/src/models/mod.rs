//! Stored entity kinds.
//!
//! Each kind lives in its own table under a fixed partition named after the
//! kind. Property names are PascalCase to match the table schema shared with
//! other tools reading the same storage account.

pub mod customer;
pub mod order;
pub mod product;

pub use customer::Customer;
pub use order::{Order, OrderError};
pub use product::Product;
