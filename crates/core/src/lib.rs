//! ABC Retail Core - Shared entity types.
//!
//! This crate provides the types shared by every ABC Retail component:
//! - `storage` - Table, blob, queue and file-share access layer
//! - `cli` - Operator tooling (provisioning, catalogue and order management)
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage clients,
//! no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, statuses and table date/times
//! - [`entity`] - The [`TableEntity`] capability every stored entity implements
//! - [`models`] - The stored entity kinds: customers, products and orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod entity;
pub mod models;
pub mod types;

pub use entity::{ETag, EntityMetadata, TableEntity};
pub use models::{Customer, Order, OrderError, Product};
pub use types::*;
