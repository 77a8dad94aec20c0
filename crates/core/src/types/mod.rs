//! Core types for ABC Retail.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod datetime;
pub mod id;
pub mod price;
pub mod status;

pub use datetime::TableDateTime;
pub use id::*;
pub use price::{Price, PriceError};
pub use status::OrderStatus;
