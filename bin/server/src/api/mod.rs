//! JSON API handlers.
//!
//! Every route here sits behind [`require_bearer`](crate::auth::require_bearer)
//! and is a thin layer over the [`Repository`](savannah_store::Repository).

pub mod customers;
pub mod items;
pub mod orders;

pub use customers::{create_customer, get_customer};
pub use items::get_item;
pub use orders::{create_order, get_order};

use crate::error::ApiError;
use std::str::FromStr;

/// Parses an id path segment, rejecting garbage with 400.
fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e: T::Err| ApiError::Validation(e.to_string()))
}
