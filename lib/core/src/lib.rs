//! Core domain types and utilities for the savannah order service.
//!
//! This crate provides the identifier types and error handling foundation
//! shared by the storage, identity, and server crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ItemId, OrderId, ParseIdError, UserId};
