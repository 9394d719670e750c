//! savannah order service.
//!
//! An HTTP API for customers, catalog items and orders. Callers sign in
//! through an OIDC provider and present the resulting ID token as a bearer
//! token; new orders trigger an SMS confirmation.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod notify;
