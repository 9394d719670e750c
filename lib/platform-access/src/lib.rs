//! Identity primitives for the savannah order service.
//!
//! This crate provides:
//! - OIDC provider configuration (`OidcConfig`)
//! - Verified identity claims passed to request handlers (`VerifiedClaims`)
//! - Bearer header parsing
//! - Authentication error types
//!
//! It has no network or storage dependencies. The server crate wires these
//! types to the `openidconnect` client and the storage backend.
//!
//! # Example
//!
//! ```
//! use savannah_platform_access::{OidcConfig, bearer_token};
//!
//! let config: OidcConfig = serde_json::from_str(
//!     r#"{
//!         "issuer_url": "https://accounts.google.com",
//!         "client_id": "client-id",
//!         "client_secret": "client-secret",
//!         "redirect_uri": "https://shop.example.com/auth/callback"
//!     }"#,
//! )
//! .expect("valid config");
//! assert!(config.scopes().contains(&"email"));
//!
//! let token = bearer_token(Some("Bearer eyJhbGciOi")).expect("well-formed header");
//! assert_eq!(token, "eyJhbGciOi");
//! ```

pub mod auth;
pub mod error;
pub mod oidc;

pub use auth::{BEARER_PREFIX, ProviderUserInfo, VerifiedClaims, bearer_token};
pub use error::AuthenticationError;
pub use oidc::OidcConfig;
