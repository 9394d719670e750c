//! Authentication for the savannah server.
//!
//! This module provides:
//! - The OIDC login flow (`/login` and `/auth/callback`)
//! - Just-in-time provisioning of users on first login
//! - The bearer-token gate in front of every API route
//!
//! No server-side session exists. A successful login hands the caller the
//! provider's signed ID token, and each API request presents it again as
//! `Authorization: Bearer <id_token>`.

pub mod middleware;
pub mod oidc;
pub mod routes;

use crate::config::CookieConfig;
use crate::notify::Notifier;
use savannah_store::Repository;
use std::sync::Arc;

pub use middleware::{VerifiedCaller, require_bearer};
pub use oidc::{IdentityProvider, OidcClient, OidcError, ProviderTokens, TokenVerifier};
pub use routes::{callback, login};

/// Shared application state.
pub struct AppState {
    /// Entity storage.
    pub repo: Arc<dyn Repository>,
    /// Identity provider used for login and token verification.
    pub provider: Arc<dyn IdentityProvider>,
    /// Order confirmation sender.
    pub notifier: Arc<dyn Notifier>,
    /// Login cookie settings.
    pub cookies: CookieConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        repo: Arc<dyn Repository>,
        provider: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn Notifier>,
        cookies: CookieConfig,
    ) -> Self {
        Self {
            repo,
            provider,
            notifier,
            cookies,
        }
    }
}
