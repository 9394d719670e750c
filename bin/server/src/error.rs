//! Error types for server operations.
//!
//! [`ApiError`] is what handlers return; it maps each failure onto an HTTP
//! status and a generic JSON body, logging the detail on the way out.
//! [`StartupError`] covers bootstrap in `main` and travels in a rootcause
//! `Report`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use savannah_platform_access::AuthenticationError;
use savannah_store::StoreError;
use serde_json::json;
use std::fmt;

use crate::auth::oidc::OidcError;
use crate::notify::NotifyError;

/// Request-level failures.
#[derive(Debug)]
pub enum ApiError {
    /// Bad body, bad id or a non-positive quantity.
    Validation(String),
    /// The login callback did not match a login attempt.
    Csrf(String),
    /// Missing or invalid credentials.
    Authentication(String),
    NotFound(String),
    Conflict(String),
    /// The identity provider failed or rejected the exchange.
    Upstream(String),
    /// The storage backend failed.
    Storage(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Csrf(_) => StatusCode::BAD_REQUEST,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream(_) | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "validation failed: {msg}"),
            Self::Csrf(msg) => write!(f, "login state check failed: {msg}"),
            Self::Authentication(msg) => write!(f, "authentication failed: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Conflict(msg) => write!(f, "conflict: {msg}"),
            Self::Upstream(msg) => write!(f, "identity provider error: {msg}"),
            Self::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Validation detail describes the caller's own input.
            Self::Validation(msg) => {
                tracing::debug!("Rejected request: {}", msg);
                msg.as_str()
            }
            Self::Csrf(msg) => {
                tracing::warn!("Login state check failed: {}", msg);
                "invalid login state"
            }
            Self::Authentication(msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                "unauthorized"
            }
            Self::NotFound(msg) => {
                tracing::debug!("Not found: {}", msg);
                "not found"
            }
            Self::Conflict(msg) => {
                tracing::debug!("Conflict: {}", msg);
                "already exists"
            }
            Self::Upstream(msg) => {
                tracing::error!("Identity provider error: {}", msg);
                "authentication failed"
            }
            Self::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                "internal server error"
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::Conflict { .. } => Self::Conflict(err.to_string()),
            StoreError::Invalid { details, .. } => Self::Validation(details),
            StoreError::Io { .. } => Self::Storage(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<AuthenticationError> for ApiError {
    fn from(err: AuthenticationError) -> Self {
        Self::Authentication(err.to_string())
    }
}

impl From<OidcError> for ApiError {
    fn from(err: OidcError) -> Self {
        Self::Upstream(err.to_string())
    }
}

/// Failures that stop the server from starting or running.
#[derive(Debug)]
pub enum StartupError {
    /// Configuration is missing or malformed.
    Configuration { details: String },
    /// The database could not be reached or migrated.
    Database { details: String },
    /// Identity provider discovery failed.
    Discovery { details: String },
    /// The SMS client could not be built.
    Notifier { details: String },
    /// The listener could not be bound or the server loop failed.
    Serve { details: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { details } => write!(f, "invalid configuration: {details}"),
            Self::Database { details } => write!(f, "database unavailable: {details}"),
            Self::Discovery { details } => {
                write!(f, "identity provider discovery failed: {details}")
            }
            Self::Notifier { details } => write!(f, "notifier setup failed: {details}"),
            Self::Serve { details } => write!(f, "server error: {details}"),
        }
    }
}

impl std::error::Error for StartupError {}

impl From<NotifyError> for StartupError {
    fn from(err: NotifyError) -> Self {
        Self::Notifier {
            details: err.to_string(),
        }
    }
}
