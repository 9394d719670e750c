//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.
//!
//! See [`OidcConfig`](savannah_platform_access::OidcConfig) for
//! identity provider configuration.

use savannah_platform_access::OidcConfig;
use serde::Deserialize;
use std::time::Duration;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL connection URL. Without it the server keeps everything in
    /// memory.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Maximum connections held by the database pool.
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,

    /// Socket address to listen on.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Seconds to wait for in-flight requests after a shutdown signal.
    #[serde(default = "default_shutdown_grace_seconds")]
    pub shutdown_grace_seconds: u64,

    /// OIDC authentication configuration.
    pub oidc: OidcConfig,

    /// Login cookie configuration.
    #[serde(default)]
    pub cookies: CookieConfig,

    /// SMS gateway configuration.
    #[serde(default)]
    pub sms: SmsConfig,
}

fn default_database_max_connections() -> u32 {
    35
}

fn default_listen_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_shutdown_grace_seconds() -> u64 {
    15
}

/// Settings for the short-lived `state` and `nonce` login cookies.
#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure: bool,

    /// Lifetime of a login attempt, in seconds.
    #[serde(default = "default_cookie_max_age_seconds")]
    pub max_age_seconds: i64,
}

fn default_secure_cookies() -> bool {
    true
}

fn default_cookie_max_age_seconds() -> i64 {
    3600
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            secure: default_secure_cookies(),
            max_age_seconds: default_cookie_max_age_seconds(),
        }
    }
}

/// Africa's Talking SMS gateway settings.
///
/// Notifications are disabled unless both `username` and `api_key` are set.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Gateway base URL, overriding the host picked from the username.
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_sms_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_sms_timeout_seconds() -> u64 {
    10
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            username: None,
            api_key: None,
            host: None,
            timeout_seconds: default_sms_timeout_seconds(),
        }
    }
}

impl SmsConfig {
    /// Returns `(username, api_key)` when both are configured and non-empty.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.api_key.as_deref()) {
            (Some(user), Some(key)) if !user.is_empty() && !key.is_empty() => Some((user, key)),
            _ => None,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::default())
    }

    fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the shutdown grace period.
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}
