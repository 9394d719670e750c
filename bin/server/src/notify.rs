//! Order confirmation messages.
//!
//! Orders trigger a text message to the contact number on the order. The
//! [`Notifier`] trait keeps the gateway swappable; production uses
//! [`AfricasTalkingSms`].

use async_trait::async_trait;
use rust_decimal::Decimal;
use savannah_store::Item;
use std::fmt;
use std::time::Duration;
use tracing::instrument;

/// Sends a text message to a phone number.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, message: &str) -> Result<(), NotifyError>;
}

/// Notification delivery errors.
#[derive(Debug)]
pub enum NotifyError {
    /// The HTTP client could not be built.
    Configuration(String),
    /// The request did not reach the gateway or timed out.
    Transport(String),
    /// The gateway answered with a non-success status.
    Rejected { status: u16, body: String },
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "SMS client configuration error: {msg}"),
            Self::Transport(msg) => write!(f, "SMS request failed: {msg}"),
            Self::Rejected { status, body } => {
                write!(f, "SMS gateway returned {status}: {body}")
            }
        }
    }
}

impl std::error::Error for NotifyError {}

/// Builds the confirmation text for an order of `quantity` units of `item`.
#[must_use]
pub fn order_confirmation(item: &Item, quantity: i32) -> String {
    let total = item.price * Decimal::from(quantity);
    format!(
        "Thank you for your order! You've successfully created an order for {name}. \
         You ordered {quantity} {name}(s), totaling an amount of ${total:.2}. \
         We appreciate your business!",
        name = item.name,
    )
}

/// Africa's Talking bulk SMS client.
pub struct AfricasTalkingSms {
    http_client: reqwest::Client,
    host: String,
    username: String,
    api_key: String,
}

impl AfricasTalkingSms {
    pub const LIVE_HOST: &'static str = "https://api.africastalking.com";
    pub const SANDBOX_HOST: &'static str = "https://api.sandbox.africastalking.com";

    /// Creates a client. The `sandbox` username selects the sandbox host.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Configuration`] if the HTTP client cannot be built.
    pub fn new(username: &str, api_key: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Configuration(e.to_string()))?;

        let host = if username == "sandbox" {
            Self::SANDBOX_HOST
        } else {
            Self::LIVE_HOST
        };

        Ok(Self {
            http_client,
            host: host.to_string(),
            username: username.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Sends to `host` instead of the Africa's Talking endpoint.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Returns the gateway host requests are sent to.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }
}

#[async_trait]
impl Notifier for AfricasTalkingSms {
    #[instrument(skip(self, message))]
    async fn send(&self, to: &str, message: &str) -> Result<(), NotifyError> {
        let response = self
            .http_client
            .post(format!("{}/version1/messaging", self.host))
            .header("apikey", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("username", self.username.as_str()),
                ("to", to),
                ("message", message),
            ])
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("SMS accepted by gateway");
        Ok(())
    }
}

/// Notifier used when no SMS gateway is configured.
#[derive(Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, to: &str, _message: &str) -> Result<(), NotifyError> {
        tracing::debug!(to, "SMS disabled, skipping notification");
        Ok(())
    }
}
