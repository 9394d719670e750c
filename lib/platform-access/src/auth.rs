//! Authentication primitives shared by the login flow and the bearer gate.

use crate::error::AuthenticationError;
use chrono::{DateTime, Utc};

/// Literal scheme prefix required on the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Extracts the token from an `Authorization` header value.
///
/// The value must start with exactly `Bearer ` and carry a non-empty token.
///
/// # Errors
///
/// Returns [`AuthenticationError::MissingCredentials`] when no header was sent
/// and [`AuthenticationError::MalformedHeader`] for any other shape.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthenticationError> {
    let header = header.ok_or(AuthenticationError::MissingCredentials)?;
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthenticationError::MalformedHeader)?
        .trim();

    if token.is_empty() {
        return Err(AuthenticationError::MalformedHeader);
    }
    Ok(token)
}

/// Claims taken from an ID token whose signature, issuer, audience and expiry
/// have been verified.
///
/// This value lives for one request. Handlers receive it from the bearer
/// middleware and use the email to resolve the calling user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    /// Provider subject identifier.
    pub subject: String,
    /// Email address asserted by the provider.
    pub email: String,
    /// Whether the provider has verified the email address.
    pub email_verified: bool,
    /// When the token stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl VerifiedClaims {
    /// Creates a new set of verified claims.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        email: impl Into<String>,
        email_verified: bool,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject: subject.into(),
            email: email.into(),
            email_verified,
            expires_at,
        }
    }
}

/// Profile returned by the provider's user-info endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUserInfo {
    /// Provider subject identifier.
    pub subject: String,
    /// Email address, if the provider released it.
    pub email: Option<String>,
    /// Email verification flag, if the provider released it.
    pub email_verified: Option<bool>,
}

impl ProviderUserInfo {
    /// Returns the email or the claim error used when it was not released.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::MissingClaim`] when the provider did not
    /// return an email address.
    pub fn require_email(&self) -> Result<&str, AuthenticationError> {
        self.email
            .as_deref()
            .filter(|email| !email.is_empty())
            .ok_or_else(|| AuthenticationError::MissingClaim {
                claim: "email".to_string(),
            })
    }
}
