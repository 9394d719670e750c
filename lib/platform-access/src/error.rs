//! Error types for the platform-access crate.

use std::fmt;

/// Errors from authentication operations.
///
/// These errors represent failures in verifying the caller's identity,
/// either during the login callback or on a bearer-protected request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// No `Authorization` header was sent.
    MissingCredentials,
    /// The `Authorization` header is not `Bearer <token>`.
    MalformedHeader,
    /// ID token validation failed (signature, issuer, audience).
    InvalidToken { reason: String },
    /// ID token has expired.
    TokenExpired,
    /// The ID token's nonce does not match the login attempt.
    NonceMismatch,
    /// Missing required claim in token or user info.
    MissingClaim { claim: String },
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredentials => {
                write!(f, "authorization header not provided")
            }
            Self::MalformedHeader => {
                write!(f, "invalid authorization header format")
            }
            Self::InvalidToken { reason } => {
                write!(f, "invalid token: {reason}")
            }
            Self::TokenExpired => {
                write!(f, "token has expired")
            }
            Self::NonceMismatch => {
                write!(f, "token nonce does not match login attempt")
            }
            Self::MissingClaim { claim } => {
                write!(f, "missing required claim: {claim}")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}
