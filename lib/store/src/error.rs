//! Error types for the store crate.

use std::fmt;

/// Errors from repository operations.
///
/// Callers must be able to tell "not found" apart from a backend failure:
/// the login flow provisions a user on the former and aborts on the latter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No entity exists for the given key.
    NotFound { entity: &'static str, key: String },
    /// The write would violate a uniqueness rule (duplicate email).
    Conflict { entity: &'static str, details: String },
    /// The record breaks a field rule (non-positive quantity).
    Invalid { entity: &'static str, details: String },
    /// The backend failed to complete the operation.
    Io { details: String },
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Rejects an order quantity below one.
    pub(crate) fn check_quantity(quantity: i32) -> Result<(), Self> {
        if quantity > 0 {
            return Ok(());
        }
        Err(Self::Invalid {
            entity: "order",
            details: format!("quantity must be positive, got {quantity}"),
        })
    }

    /// Returns true if this is a [`StoreError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { entity, key } => {
                write!(f, "{entity} '{key}' not found")
            }
            Self::Conflict { entity, details } => {
                write!(f, "{entity} conflict: {details}")
            }
            Self::Invalid { entity, details } => {
                write!(f, "invalid {entity}: {details}")
            }
            Self::Io { details } => {
                write!(f, "storage failure: {details}")
            }
        }
    }
}

impl std::error::Error for StoreError {}
