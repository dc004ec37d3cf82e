//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error raised before anything reaches a store.
///
/// Store outcomes (not found, rejected writes, backend failures) have their own
/// type in `facturas-invoicing`; this one only covers malformed input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (missing field, wrong shape).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. blank).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
