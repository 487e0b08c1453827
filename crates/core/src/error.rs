//! Domain error model.

use thiserror::Error;

use crate::id::ArticleId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// A single failed business rule.
///
/// `field` names the persisted field (`nombre`, `codigo`, `cantidad`, ...) so callers
/// can attach the message to the right input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Domain-level error.
///
/// Deterministic business failures only. Persistence failures live in the
/// infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A field violates a business rule.
    #[error("validation failed: {0}")]
    Validation(ValidationError),

    /// A referenced article/location does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// An exit or transfer asks for more than is in stock.
    #[error("insufficient stock (available: {available}, requested: {requested})")]
    InsufficientStock { available: i64, requested: i64 },

    /// Identity resolution found a blocking duplicate.
    #[error("duplicate of article {existing}: {reason}")]
    DuplicateConflict { existing: ArticleId, reason: String },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Stale version / optimistic concurrency.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(field: &'static str, msg: impl Into<String>) -> Self {
        Self::Validation(ValidationError::new(field, msg))
    }

    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound(what)
    }

    pub fn insufficient_stock(available: i64, requested: i64) -> Self {
        Self::InsufficientStock {
            available,
            requested,
        }
    }

    pub fn duplicate(existing: ArticleId, reason: impl Into<String>) -> Self {
        Self::DuplicateConflict {
            existing,
            reason: reason.into(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<ValidationError> for DomainError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}
