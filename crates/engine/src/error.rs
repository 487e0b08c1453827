//! Error model for engine operations.

use thiserror::Error;

use stockflow_core::{ArticleId, DomainError, ValidationError};
use stockflow_infra::StoreError;

/// Everything an engine operation can fail with.
///
/// `Display` is the human-readable message surfaced to the caller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// A field violates a business rule.
    #[error("{0}")]
    Validation(ValidationError),

    /// Referenced article/location does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Exit/transfer quantity exceeds available stock.
    #[error("insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: i64, requested: i64 },

    /// Identity resolution found a blocking duplicate.
    #[error("duplicate article: {reason}")]
    DuplicateConflict { existing: ArticleId, reason: String },

    /// The article changed between read and write; nothing was saved.
    #[error("the article was modified concurrently, reload and try again")]
    Concurrency(String),

    /// Persistence failure.
    #[error("could not save changes")]
    Store(StoreError),
}

impl EngineError {
    /// The conflicting article, for "merge" / "edit existing" affordances.
    pub fn conflicting_article(&self) -> Option<ArticleId> {
        match self {
            EngineError::DuplicateConflict { existing, .. } => Some(*existing),
            _ => None,
        }
    }

    /// Whether retrying (possibly with different input) can succeed.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::NotFound(_) | EngineError::Store(_))
    }
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(err) => EngineError::Validation(err),
            DomainError::NotFound(what) => EngineError::NotFound(what),
            DomainError::InsufficientStock { available, requested } => {
                EngineError::InsufficientStock { available, requested }
            }
            DomainError::DuplicateConflict { existing, reason } => EngineError::DuplicateConflict { existing, reason },
            DomainError::InvalidId(msg) => EngineError::Validation(ValidationError::new("id", msg)),
            DomainError::Conflict(msg) => EngineError::Concurrency(msg),
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(value: ValidationError) -> Self {
        EngineError::Validation(value)
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => EngineError::Concurrency(msg),
            other => EngineError::Store(other),
        }
    }
}
