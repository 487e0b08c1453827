//! `stockflow-core`: shared building blocks for the inventory engine.
//!
//! Identifiers, the domain error model and optimistic-concurrency primitives.
//! No IO lives here.

pub mod error;
pub mod id;
pub mod version;

pub use error::{DomainError, DomainResult, ValidationError};
pub use id::{ArticleId, InventoryId, LocationId, MovementId, UserId};
pub use version::ExpectedVersion;
