//! Inventory domain: articles, locations, movements and the rules around them.
//!
//! Pure, deterministic logic only (no IO, no storage). The engine crate wires these
//! rules to a document store.

pub mod article;
pub mod identity;
pub mod location;
pub mod movement;
pub mod unit;
pub mod validation;

pub use article::{
    Article, ArticleChanges, ArticleDetails, ArticleKind, ArticleRecord, EquipmentDetails, MaterialDetails,
};
pub use identity::{ConsistencySuggestion, GENERIC, MatchKey};
pub use location::Location;
pub use movement::{ArticleSnapshot, Movement, MovementKind, NewMovement, describe_edit};
pub use unit::Unit;
pub use validation::{ValidationLimits, validate_article, validate_exit, validate_location_name};
