//! Inventory movement and identity-resolution engine.
//!
//! Components share one injected [`stockflow_infra::DocumentStore`]. Every mutating
//! operation validates first and then commits its data change together with the
//! ledger entry describing it.

pub mod adjuster;
pub mod articles;
pub mod engine;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod locations;
pub mod transfer;

mod integration_tests;

pub use adjuster::{AdjustMode, Adjustment, QuantityAdjuster};
pub use articles::{ArticleRegistry, CreatedArticle, EditedArticle};
pub use engine::{InventoryEngine, OperationOutcome};
pub use error::EngineError;
pub use identity::{Duplicate, IdentityResolver, TransferCheck};
pub use ledger::MovementLedger;
pub use locations::LocationRegistry;
pub use transfer::{TransferCoordinator, TransferReceipt, TransferRequest};
