//! Infrastructure layer: document store boundary, in-memory store, change feed
//! wiring and configuration.

pub mod config;
pub mod store;

pub use config::EngineConfig;
pub use store::{
    ArticleQuery, ArticleStore, CommitReceipt, DocumentStore, InMemoryStore, LocationStore, MovementStore,
    PublishingStore, StoreChange, StoreError, Write, WriteBatch,
};
