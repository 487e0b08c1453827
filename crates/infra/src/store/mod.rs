//! Document store boundary.
//!
//! The engine needs four things from a store: read a document by id, query articles
//! by field, list movements/locations, and commit a batch of writes atomically.
//! No storage technology is assumed.

pub mod batch;
pub mod in_memory;
pub mod r#trait;

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::warn;

use stockflow_core::{ArticleId, InventoryId, LocationId, MovementId};
use stockflow_events::{EventBus, EventEnvelope};
use stockflow_inventory::{Article, Location, Movement};

pub use batch::{CommitReceipt, StoreChange, Write, WriteBatch};
pub use in_memory::InMemoryStore;
pub use r#trait::{ArticleQuery, ArticleStore, DocumentStore, LocationStore, MovementStore, StoreError};

/// Adapter that publishes every committed change to an `EventBus`.
///
/// Publication happens only after `commit` succeeds. A publish failure is logged
/// and does not fail the commit; subscribers can always re-read the store.
pub struct PublishingStore<S, B> {
    store: S,
    bus: B,
    sequence: AtomicU64,
}

impl<S, B> PublishingStore<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self {
            store,
            bus,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn into_parts(self) -> (S, B) {
        (self.store, self.bus)
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

#[async_trait]
impl<S, B> ArticleStore for PublishingStore<S, B>
where
    S: ArticleStore,
    B: Send + Sync,
{
    async fn get_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
        self.store.get_article(id).await
    }

    async fn query_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>, StoreError> {
        self.store.query_articles(query).await
    }
}

#[async_trait]
impl<S, B> MovementStore for PublishingStore<S, B>
where
    S: MovementStore,
    B: Send + Sync,
{
    async fn get_movement(&self, id: MovementId) -> Result<Option<Movement>, StoreError> {
        self.store.get_movement(id).await
    }

    async fn movements_for_article(&self, article_id: ArticleId) -> Result<Vec<Movement>, StoreError> {
        self.store.movements_for_article(article_id).await
    }

    async fn movements_for_inventory(&self, inventory_id: InventoryId) -> Result<Vec<Movement>, StoreError> {
        self.store.movements_for_inventory(inventory_id).await
    }
}

#[async_trait]
impl<S, B> LocationStore for PublishingStore<S, B>
where
    S: LocationStore,
    B: Send + Sync,
{
    async fn get_location(&self, id: LocationId) -> Result<Option<Location>, StoreError> {
        self.store.get_location(id).await
    }

    async fn list_locations(&self) -> Result<Vec<Location>, StoreError> {
        self.store.list_locations().await
    }
}

#[async_trait]
impl<S, B> DocumentStore for PublishingStore<S, B>
where
    S: DocumentStore,
    B: EventBus<EventEnvelope<StoreChange>>,
{
    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, StoreError> {
        // 1) Commit (durable step)
        let receipt = self.store.commit(batch).await?;

        // 2) Publish committed changes (best-effort)
        for change in &receipt.changes {
            let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            let envelope = EventEnvelope::new(receipt.commit_id, seq, change.clone());
            if let Err(err) = self.bus.publish(envelope) {
                warn!(commit_id = %receipt.commit_id, sequence = seq, error = ?err, "change feed publish failed");
            }
        }

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use stockflow_events::{Event, InMemoryEventBus};
    use stockflow_inventory::{ArticleRecord, Unit};

    use super::*;

    #[tokio::test]
    async fn publishes_each_change_after_commit() {
        let bus: Arc<InMemoryEventBus<EventEnvelope<StoreChange>>> = Arc::new(InMemoryEventBus::new());
        let store = PublishingStore::new(InMemoryStore::new(), bus.clone());
        let feed = bus.subscribe();

        let article = Article::from_record(
            &ArticleRecord::material("Cable", 5, Unit::Metro),
            ArticleId::new(),
            InventoryId::new(),
            Utc::now(),
        )
        .unwrap();
        let mut batch = WriteBatch::new();
        batch.insert_article(article.clone());
        let receipt = store.commit(batch).await.unwrap();

        let got = feed.drain();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].commit_id(), receipt.commit_id);
        assert_eq!(got[0].sequence_number(), 1);
        assert_eq!(got[0].payload().event_type(), "article.created");
    }

    #[tokio::test]
    async fn failed_commit_publishes_nothing() {
        let bus: Arc<InMemoryEventBus<EventEnvelope<StoreChange>>> = Arc::new(InMemoryEventBus::new());
        let inner = InMemoryStore::new();
        inner.fail_next_commit(StoreError::Unavailable("down".into()));
        let store = PublishingStore::new(inner, bus.clone());
        let feed = bus.subscribe();

        let location = Location::new("Rack 1", None, Utc::now());
        let mut batch = WriteBatch::new();
        batch.insert_location(location);
        assert!(store.commit(batch).await.is_err());
        assert!(feed.drain().is_empty());
    }

    #[test]
    fn change_serializes_with_tag() {
        let location = Location::new("Rack 1", None, Utc::now());
        let json = serde_json::to_value(StoreChange::LocationSaved(location)).unwrap();
        assert_eq!(json["change"], "location_saved");
        assert_eq!(json["document"]["nombre"], "Rack 1");
    }
}
