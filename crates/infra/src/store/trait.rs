use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockflow_core::{ArticleId, InventoryId, LocationId, MovementId};
use stockflow_inventory::identity::normalize;
use stockflow_inventory::{Article, ArticleKind, Location, Movement};

use super::batch::{CommitReceipt, WriteBatch};

/// Persistence failure.
///
/// These are infrastructure errors, as opposed to the business failures in
/// `DomainError`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A document changed since it was read; nothing from the batch was applied.
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    /// An update targeted a document that does not exist.
    #[error("document not found: {0}")]
    Missing(String),

    /// An insert reused an existing document id.
    #[error("duplicate document id: {0}")]
    DuplicateId(String),

    /// The backend could not be reached or is in a broken state.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Field filter for article lookups.
///
/// Every set field must match. `code` and `serial` compare normalized (trimmed,
/// lower-cased) values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleQuery {
    pub inventory_id: Option<InventoryId>,
    pub kind: Option<ArticleKind>,
    pub code: Option<String>,
    pub serial: Option<String>,
}

impl ArticleQuery {
    /// Every article in every inventory.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_inventory(inventory_id: InventoryId) -> Self {
        Self {
            inventory_id: Some(inventory_id),
            ..Self::default()
        }
    }

    pub fn of_kind(mut self, kind: ArticleKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(normalize(code));
        self
    }

    pub fn with_serial(mut self, serial: &str) -> Self {
        self.serial = Some(normalize(serial));
        self
    }

    pub fn matches(&self, article: &Article) -> bool {
        if self.inventory_id.is_some_and(|id| id != article.inventory_id) {
            return false;
        }
        if self.kind.is_some_and(|k| k != article.kind()) {
            return false;
        }
        if let Some(code) = &self.code {
            if article.code.as_deref().map(normalize).as_ref() != Some(code) {
                return false;
            }
        }
        if let Some(serial) = &self.serial {
            if article.serial().map(normalize).as_ref() != Some(serial) {
                return false;
            }
        }
        true
    }
}

/// Read side of the article collection.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn get_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError>;

    /// Articles matching `query`, oldest first.
    async fn query_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>, StoreError>;
}

/// Read side of the movement ledger.
#[async_trait]
pub trait MovementStore: Send + Sync {
    async fn get_movement(&self, id: MovementId) -> Result<Option<Movement>, StoreError>;

    /// Ledger entries for one article, in the order they happened.
    async fn movements_for_article(&self, article_id: ArticleId) -> Result<Vec<Movement>, StoreError>;

    /// Ledger entries with the inventory as source or destination.
    async fn movements_for_inventory(&self, inventory_id: InventoryId) -> Result<Vec<Movement>, StoreError>;
}

/// Read side of the location collection.
#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn get_location(&self, id: LocationId) -> Result<Option<Location>, StoreError>;

    async fn list_locations(&self) -> Result<Vec<Location>, StoreError>;
}

/// A document store that can apply a batch of writes atomically.
///
/// `commit` must either apply every write in the batch or none of them. Article
/// updates carry the version the writer read; a mismatch rejects the batch with
/// [`StoreError::Conflict`]. Movement ids are assigned here, inside the same commit,
/// so a stored movement always carries its own id.
#[async_trait]
pub trait DocumentStore: ArticleStore + MovementStore + LocationStore {
    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, StoreError>;
}

#[async_trait]
impl<S> ArticleStore for Arc<S>
where
    S: ArticleStore + ?Sized,
{
    async fn get_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
        (**self).get_article(id).await
    }

    async fn query_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>, StoreError> {
        (**self).query_articles(query).await
    }
}

#[async_trait]
impl<S> MovementStore for Arc<S>
where
    S: MovementStore + ?Sized,
{
    async fn get_movement(&self, id: MovementId) -> Result<Option<Movement>, StoreError> {
        (**self).get_movement(id).await
    }

    async fn movements_for_article(&self, article_id: ArticleId) -> Result<Vec<Movement>, StoreError> {
        (**self).movements_for_article(article_id).await
    }

    async fn movements_for_inventory(&self, inventory_id: InventoryId) -> Result<Vec<Movement>, StoreError> {
        (**self).movements_for_inventory(inventory_id).await
    }
}

#[async_trait]
impl<S> LocationStore for Arc<S>
where
    S: LocationStore + ?Sized,
{
    async fn get_location(&self, id: LocationId) -> Result<Option<Location>, StoreError> {
        (**self).get_location(id).await
    }

    async fn list_locations(&self) -> Result<Vec<Location>, StoreError> {
        (**self).list_locations().await
    }
}

#[async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, StoreError> {
        (**self).commit(batch).await
    }
}
