use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use stockflow_core::{ArticleId, InventoryId, LocationId, MovementId};
use stockflow_inventory::{Article, Location, Movement};

use super::batch::{CommitReceipt, StoreChange, Write, WriteBatch};
use super::r#trait::{ArticleQuery, ArticleStore, DocumentStore, LocationStore, MovementStore, StoreError};

#[derive(Debug, Default)]
struct Collections {
    articles: HashMap<ArticleId, Article>,
    movements: Vec<Movement>,
    locations: HashMap<LocationId, Location>,
}

/// In-memory document store.
///
/// Intended for tests/dev. A commit holds the write lock for its whole duration,
/// which is what makes a batch atomic here; no lock is ever held across an `.await`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Collections>,
    fail_next: Mutex<Option<StoreError>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `commit` fail with `error` without applying anything.
    pub fn fail_next_commit(&self, error: StoreError) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(error);
        }
    }

    pub fn article_count(&self) -> usize {
        self.inner.read().map(|c| c.articles.len()).unwrap_or(0)
    }

    pub fn movement_count(&self) -> usize {
        self.inner.read().map(|c| c.movements.len()).unwrap_or(0)
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("lock poisoned".to_string())
    }

    fn take_injected_failure(&self) -> Option<StoreError> {
        self.fail_next.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Validate and stage every write against the current state; nothing is applied
    /// unless the whole batch stages cleanly.
    fn stage(collections: &Collections, batch: WriteBatch) -> Result<Vec<StoreChange>, StoreError> {
        let now = Utc::now();
        let mut staged_articles: HashMap<ArticleId, Article> = HashMap::new();
        let mut staged_locations: HashMap<LocationId, Location> = HashMap::new();
        let mut changes = Vec::with_capacity(batch.len());

        for write in batch.into_writes() {
            match write {
                Write::InsertArticle(mut article) => {
                    if collections.articles.contains_key(&article.id) || staged_articles.contains_key(&article.id) {
                        return Err(StoreError::DuplicateId(format!("article {}", article.id)));
                    }
                    article.version = 1;
                    article.created_at = now;
                    article.updated_at = now;
                    staged_articles.insert(article.id, article.clone());
                    changes.push(StoreChange::ArticleCreated(article));
                }
                Write::UpdateArticle { mut article, expected } => {
                    let current = staged_articles
                        .get(&article.id)
                        .or_else(|| collections.articles.get(&article.id))
                        .ok_or_else(|| StoreError::Missing(format!("article {}", article.id)))?;

                    if !expected.matches(current.version) {
                        return Err(StoreError::Conflict(format!(
                            "article {}: expected {expected:?}, found {}",
                            article.id, current.version
                        )));
                    }

                    article.version = current.version + 1;
                    article.created_at = current.created_at;
                    article.updated_at = now;
                    staged_articles.insert(article.id, article.clone());
                    changes.push(StoreChange::ArticleUpdated(article));
                }
                Write::AppendMovement(new) => {
                    let movement = Movement::from_new(MovementId::new(), new, now);
                    changes.push(StoreChange::MovementRecorded(movement));
                }
                Write::InsertLocation(mut location) => {
                    if collections.locations.contains_key(&location.id) || staged_locations.contains_key(&location.id) {
                        return Err(StoreError::DuplicateId(format!("location {}", location.id)));
                    }
                    location.created_at = now;
                    location.updated_at = now;
                    staged_locations.insert(location.id, location.clone());
                    changes.push(StoreChange::LocationSaved(location));
                }
                Write::UpdateLocation(mut location) => {
                    let current = staged_locations
                        .get(&location.id)
                        .or_else(|| collections.locations.get(&location.id))
                        .ok_or_else(|| StoreError::Missing(format!("location {}", location.id)))?;
                    location.created_at = current.created_at;
                    location.updated_at = now;
                    staged_locations.insert(location.id, location.clone());
                    changes.push(StoreChange::LocationSaved(location));
                }
            }
        }

        Ok(changes)
    }
}

#[async_trait]
impl ArticleStore for InMemoryStore {
    async fn get_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
        let c = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(c.articles.get(&id).cloned())
    }

    async fn query_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>, StoreError> {
        let c = self.inner.read().map_err(|_| Self::poisoned())?;
        let mut found: Vec<Article> = c.articles.values().filter(|a| query.matches(a)).cloned().collect();
        found.sort_by_key(|a| (a.created_at, a.id));
        Ok(found)
    }
}

#[async_trait]
impl MovementStore for InMemoryStore {
    async fn get_movement(&self, id: MovementId) -> Result<Option<Movement>, StoreError> {
        let c = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(c.movements.iter().find(|m| m.id == id).cloned())
    }

    async fn movements_for_article(&self, article_id: ArticleId) -> Result<Vec<Movement>, StoreError> {
        let c = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(c.movements.iter().filter(|m| m.article_id == article_id).cloned().collect())
    }

    async fn movements_for_inventory(&self, inventory_id: InventoryId) -> Result<Vec<Movement>, StoreError> {
        let c = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(c.movements.iter().filter(|m| m.involves(inventory_id)).cloned().collect())
    }
}

#[async_trait]
impl LocationStore for InMemoryStore {
    async fn get_location(&self, id: LocationId) -> Result<Option<Location>, StoreError> {
        let c = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(c.locations.get(&id).cloned())
    }

    async fn list_locations(&self) -> Result<Vec<Location>, StoreError> {
        let c = self.inner.read().map_err(|_| Self::poisoned())?;
        let mut all: Vec<Location> = c.locations.values().cloned().collect();
        all.sort_by_key(|l| (l.created_at, l.id));
        Ok(all)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, StoreError> {
        if let Some(error) = self.take_injected_failure() {
            return Err(error);
        }

        let mut c = self.inner.write().map_err(|_| Self::poisoned())?;
        let changes = Self::stage(&c, batch)?;

        // Apply (append-only for movements).
        for change in &changes {
            match change {
                StoreChange::ArticleCreated(a) | StoreChange::ArticleUpdated(a) => {
                    c.articles.insert(a.id, a.clone());
                }
                StoreChange::MovementRecorded(m) => c.movements.push(m.clone()),
                StoreChange::LocationSaved(l) => {
                    c.locations.insert(l.id, l.clone());
                }
            }
        }

        let committed_at = changes
            .first()
            .map(stockflow_events::Event::occurred_at)
            .unwrap_or_else(Utc::now);

        Ok(CommitReceipt {
            commit_id: Uuid::now_v7(),
            committed_at,
            changes,
        })
    }
}
