use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockflow_core::{ArticleId, ExpectedVersion, LocationId, MovementId};
use stockflow_events::Event;
use stockflow_inventory::{Article, Location, Movement, NewMovement};

/// One write inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    InsertArticle(Article),
    UpdateArticle {
        article: Article,
        expected: ExpectedVersion,
    },
    AppendMovement(NewMovement),
    InsertLocation(Location),
    UpdateLocation(Location),
}

/// Writes that must land together or not at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_article(&mut self, article: Article) -> &mut Self {
        self.writes.push(Write::InsertArticle(article));
        self
    }

    /// Update guarded by the version carried on `article` (the version it was read at).
    pub fn update_article(&mut self, article: Article) -> &mut Self {
        let expected = ExpectedVersion::Exact(article.version);
        self.writes.push(Write::UpdateArticle { article, expected });
        self
    }

    pub fn append_movement(&mut self, movement: NewMovement) -> &mut Self {
        self.writes.push(Write::AppendMovement(movement));
        self
    }

    pub fn insert_location(&mut self, location: Location) -> &mut Self {
        self.writes.push(Write::InsertLocation(location));
        self
    }

    pub fn update_location(&mut self, location: Location) -> &mut Self {
        self.writes.push(Write::UpdateLocation(location));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

/// A committed change, as published on the change feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", content = "document", rename_all = "snake_case")]
pub enum StoreChange {
    ArticleCreated(Article),
    ArticleUpdated(Article),
    MovementRecorded(Movement),
    LocationSaved(Location),
}

impl Event for StoreChange {
    fn event_type(&self) -> &'static str {
        match self {
            StoreChange::ArticleCreated(_) => "article.created",
            StoreChange::ArticleUpdated(_) => "article.updated",
            StoreChange::MovementRecorded(_) => "movement.recorded",
            StoreChange::LocationSaved(_) => "location.saved",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StoreChange::ArticleCreated(a) | StoreChange::ArticleUpdated(a) => a.updated_at,
            StoreChange::MovementRecorded(m) => m.created_at,
            StoreChange::LocationSaved(l) => l.updated_at,
        }
    }
}

/// What a successful commit stored, in batch order.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitReceipt {
    pub commit_id: Uuid,
    pub committed_at: DateTime<Utc>,
    pub changes: Vec<StoreChange>,
}

impl CommitReceipt {
    /// Ids assigned to the batch's movements, in order.
    pub fn movement_ids(&self) -> Vec<MovementId> {
        self.changes
            .iter()
            .filter_map(|c| match c {
                StoreChange::MovementRecorded(m) => Some(m.id),
                _ => None,
            })
            .collect()
    }

    /// First movement of the batch.
    pub fn movement_id(&self) -> Option<MovementId> {
        self.movement_ids().into_iter().next()
    }

    /// The stored (re-versioned) copy of an article written by this commit.
    pub fn article(&self, id: ArticleId) -> Option<&Article> {
        self.changes.iter().rev().find_map(|c| match c {
            StoreChange::ArticleCreated(a) | StoreChange::ArticleUpdated(a) if a.id == id => Some(a),
            _ => None,
        })
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.changes.iter().rev().find_map(|c| match c {
            StoreChange::LocationSaved(l) if l.id == id => Some(l),
            _ => None,
        })
    }
}
