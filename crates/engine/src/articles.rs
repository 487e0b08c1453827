//! Article create and edit flows.

use chrono::Utc;
use tracing::{debug, info, instrument};

use stockflow_core::{ArticleId, InventoryId, MovementId, UserId};
use stockflow_infra::{DocumentStore, WriteBatch};
use stockflow_inventory::identity::{ConsistencySuggestion, normalize, normalized};
use stockflow_inventory::{
    Article, ArticleChanges, ArticleRecord, ArticleSnapshot, MovementKind, NewMovement, ValidationLimits,
    describe_edit, validate_article,
};

use crate::error::EngineError;
use crate::identity::IdentityResolver;
use crate::ledger::MovementLedger;

/// A newly stored article.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedArticle {
    pub article: Article,
    /// Initial-stock entry, for materials created with a quantity.
    pub movement_id: Option<MovementId>,
    /// Another inventory describes the same code differently.
    pub suggestion: Option<ConsistencySuggestion>,
}

/// Result of an edit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditedArticle {
    pub article: Article,
    /// `None` when the patch changed nothing.
    pub movement_id: Option<MovementId>,
    pub kind: Option<MovementKind>,
}

#[derive(Debug, Clone)]
pub struct ArticleRegistry<S> {
    store: S,
    resolver: IdentityResolver<S>,
    ledger: MovementLedger<S>,
    limits: ValidationLimits,
}

impl<S> ArticleRegistry<S>
where
    S: DocumentStore + Clone,
{
    pub fn new(store: S, limits: ValidationLimits, generic_label: impl Into<String>) -> Self {
        Self {
            resolver: IdentityResolver::new(store.clone(), generic_label),
            ledger: MovementLedger::new(store.clone()),
            store,
            limits,
        }
    }

    /// Validate and store a new article in `inventory_id`.
    ///
    /// Any equivalent article already in scope blocks the create: a serial is
    /// never registered twice and a matching material should be adjusted instead.
    #[instrument(skip_all, fields(inventory_id = %inventory_id, name = %record.name))]
    pub async fn create(
        &self,
        record: &ArticleRecord,
        inventory_id: InventoryId,
        user_id: UserId,
    ) -> Result<CreatedArticle, EngineError> {
        validate_article(record, &self.limits)?;
        let article = Article::from_record(record, ArticleId::new(), inventory_id, Utc::now())?;

        if let Some(duplicate) = self.resolver.find_duplicate(&article, inventory_id, None).await? {
            debug!(existing = %duplicate.article.id, key = ?duplicate.key, "create blocked by duplicate");
            return Err(duplicate.into_conflict());
        }
        let suggestion = self.resolver.check_global_consistency(&article).await?;

        let initial = article.as_material().filter(|m| m.quantity > 0).map(|m| {
            NewMovement::new(
                MovementKind::Entry,
                article.id,
                user_id,
                m.quantity,
                format!("initial stock: {} {}", m.quantity, m.unit),
            )
            .to_inventory(inventory_id)
            .with_snapshots(ArticleSnapshot::default(), ArticleSnapshot::of(&article))
        });

        let id = article.id;
        let mut batch = WriteBatch::new();
        batch.insert_article(article);
        if let Some(movement) = initial {
            self.ledger.stage(&mut batch, movement)?;
        }

        let receipt = self.store.commit(batch).await?;
        let article = receipt.article(id).cloned().ok_or(EngineError::NotFound("article"))?;

        info!(article_id = %id, kind = %article.kind(), "article created");
        Ok(CreatedArticle {
            article,
            movement_id: receipt.movement_id(),
            suggestion,
        })
    }

    /// Apply a field patch and record what changed.
    ///
    /// The movement is `ENTRY`/`EXIT` when the quantity moved and `EDIT` otherwise.
    #[instrument(skip_all, fields(article_id = %article_id))]
    pub async fn record_edit(
        &self,
        article_id: ArticleId,
        changes: &ArticleChanges,
        user_id: UserId,
    ) -> Result<EditedArticle, EngineError> {
        let current = self
            .store
            .get_article(article_id)
            .await?
            .ok_or(EngineError::NotFound("article"))?;

        if changes.is_empty() {
            return Ok(unchanged(current));
        }

        let mut record = current.to_record();
        changes.apply_to(&mut record);
        validate_article(&record, &self.limits)?;
        let updated = Article::from_record(&record, current.id, current.inventory_id, current.created_at)?;
        if updated == current {
            debug!("patch changes nothing");
            return Ok(unchanged(current));
        }

        if identity_changed(&current, &updated) {
            let duplicate = self
                .resolver
                .find_duplicate(&updated, updated.inventory_id, Some(updated.id))
                .await?;
            if let Some(duplicate) = duplicate {
                return Err(duplicate.into_conflict());
            }
        }

        let before = ArticleSnapshot::of(&current);
        let after = ArticleSnapshot::of(&updated);
        let delta = updated.quantity() - current.quantity();
        let kind = if delta == 0 {
            MovementKind::Edit
        } else {
            MovementKind::for_delta(delta)
        };

        let movement = NewMovement::new(kind, updated.id, user_id, delta.abs(), describe_edit(&before, &after));
        let movement = match kind {
            MovementKind::Entry => movement.to_inventory(updated.inventory_id),
            _ => movement.from_inventory(updated.inventory_id),
        }
        .with_snapshots(before, after);

        let mut batch = WriteBatch::new();
        batch.update_article(updated);
        self.ledger.stage(&mut batch, movement)?;

        let receipt = self.store.commit(batch).await?;
        let article = receipt
            .article(article_id)
            .cloned()
            .ok_or(EngineError::NotFound("article"))?;
        let movement_id = receipt.movement_id();

        info!(kind = ?kind, delta, movement_id = ?movement_id, "edit recorded");
        Ok(EditedArticle {
            article,
            movement_id,
            kind: Some(kind),
        })
    }
}

fn unchanged(article: Article) -> EditedArticle {
    EditedArticle {
        article,
        movement_id: None,
        kind: None,
    }
}

/// Whether any field an identity key reads differs.
fn identity_changed(a: &Article, b: &Article) -> bool {
    normalize(&a.name) != normalize(&b.name)
        || a.unit() != b.unit()
        || normalized(a.code.as_deref()) != normalized(b.code.as_deref())
        || normalized(a.brand.as_deref()) != normalized(b.brand.as_deref())
        || normalized(a.model.as_deref()) != normalized(b.model.as_deref())
        || normalized(a.serial()) != normalized(b.serial())
}
