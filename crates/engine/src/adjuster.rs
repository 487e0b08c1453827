//! Quantity adjustments that drive ledger entries.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use stockflow_core::{ArticleId, DomainError, MovementId, UserId};
use stockflow_infra::{DocumentStore, WriteBatch};
use stockflow_inventory::{Article, ArticleSnapshot, MovementKind, NewMovement, ValidationLimits};

use crate::error::EngineError;
use crate::ledger::MovementLedger;

/// How the caller arrived at the new quantity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustMode {
    /// Stock came in; the new quantity may not be lower.
    Increment,
    /// Stock went out; the new quantity may not be higher.
    Decrement,
    /// The quantity was counted and set directly.
    Direct,
}

/// Result of a successful adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    /// The article as stored after the adjustment.
    pub article: Article,
    /// `None` when the quantity did not change.
    pub movement_id: Option<MovementId>,
    pub delta: i64,
}

#[derive(Debug, Clone)]
pub struct QuantityAdjuster<S> {
    store: S,
    ledger: MovementLedger<S>,
    limits: ValidationLimits,
}

impl<S> QuantityAdjuster<S>
where
    S: DocumentStore + Clone,
{
    pub fn new(store: S, limits: ValidationLimits) -> Self {
        Self {
            ledger: MovementLedger::new(store.clone()),
            store,
            limits,
        }
    }

    /// Set an article's quantity to `new_quantity` and record the difference.
    ///
    /// The quantity write and its `ENTRY`/`EXIT` movement are committed together,
    /// guarded by the article version that was read.
    #[instrument(skip_all, fields(article_id = %article_id, new_quantity = new_quantity, mode = ?mode))]
    pub async fn adjust(
        &self,
        article_id: ArticleId,
        new_quantity: i64,
        mode: AdjustMode,
        note: Option<&str>,
        user_id: UserId,
    ) -> Result<Adjustment, EngineError> {
        let mut article = self
            .store
            .get_article(article_id)
            .await?
            .ok_or(EngineError::NotFound("article"))?;

        if !(0..=self.limits.quantity_max).contains(&new_quantity) {
            return Err(DomainError::validation(
                "cantidad",
                format!("quantity must be between 0 and {}", self.limits.quantity_max),
            )
            .into());
        }

        let current = article.quantity();
        let delta = new_quantity - current;
        if delta == 0 {
            debug!("quantity unchanged, nothing to record");
            return Ok(Adjustment {
                article,
                movement_id: None,
                delta,
            });
        }

        match mode {
            AdjustMode::Increment if delta < 0 => {
                return Err(DomainError::validation("cantidad", "an entry cannot lower the quantity").into());
            }
            AdjustMode::Decrement if delta > 0 => {
                return Err(DomainError::validation("cantidad", "an exit cannot raise the quantity").into());
            }
            _ => {}
        }
        let before = ArticleSnapshot::of(&article);
        article.set_quantity(new_quantity)?;
        let after = ArticleSnapshot::of(&article);

        let amount = delta.abs();
        let kind = MovementKind::for_delta(delta);
        let description = describe(mode, kind, amount, &article, current, new_quantity, note);

        let movement = NewMovement::new(kind, article.id, user_id, amount, description).with_snapshots(before, after);
        let movement = match kind {
            MovementKind::Entry => movement.to_inventory(article.inventory_id),
            _ => movement.from_inventory(article.inventory_id),
        };

        let mut batch = WriteBatch::new();
        batch.update_article(article);
        self.ledger.stage(&mut batch, movement)?;

        let receipt = self.store.commit(batch).await?;
        let article = receipt
            .article(article_id)
            .cloned()
            .ok_or(EngineError::NotFound("article"))?;
        let movement_id = receipt.movement_id();

        info!(delta, movement_id = ?movement_id, "quantity adjusted");
        Ok(Adjustment {
            article,
            movement_id,
            delta,
        })
    }
}

fn describe(
    mode: AdjustMode,
    kind: MovementKind,
    amount: i64,
    article: &Article,
    old: i64,
    new: i64,
    note: Option<&str>,
) -> String {
    let unit = article.unit();
    let mut text = match (mode, kind) {
        (AdjustMode::Direct, _) => format!("adjustment: {old} → {new}"),
        (_, MovementKind::Entry) => format!("entry of {amount} {unit}"),
        _ => format!("exit of {amount} {unit}"),
    };
    if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
        text.push_str(&format!(" ({note})"));
    }
    text
}
