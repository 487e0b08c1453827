//! Cross-inventory movement of stock.
//!
//! Materials split: the source is decremented and the destination either absorbs
//! the quantity into an equivalent article or gets a new one. Equipment moves as a
//! whole. Every write of a transfer, the `TRANSFER` movement included, goes out in a
//! single commit.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use stockflow_core::{ArticleId, DomainError, InventoryId, MovementId, UserId};
use stockflow_infra::{DocumentStore, WriteBatch};
use stockflow_inventory::{
    Article, ArticleDetails, ArticleKind, ArticleSnapshot, MaterialDetails, MovementKind, NewMovement, ValidationLimits,
    validate_exit,
};

use crate::error::EngineError;
use crate::identity::{IdentityResolver, TransferCheck};
use crate::ledger::MovementLedger;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub article_id: ArticleId,
    pub from_inventory: InventoryId,
    /// `None` takes the stock out of the system (plain exit).
    pub to_inventory: Option<InventoryId>,
    pub quantity: i64,
    pub description: String,
    pub destination_location: Option<String>,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub movement_id: MovementId,
    /// `TRANSFER`, or `EXIT` when there was no destination.
    pub kind: MovementKind,
    /// Article holding the stock at the destination.
    pub destination_article: Option<ArticleId>,
    /// Whether the quantity was merged into an existing destination article.
    pub merged: bool,
    pub warning: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransferCoordinator<S> {
    store: S,
    resolver: IdentityResolver<S>,
    ledger: MovementLedger<S>,
    limits: ValidationLimits,
}

impl<S> TransferCoordinator<S>
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

    #[instrument(
        skip_all,
        fields(
            article_id = %request.article_id,
            from = %request.from_inventory,
            to = ?request.to_inventory,
            quantity = request.quantity,
        )
    )]
    pub async fn transfer(&self, request: TransferRequest) -> Result<TransferReceipt, EngineError> {
        let mut article = self
            .store
            .get_article(request.article_id)
            .await?
            .filter(|a| a.inventory_id == request.from_inventory)
            .ok_or(EngineError::NotFound("article"))?;

        validate_exit(&article, request.quantity)?;

        let Some(destination) = request.to_inventory else {
            return self.exit(article, &request).await;
        };
        if destination == request.from_inventory {
            return Err(DomainError::validation(
                "idinventario_destino",
                "destination must be a different inventory",
            )
            .into());
        }

        let check = self.resolver.check_transfer_target(&article, destination).await?;
        let warning = check.warning();
        if let Some(w) = &warning {
            warn!(warning = %w, "transfer target already holds this article");
        }

        let location = clean(request.destination_location.as_deref());
        let before = ArticleSnapshot::of(&article);
        let mut batch = WriteBatch::new();

        let (destination_article, merged) = match article.kind() {
            ArticleKind::Material => {
                article.set_quantity(article.quantity() - request.quantity)?;
                let target = match check {
                    TransferCheck::WillMerge(mut existing) => {
                        let merged = existing
                            .quantity()
                            .checked_add(request.quantity)
                            .filter(|q| *q <= self.limits.quantity_max)
                            .ok_or_else(|| {
                                DomainError::validation(
                                    "cantidad",
                                    format!(
                                        "destination quantity would exceed {}",
                                        self.limits.quantity_max
                                    ),
                                )
                            })?;
                        existing.set_quantity(merged)?;
                        if location.is_some() {
                            existing.location = location;
                        }
                        let id = existing.id;
                        batch.update_article(existing);
                        (id, true)
                    }
                    TransferCheck::Clear => {
                        let created = split_off(&article, destination, request.quantity, location);
                        let id = created.id;
                        batch.insert_article(created);
                        (id, false)
                    }
                };
                batch.update_article(article.clone());
                target
            }
            ArticleKind::Equipment => {
                article.rehome(destination, location);
                batch.update_article(article.clone());
                (article.id, false)
            }
        };

        let description = describe(&request, &article, MovementKind::Transfer);
        let movement = NewMovement::new(
            MovementKind::Transfer,
            article.id,
            request.user_id,
            request.quantity,
            description,
        )
        .from_inventory(request.from_inventory)
        .to_inventory(destination)
        .with_snapshots(before, ArticleSnapshot::of(&article));
        self.ledger.stage(&mut batch, movement)?;

        let receipt = self.store.commit(batch).await?;
        let movement_id = receipt
            .movement_id()
            .ok_or(EngineError::NotFound("movement"))?;

        info!(movement_id = %movement_id, destination_article = %destination_article, merged, "transfer committed");
        Ok(TransferReceipt {
            movement_id,
            kind: MovementKind::Transfer,
            destination_article: Some(destination_article),
            merged,
            warning,
        })
    }

    async fn exit(&self, mut article: Article, request: &TransferRequest) -> Result<TransferReceipt, EngineError> {
        if article.is_equipment() {
            return Err(DomainError::validation(
                "idinventario_destino",
                "equipment can only be moved to another inventory",
            )
            .into());
        }

        let before = ArticleSnapshot::of(&article);
        article.set_quantity(article.quantity() - request.quantity)?;
        let description = describe(request, &article, MovementKind::Exit);
        let movement = NewMovement::new(
            MovementKind::Exit,
            article.id,
            request.user_id,
            request.quantity,
            description,
        )
        .from_inventory(request.from_inventory)
        .with_snapshots(before, ArticleSnapshot::of(&article));

        let mut batch = WriteBatch::new();
        batch.update_article(article);
        self.ledger.stage(&mut batch, movement)?;

        let receipt = self.store.commit(batch).await?;
        let movement_id = receipt
            .movement_id()
            .ok_or(EngineError::NotFound("movement"))?;

        info!(movement_id = %movement_id, "exit committed");
        Ok(TransferReceipt {
            movement_id,
            kind: MovementKind::Exit,
            destination_article: None,
            merged: false,
            warning: None,
        })
    }
}

/// New destination material carrying the source's descriptive fields.
fn split_off(source: &Article, destination: InventoryId, quantity: i64, location: Option<String>) -> Article {
    let now = Utc::now();
    let (unit, min_quantity) = source
        .as_material()
        .map(|m| (m.unit, m.min_quantity))
        .unwrap_or((source.unit(), None));

    Article {
        id: ArticleId::new(),
        inventory_id: destination,
        name: source.name.clone(),
        description: source.description.clone(),
        brand: source.brand.clone(),
        model: source.model.clone(),
        code: source.code.clone(),
        location,
        unit_cost: source.unit_cost,
        details: ArticleDetails::Material(MaterialDetails {
            quantity,
            unit,
            min_quantity,
        }),
        version: 0,
        created_at: now,
        updated_at: now,
    }
}

fn describe(request: &TransferRequest, article: &Article, kind: MovementKind) -> String {
    let text = request.description.trim();
    if !text.is_empty() {
        return text.to_string();
    }
    match kind {
        MovementKind::Transfer => format!("transfer of {} {} of {}", request.quantity, article.unit(), article.name),
        _ => format!("exit of {} {} of {}", request.quantity, article.unit(), article.name),
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
