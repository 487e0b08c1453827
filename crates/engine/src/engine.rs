//! Caller-facing facade.
//!
//! Each mutating operation returns an [`OperationOutcome`]: a success flag plus a
//! message that can be shown as-is. Failures are reported in the outcome and logged;
//! nothing propagates past this boundary. The typed components are reachable through
//! the accessors for callers that want `Result`s instead.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, warn};

use stockflow_core::{ArticleId, InventoryId, LocationId, MovementId, UserId, ValidationError};
use stockflow_events::{EventBus, EventEnvelope, Subscription};
use stockflow_infra::{DocumentStore, EngineConfig, PublishingStore, StoreChange};
use stockflow_inventory::{
    Article, ArticleChanges, ArticleKind, ArticleRecord, ConsistencySuggestion, Location, Movement, validate_article,
};

use crate::adjuster::{AdjustMode, QuantityAdjuster};
use crate::articles::ArticleRegistry;
use crate::error::EngineError;
use crate::identity::IdentityResolver;
use crate::ledger::MovementLedger;
use crate::locations::LocationRegistry;
use crate::transfer::{TransferCoordinator, TransferRequest};

/// Boundary result of a mutating operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement_id: Option<MovementId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_id: Option<ArticleId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<LocationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Existing article behind a duplicate conflict.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<ArticleId>,
}

impl OperationOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Self::default()
        }
    }

    fn failed(operation: &'static str, err: &EngineError) -> Self {
        match err {
            EngineError::Store(cause) => error!(operation, error = %cause, "operation failed"),
            other => warn!(operation, error = %other, "operation rejected"),
        }
        Self {
            success: false,
            message: err.to_string(),
            conflict: err.conflicting_article(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct InventoryEngine<S> {
    store: S,
    config: EngineConfig,
    resolver: IdentityResolver<S>,
    ledger: MovementLedger<S>,
    adjuster: QuantityAdjuster<S>,
    transfers: TransferCoordinator<S>,
    articles: ArticleRegistry<S>,
    locations: LocationRegistry<S>,
}

impl<S> InventoryEngine<S>
where
    S: DocumentStore + Clone,
{
    pub fn new(store: S, config: EngineConfig) -> Self {
        let generic = config.generic_label.as_str();
        Self {
            resolver: IdentityResolver::new(store.clone(), generic),
            ledger: MovementLedger::new(store.clone()),
            adjuster: QuantityAdjuster::new(store.clone(), config.limits.clone()),
            transfers: TransferCoordinator::new(store.clone(), config.limits.clone(), generic),
            articles: ArticleRegistry::new(store.clone(), config.limits.clone(), generic),
            locations: LocationRegistry::new(store.clone(), config.limits.clone()),
            store,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn resolver(&self) -> &IdentityResolver<S> {
        &self.resolver
    }

    pub fn ledger(&self) -> &MovementLedger<S> {
        &self.ledger
    }

    pub fn articles(&self) -> &ArticleRegistry<S> {
        &self.articles
    }

    pub fn locations(&self) -> &LocationRegistry<S> {
        &self.locations
    }

    /// Check a record against the configured limits.
    pub fn validate_article(&self, record: &ArticleRecord) -> Result<ArticleKind, ValidationError> {
        validate_article(record, &self.config.limits)
    }

    pub async fn find_duplicate(
        &self,
        candidate: &Article,
        inventory_id: InventoryId,
        exclude: Option<ArticleId>,
    ) -> Result<Option<Article>, EngineError> {
        Ok(self
            .resolver
            .find_duplicate(candidate, inventory_id, exclude)
            .await?
            .map(|d| d.article))
    }

    pub async fn check_global_consistency(
        &self,
        candidate: &Article,
    ) -> Result<Option<ConsistencySuggestion>, EngineError> {
        self.resolver.check_global_consistency(candidate).await
    }

    pub async fn adjust(
        &self,
        article_id: ArticleId,
        new_quantity: i64,
        mode: AdjustMode,
        note: Option<&str>,
        user_id: UserId,
    ) -> OperationOutcome {
        match self.adjuster.adjust(article_id, new_quantity, mode, note, user_id).await {
            Ok(done) => OperationOutcome {
                movement_id: done.movement_id,
                article_id: Some(done.article.id),
                ..OperationOutcome::ok(if done.delta == 0 {
                    "quantity unchanged".to_string()
                } else {
                    format!("quantity updated to {}", done.article.quantity())
                })
            },
            Err(err) => OperationOutcome::failed("adjust", &err),
        }
    }

    pub async fn transfer(&self, request: TransferRequest) -> OperationOutcome {
        let quantity = request.quantity;
        match self.transfers.transfer(request).await {
            Ok(receipt) => {
                let message = match (receipt.destination_article, receipt.merged) {
                    (None, _) => format!("{quantity} unit(s) taken out of stock"),
                    (Some(_), true) => format!("{quantity} unit(s) transferred and merged"),
                    (Some(_), false) => format!("{quantity} unit(s) transferred"),
                };
                OperationOutcome {
                    movement_id: Some(receipt.movement_id),
                    article_id: receipt.destination_article,
                    warning: receipt.warning,
                    ..OperationOutcome::ok(message)
                }
            }
            Err(err) => OperationOutcome::failed("transfer", &err),
        }
    }

    pub async fn create_article(
        &self,
        record: &ArticleRecord,
        inventory_id: InventoryId,
        user_id: UserId,
    ) -> OperationOutcome {
        match self.articles.create(record, inventory_id, user_id).await {
            Ok(created) => OperationOutcome {
                movement_id: created.movement_id,
                article_id: Some(created.article.id),
                warning: created.suggestion.map(|s| {
                    format!(
                        "code already used elsewhere with a different {}",
                        s.fields().join("/")
                    )
                }),
                ..OperationOutcome::ok(format!("'{}' created", created.article.name))
            },
            Err(err) => OperationOutcome::failed("create_article", &err),
        }
    }

    pub async fn record_edit(&self, article_id: ArticleId, changes: &ArticleChanges, user_id: UserId) -> OperationOutcome {
        match self.articles.record_edit(article_id, changes, user_id).await {
            Ok(edited) => OperationOutcome {
                movement_id: edited.movement_id,
                article_id: Some(edited.article.id),
                ..OperationOutcome::ok(match edited.kind {
                    Some(_) => "changes saved",
                    None => "no changes",
                })
            },
            Err(err) => OperationOutcome::failed("record_edit", &err),
        }
    }

    pub async fn create_location(&self, name: &str, inventory_id: Option<InventoryId>) -> OperationOutcome {
        match self.locations.create(name, inventory_id).await {
            Ok(location) => OperationOutcome {
                location_id: Some(location.id),
                ..OperationOutcome::ok(format!("location '{}' created", location.name))
            },
            Err(err) => OperationOutcome::failed("create_location", &err),
        }
    }

    pub async fn rename_location(&self, id: LocationId, name: &str) -> OperationOutcome {
        match self.locations.rename(id, name).await {
            Ok(location) => OperationOutcome {
                location_id: Some(location.id),
                ..OperationOutcome::ok(format!("location renamed to '{}'", location.name))
            },
            Err(err) => OperationOutcome::failed("rename_location", &err),
        }
    }

    pub async fn list_locations(&self, inventory_id: Option<InventoryId>) -> Result<Vec<Location>, EngineError> {
        self.locations.list(inventory_id).await
    }

    pub async fn history(&self, article_id: ArticleId) -> Result<Vec<Movement>, EngineError> {
        self.ledger.history(article_id).await
    }

    pub async fn inventory_history(&self, inventory_id: InventoryId) -> Result<Vec<Movement>, EngineError> {
        self.ledger.inventory_history(inventory_id).await
    }
}

impl<S, B> InventoryEngine<Arc<PublishingStore<S, B>>>
where
    S: DocumentStore,
    B: EventBus<EventEnvelope<StoreChange>>,
{
    /// Committed changes, in commit order, from now on.
    pub fn subscribe(&self) -> Subscription<EventEnvelope<StoreChange>> {
        self.store.bus().subscribe()
    }
}
