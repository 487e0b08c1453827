//! Identity resolution against the store.
//!
//! Priority, first match wins:
//!
//! 1. code in the target inventory;
//! 2. material composite key in the target inventory;
//! 3. equipment serial anywhere in the system.

use tracing::{debug, instrument};

use stockflow_core::{ArticleId, DomainError, InventoryId};
use stockflow_infra::{ArticleQuery, ArticleStore};
use stockflow_inventory::identity::{self, ConsistencySuggestion, MatchKey};
use stockflow_inventory::{Article, ArticleKind};

use crate::error::EngineError;

/// An existing article equivalent to a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Duplicate {
    pub key: MatchKey,
    pub article: Article,
}

impl Duplicate {
    /// Reason text for a blocking conflict.
    pub fn reason(&self) -> String {
        match self.key {
            MatchKey::Code => format!(
                "code '{}' is already used by '{}'",
                self.article.code.as_deref().unwrap_or_default(),
                self.article.name
            ),
            MatchKey::CompositeKey => format!(
                "'{}' ({}) already exists in this inventory; adjust its quantity instead",
                self.article.name,
                self.article.unit()
            ),
            MatchKey::Serial => format!(
                "serial '{}' is already registered",
                self.article.serial().unwrap_or_default()
            ),
        }
    }

    pub fn into_conflict(self) -> EngineError {
        let reason = self.reason();
        DomainError::duplicate(self.article.id, reason).into()
    }
}

/// Outcome of the destination check before a transfer.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferCheck {
    /// Nothing equivalent at the destination.
    Clear,
    /// A matching material exists at the destination; quantities will be merged.
    WillMerge(Article),
}

impl TransferCheck {
    pub fn warning(&self) -> Option<String> {
        match self {
            TransferCheck::Clear => None,
            TransferCheck::WillMerge(existing) => Some(format!(
                "'{}' already exists at the destination, will merge quantity",
                existing.name
            )),
        }
    }
}

/// Looks up existing articles equivalent to a candidate.
#[derive(Debug, Clone)]
pub struct IdentityResolver<S> {
    store: S,
    generic: String,
}

impl<S> IdentityResolver<S>
where
    S: ArticleStore,
{
    pub fn new(store: S, generic_label: impl Into<String>) -> Self {
        Self {
            store,
            generic: generic_label.into(),
        }
    }

    /// Find an existing article equivalent to `candidate` for `inventory_id`,
    /// ignoring `exclude` (typically the candidate itself).
    #[instrument(skip_all, fields(candidate = %candidate.id, inventory_id = %inventory_id))]
    pub async fn find_duplicate(
        &self,
        candidate: &Article,
        inventory_id: InventoryId,
        exclude: Option<ArticleId>,
    ) -> Result<Option<Duplicate>, EngineError> {
        let not_excluded = |a: &Article| Some(a.id) != exclude;

        if let Some(code) = identity::normalized(candidate.code.as_deref()) {
            let query = ArticleQuery::in_inventory(inventory_id).with_code(&code);
            let hit = self.store.query_articles(&query).await?.into_iter().find(not_excluded);
            if let Some(article) = hit {
                debug!(existing = %article.id, "code match");
                return Ok(Some(Duplicate {
                    key: MatchKey::Code,
                    article,
                }));
            }
        }

        let found = match candidate.kind() {
            ArticleKind::Material => {
                let query = ArticleQuery::in_inventory(inventory_id).of_kind(ArticleKind::Material);
                self.store
                    .query_articles(&query)
                    .await?
                    .into_iter()
                    .filter(not_excluded)
                    .find(|a| identity::composite_matches(candidate, a, &self.generic))
                    .map(|article| Duplicate {
                        key: MatchKey::CompositeKey,
                        article,
                    })
            }
            ArticleKind::Equipment => match candidate.serial() {
                Some(serial) => {
                    let query = ArticleQuery::all().of_kind(ArticleKind::Equipment).with_serial(serial);
                    self.store
                        .query_articles(&query)
                        .await?
                        .into_iter()
                        .filter(not_excluded)
                        .find(|a| identity::serial_matches(candidate, a))
                        .map(|article| Duplicate {
                            key: MatchKey::Serial,
                            article,
                        })
                }
                None => None,
            },
        };

        if let Some(dup) = &found {
            debug!(existing = %dup.article.id, key = ?dup.key, "duplicate found");
        }
        Ok(found)
    }

    /// Look for an article anywhere that shares the candidate's code but disagrees
    /// on name/brand/model. Never blocks a write.
    #[instrument(skip_all, fields(candidate = %candidate.id))]
    pub async fn check_global_consistency(
        &self,
        candidate: &Article,
    ) -> Result<Option<ConsistencySuggestion>, EngineError> {
        let Some(code) = identity::normalized(candidate.code.as_deref()) else {
            return Ok(None);
        };

        let others = self.store.query_articles(&ArticleQuery::all().with_code(&code)).await?;
        Ok(others
            .iter()
            .find_map(|reference| identity::consistency_suggestion(candidate, reference)))
    }

    /// Destination check for a transfer of `article` into `destination`.
    ///
    /// Materials only warn about an upcoming merge; an equipment serial already
    /// present at the destination is a hard conflict.
    #[instrument(skip_all, fields(article_id = %article.id, destination = %destination))]
    pub async fn check_transfer_target(
        &self,
        article: &Article,
        destination: InventoryId,
    ) -> Result<TransferCheck, EngineError> {
        match article.kind() {
            ArticleKind::Material => match self.find_duplicate(article, destination, Some(article.id)).await? {
                None => Ok(TransferCheck::Clear),
                // A code shared with equipment cannot absorb a quantity.
                Some(dup) if dup.article.is_equipment() => Err(dup.into_conflict()),
                Some(dup) => Ok(TransferCheck::WillMerge(dup.article)),
            },
            ArticleKind::Equipment => {
                let Some(serial) = article.serial() else {
                    return Ok(TransferCheck::Clear);
                };
                let query = ArticleQuery::in_inventory(destination)
                    .of_kind(ArticleKind::Equipment)
                    .with_serial(serial);
                let clash = self
                    .store
                    .query_articles(&query)
                    .await?
                    .into_iter()
                    .find(|a| a.id != article.id);
                match clash {
                    Some(existing) => Err(DomainError::duplicate(
                        existing.id,
                        format!("serial '{serial}' already exists in the destination inventory"),
                    )
                    .into()),
                    None => Ok(TransferCheck::Clear),
                }
            }
        }
    }
}
