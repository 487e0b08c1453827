//! Movement ledger: append-only record of every stock-affecting change.

use tracing::{info, instrument};

use stockflow_core::{ArticleId, DomainError, InventoryId, MovementId};
use stockflow_infra::{DocumentStore, StoreError, WriteBatch};
use stockflow_inventory::{ArticleSnapshot, Movement, NewMovement, describe_edit};

use crate::error::EngineError;

#[derive(Debug, Clone)]
pub struct MovementLedger<S> {
    store: S,
}

impl<S> MovementLedger<S>
where
    S: DocumentStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Add a movement to a batch that also carries the data change it describes.
    ///
    /// The movement lands if and only if the rest of the batch does.
    pub fn stage(&self, batch: &mut WriteBatch, movement: NewMovement) -> Result<(), EngineError> {
        check(&movement)?;
        batch.append_movement(movement);
        Ok(())
    }

    /// Record a standalone movement and return its id.
    #[instrument(skip_all, fields(article_id = %movement.article_id, kind = ?movement.kind))]
    pub async fn record(&self, movement: NewMovement) -> Result<MovementId, EngineError> {
        let mut batch = WriteBatch::new();
        self.stage(&mut batch, movement)?;
        let receipt = self.store.commit(batch).await?;
        let id = receipt
            .movement_id()
            .ok_or_else(|| StoreError::Missing("movement".into()))?;
        info!(movement_id = %id, "movement recorded");
        Ok(id)
    }

    pub async fn get(&self, id: MovementId) -> Result<Movement, EngineError> {
        self.store
            .get_movement(id)
            .await?
            .ok_or(EngineError::NotFound("movement"))
    }

    /// Every movement of one article, oldest first.
    pub async fn history(&self, article_id: ArticleId) -> Result<Vec<Movement>, EngineError> {
        let mut movements = self.store.movements_for_article(article_id).await?;
        movements.sort_by_key(|m| (m.occurred_at, m.id));
        Ok(movements)
    }

    /// Every movement into or out of an inventory, oldest first.
    pub async fn inventory_history(&self, inventory_id: InventoryId) -> Result<Vec<Movement>, EngineError> {
        let mut movements = self.store.movements_for_inventory(inventory_id).await?;
        movements.sort_by_key(|m| (m.occurred_at, m.id));
        Ok(movements)
    }

    /// Description for an edit movement.
    pub fn describe_edit(before: &ArticleSnapshot, after: &ArticleSnapshot) -> String {
        describe_edit(before, after)
    }
}

fn check(movement: &NewMovement) -> Result<(), DomainError> {
    if movement.quantity < 0 {
        return Err(DomainError::validation("cantidad", "movement quantity cannot be negative"));
    }
    if movement.description.trim().is_empty() {
        return Err(DomainError::validation("descripcion", "movement description is required"));
    }
    Ok(())
}
