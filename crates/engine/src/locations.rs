//! Location create/rename under one global name space.

use chrono::Utc;
use tracing::{info, instrument};

use stockflow_core::{InventoryId, LocationId};
use stockflow_infra::{DocumentStore, WriteBatch};
use stockflow_inventory::{Location, ValidationLimits, validate_location_name};

use crate::error::EngineError;

#[derive(Debug, Clone)]
pub struct LocationRegistry<S> {
    store: S,
    limits: ValidationLimits,
}

impl<S> LocationRegistry<S>
where
    S: DocumentStore,
{
    pub fn new(store: S, limits: ValidationLimits) -> Self {
        Self { store, limits }
    }

    #[instrument(skip_all, fields(name = %name, inventory_id = ?inventory_id))]
    pub async fn create(&self, name: &str, inventory_id: Option<InventoryId>) -> Result<Location, EngineError> {
        let existing = self.store.list_locations().await?;
        let name = validate_location_name(name, &existing, None, &self.limits)?;

        let location = Location::new(name, inventory_id, Utc::now());
        let id = location.id;
        let mut batch = WriteBatch::new();
        batch.insert_location(location);

        let receipt = self.store.commit(batch).await?;
        let stored = receipt.location(id).cloned().ok_or(EngineError::NotFound("location"))?;
        info!(location_id = %id, "location created");
        Ok(stored)
    }

    #[instrument(skip_all, fields(location_id = %id, name = %name))]
    pub async fn rename(&self, id: LocationId, name: &str) -> Result<Location, EngineError> {
        let mut location = self
            .store
            .get_location(id)
            .await?
            .ok_or(EngineError::NotFound("location"))?;

        let existing = self.store.list_locations().await?;
        let name = validate_location_name(name, &existing, Some(id), &self.limits)?;
        if name == location.name {
            return Ok(location);
        }

        location.name = name;
        let mut batch = WriteBatch::new();
        batch.update_location(location);

        let receipt = self.store.commit(batch).await?;
        let stored = receipt.location(id).cloned().ok_or(EngineError::NotFound("location"))?;
        info!("location renamed");
        Ok(stored)
    }

    /// Every location, oldest first. With `inventory_id`, only the ones tied to it.
    pub async fn list(&self, inventory_id: Option<InventoryId>) -> Result<Vec<Location>, EngineError> {
        let all = self.store.list_locations().await?;
        Ok(match inventory_id {
            Some(inventory_id) => all.into_iter().filter(|l| l.inventory_id == Some(inventory_id)).collect(),
            None => all,
        })
    }
}
