use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{InventoryId, LocationId};

/// A named place where articles are kept.
///
/// Names share one global namespace even though a location may be tied to an
/// inventory; see [`crate::validation::validate_location_name`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "idInventario", default, skip_serializing_if = "Option::is_none")]
    pub inventory_id: Option<InventoryId>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Location {
    pub fn new(name: impl Into<String>, inventory_id: Option<InventoryId>, now: DateTime<Utc>) -> Self {
        Self {
            id: LocationId::new(),
            name: name.into(),
            inventory_id,
            created_at: now,
            updated_at: now,
        }
    }
}
