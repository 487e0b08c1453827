use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{ArticleId, InventoryId, MovementId, UserId};

use crate::article::{Article, ArticleDetails};

/// What kind of stock-affecting event a movement records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    Entry,
    Exit,
    Transfer,
    /// Field edit that left the quantity untouched.
    Edit,
}

impl MovementKind {
    /// Entry for a positive delta, exit otherwise.
    pub fn for_delta(delta: i64) -> Self {
        if delta > 0 { MovementKind::Entry } else { MovementKind::Exit }
    }
}

/// A movement before the store has assigned its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovement {
    pub kind: MovementKind,
    pub source: Option<InventoryId>,
    pub destination: Option<InventoryId>,
    pub article_id: ArticleId,
    pub user_id: UserId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
    pub description: String,
    pub before: Option<ArticleSnapshot>,
    pub after: Option<ArticleSnapshot>,
}

impl NewMovement {
    /// A movement stamped with the current time, not tied to any inventory yet.
    pub fn new(
        kind: MovementKind,
        article_id: ArticleId,
        user_id: UserId,
        quantity: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            source: None,
            destination: None,
            article_id,
            user_id,
            quantity,
            occurred_at: Utc::now(),
            description: description.into(),
            before: None,
            after: None,
        }
    }

    pub fn from_inventory(mut self, inventory_id: InventoryId) -> Self {
        self.source = Some(inventory_id);
        self
    }

    pub fn to_inventory(mut self, inventory_id: InventoryId) -> Self {
        self.destination = Some(inventory_id);
        self
    }

    pub fn with_snapshots(mut self, before: ArticleSnapshot, after: ArticleSnapshot) -> Self {
        self.before = Some(before);
        self.after = Some(after);
        self
    }
}

/// Immutable ledger entry.
///
/// Only ever constructed by the store when a [`NewMovement`] is committed; nothing
/// updates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    #[serde(rename = "idinventario_origen", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<InventoryId>,
    #[serde(rename = "idinventario_destino", default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<InventoryId>,
    #[serde(rename = "idarticulo")]
    pub article_id: ArticleId,
    #[serde(rename = "idusuario")]
    pub user_id: UserId,
    #[serde(rename = "cantidad")]
    pub quantity: i64,
    #[serde(rename = "tipo")]
    pub kind: MovementKind,
    #[serde(rename = "fecha")]
    pub occurred_at: DateTime<Utc>,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "valoresAnteriores", default, skip_serializing_if = "Option::is_none")]
    pub before: Option<ArticleSnapshot>,
    #[serde(rename = "valoresNuevos", default, skip_serializing_if = "Option::is_none")]
    pub after: Option<ArticleSnapshot>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Movement {
    /// Stamp a pending movement with its store-assigned id.
    pub fn from_new(id: MovementId, new: NewMovement, now: DateTime<Utc>) -> Self {
        Self {
            id,
            source: new.source,
            destination: new.destination,
            article_id: new.article_id,
            user_id: new.user_id,
            quantity: new.quantity,
            kind: new.kind,
            occurred_at: new.occurred_at,
            description: new.description,
            before: new.before,
            after: new.after,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the movement touched the given inventory on either side.
    pub fn involves(&self, inventory_id: InventoryId) -> bool {
        self.source == Some(inventory_id) || self.destination == Some(inventory_id)
    }
}

/// Values of the tracked fields at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleSnapshot {
    #[serde(rename = "nombre", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "cantidad", default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(rename = "costo", default, skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<f64>,
    #[serde(rename = "ubicacion", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(rename = "wirelessKey", default, skip_serializing_if = "Option::is_none")]
    pub wireless_key: Option<String>,
    #[serde(rename = "garantia", default, skip_serializing_if = "Option::is_none")]
    pub warranty_months: Option<i64>,
    #[serde(rename = "marca", default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(rename = "modelo", default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(rename = "codigo", default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ArticleSnapshot {
    pub fn of(article: &Article) -> Self {
        let mut snap = Self {
            name: Some(article.name.clone()),
            description: article.description.clone(),
            quantity: Some(article.quantity()),
            unit_cost: Some(article.unit_cost),
            location: article.location.clone(),
            brand: article.brand.clone(),
            model: article.model.clone(),
            code: article.code.clone(),
            ..Self::default()
        };
        if let ArticleDetails::Equipment(e) = &article.details {
            snap.serial = Some(e.serial.clone());
            snap.mac = e.mac.clone();
            snap.wireless_key = e.wireless_key.clone();
            snap.warranty_months = e.warranty_months;
        }
        snap
    }

    /// Tracked fields in display order, rendered as text.
    fn tracked(&self) -> [(&'static str, Option<String>); 12] {
        [
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("quantity", self.quantity.map(|v| v.to_string())),
            ("cost", self.unit_cost.map(|v| v.to_string())),
            ("location", self.location.clone()),
            ("serial", self.serial.clone()),
            ("MAC", self.mac.clone()),
            ("wireless key", self.wireless_key.clone()),
            ("warranty", self.warranty_months.map(|v| v.to_string())),
            ("brand", self.brand.clone()),
            ("model", self.model.clone()),
            ("code", self.code.clone()),
        ]
    }
}

/// Human-readable description of an edit.
///
/// One `"field: old → new"` clause per changed tracked field, comma-joined. When
/// nothing tracked changed the description is `"edited {name}"`.
pub fn describe_edit(before: &ArticleSnapshot, after: &ArticleSnapshot) -> String {
    let clauses: Vec<String> = before
        .tracked()
        .into_iter()
        .zip(after.tracked())
        .filter(|((_, old), (_, new))| old != new)
        .map(|((label, old), (_, new))| format!("{label}: {} → {}", shown(&old), shown(&new)))
        .collect();

    if clauses.is_empty() {
        let name = after.name.as_deref().or(before.name.as_deref()).unwrap_or_default();
        format!("edited {name}")
    } else {
        clauses.join(", ")
    }
}

fn shown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(empty)")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(name: &str, quantity: i64) -> ArticleSnapshot {
        ArticleSnapshot {
            name: Some(name.to_string()),
            quantity: Some(quantity),
            ..ArticleSnapshot::default()
        }
    }

    #[test]
    fn lists_every_changed_field_in_order() {
        let before = snap("Cable", 10);
        let mut after = snap("Cable UTP", 12);
        after.location = Some("Bodega 2".into());

        assert_eq!(
            describe_edit(&before, &after),
            "name: Cable → Cable UTP, quantity: 10 → 12, location: (empty) → Bodega 2"
        );
    }

    #[test]
    fn falls_back_to_generic_description() {
        let s = snap("Switch", 1);
        assert_eq!(describe_edit(&s, &s.clone()), "edited Switch");
    }

    #[test]
    fn delta_sign_picks_kind() {
        assert_eq!(MovementKind::for_delta(3), MovementKind::Entry);
        assert_eq!(MovementKind::for_delta(-3), MovementKind::Exit);
    }

    #[test]
    fn serializes_with_ledger_field_names() {
        let m = Movement::from_new(
            MovementId::new(),
            NewMovement {
                kind: MovementKind::Transfer,
                source: Some(InventoryId::new()),
                destination: None,
                article_id: ArticleId::new(),
                user_id: UserId::new(),
                quantity: 30,
                occurred_at: Utc::now(),
                description: "to branch".into(),
                before: None,
                after: None,
            },
            Utc::now(),
        );
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["tipo"], "TRANSFER");
        assert_eq!(json["cantidad"], 30);
        assert!(json.get("idinventario_origen").is_some());
        assert!(json.get("idinventario_destino").is_none());
    }
}
