use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{ArticleId, DomainError, DomainResult, InventoryId, ValidationError};

use crate::unit::Unit;

/// The two kinds of article the engine knows about.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArticleKind {
    /// Fungible stock tracked by quantity and unit of measure.
    #[serde(rename = "MATERIAL")]
    Material,
    /// Individually serialized unit; quantity is always 1.
    #[serde(rename = "EQUIPO")]
    Equipment,
}

impl ArticleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArticleKind::Material => "MATERIAL",
            ArticleKind::Equipment => "EQUIPO",
        }
    }

    /// Parse the persisted `tipo` value (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        [ArticleKind::Material, ArticleKind::Equipment]
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(raw))
    }
}

impl core::fmt::Display for ArticleKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Material-only fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialDetails {
    pub quantity: i64,
    pub unit: Unit,
    pub min_quantity: Option<i64>,
}

/// Equipment-only fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentDetails {
    pub serial: String,
    pub mac: Option<String>,
    pub wireless_key: Option<String>,
    pub warranty_months: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleDetails {
    Material(MaterialDetails),
    Equipment(EquipmentDetails),
}

/// One stock-keeping record, owned by exactly one inventory.
///
/// Persisted (and serialized) as an [`ArticleRecord`]; loading goes through
/// `TryFrom<ArticleRecord>` so a stored equipment document can never surface with a
/// quantity other than 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ArticleRecord", try_from = "ArticleRecord")]
pub struct Article {
    pub id: ArticleId,
    pub inventory_id: InventoryId,
    pub name: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub code: Option<String>,
    pub location: Option<String>,
    pub unit_cost: f64,
    pub details: ArticleDetails,
    /// Store-managed revision, bumped on every committed write.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Build an article from a validated record.
    ///
    /// Run [`crate::validation::validate_article`] first; this only re-checks the
    /// structural requirements (kind, unit, serial) it cannot do without.
    pub fn from_record(
        record: &ArticleRecord,
        id: ArticleId,
        inventory_id: InventoryId,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let kind = ArticleKind::parse(&record.kind)
            .ok_or_else(|| ValidationError::new("tipo", format!("unknown article kind '{}'", record.kind)))?;

        let details = match kind {
            ArticleKind::Material => {
                let unit = match record.unit.as_deref() {
                    Some(raw) => raw.parse::<Unit>()?,
                    None => return Err(ValidationError::new("unidad", "unit of measure is required")),
                };
                ArticleDetails::Material(MaterialDetails {
                    quantity: record.quantity.unwrap_or(0),
                    unit,
                    min_quantity: record.min_quantity,
                })
            }
            ArticleKind::Equipment => {
                let serial = clean(record.serial.as_deref())
                    .ok_or_else(|| ValidationError::new("serial", "serial is required for equipment"))?;
                ArticleDetails::Equipment(EquipmentDetails {
                    serial,
                    mac: clean(record.mac.as_deref()),
                    wireless_key: clean(record.wireless_key.as_deref()),
                    warranty_months: record.warranty_months,
                })
            }
        };

        Ok(Self {
            id,
            inventory_id,
            name: record.name.trim().to_string(),
            description: clean(record.description.as_deref()),
            brand: clean(record.brand.as_deref()),
            model: clean(record.model.as_deref()),
            code: clean(record.code.as_deref()),
            location: clean(record.location.as_deref()),
            unit_cost: record.unit_cost.unwrap_or(0.0),
            details,
            version: record.version.unwrap_or(0),
            created_at: record.created_at.unwrap_or(now),
            updated_at: record.updated_at.unwrap_or(now),
        })
    }

    pub fn kind(&self) -> ArticleKind {
        match self.details {
            ArticleDetails::Material(_) => ArticleKind::Material,
            ArticleDetails::Equipment(_) => ArticleKind::Equipment,
        }
    }

    pub fn is_equipment(&self) -> bool {
        self.kind() == ArticleKind::Equipment
    }

    /// Current stock. Always 1 for equipment.
    pub fn quantity(&self) -> i64 {
        match &self.details {
            ArticleDetails::Material(m) => m.quantity,
            ArticleDetails::Equipment(_) => 1,
        }
    }

    pub fn unit(&self) -> Unit {
        match &self.details {
            ArticleDetails::Material(m) => m.unit,
            ArticleDetails::Equipment(_) => Unit::Unidad,
        }
    }

    pub fn serial(&self) -> Option<&str> {
        match &self.details {
            ArticleDetails::Equipment(e) => Some(e.serial.as_str()),
            ArticleDetails::Material(_) => None,
        }
    }

    pub fn as_material(&self) -> Option<&MaterialDetails> {
        match &self.details {
            ArticleDetails::Material(m) => Some(m),
            ArticleDetails::Equipment(_) => None,
        }
    }

    pub fn as_equipment(&self) -> Option<&EquipmentDetails> {
        match &self.details {
            ArticleDetails::Equipment(e) => Some(e),
            ArticleDetails::Material(_) => None,
        }
    }

    /// Set the stock level, keeping the per-kind quantity invariant.
    pub fn set_quantity(&mut self, quantity: i64) -> DomainResult<()> {
        match &mut self.details {
            ArticleDetails::Material(m) => {
                if quantity < 0 {
                    return Err(DomainError::validation("cantidad", "quantity cannot be negative"));
                }
                m.quantity = quantity;
                Ok(())
            }
            ArticleDetails::Equipment(_) if quantity == 1 => Ok(()),
            ArticleDetails::Equipment(_) => Err(DomainError::validation(
                "cantidad",
                "equipment quantity is always 1",
            )),
        }
    }

    /// Move the article to another inventory (and optionally another location).
    pub fn rehome(&mut self, inventory_id: InventoryId, location: Option<String>) {
        self.inventory_id = inventory_id;
        if location.is_some() {
            self.location = location;
        }
    }

    /// The flat, persisted shape of this article.
    pub fn to_record(&self) -> ArticleRecord {
        ArticleRecord::from(self.clone())
    }
}

/// Flat persisted/input document for an article.
///
/// This is the loosely-typed shape forms submit and the document store keeps:
/// every kind-specific field is optional here. [`crate::validation::validate_article`]
/// checks it and [`Article::from_record`] turns it into the typed sum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ArticleId>,
    #[serde(rename = "idInventory", default, skip_serializing_if = "Option::is_none")]
    pub inventory_id: Option<InventoryId>,
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "cantidad", default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(rename = "unidad", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(rename = "costo", default, skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<f64>,
    #[serde(rename = "marca", default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(rename = "modelo", default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(rename = "wirelessKey", default, skip_serializing_if = "Option::is_none")]
    pub wireless_key: Option<String>,
    #[serde(rename = "garantia", default, skip_serializing_if = "Option::is_none")]
    pub warranty_months: Option<i64>,
    #[serde(rename = "cantidad_minima", default, skip_serializing_if = "Option::is_none")]
    pub min_quantity: Option<i64>,
    #[serde(rename = "ubicacion", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "codigo", default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl ArticleRecord {
    /// Input record for a new material.
    pub fn material(name: impl Into<String>, quantity: i64, unit: Unit) -> Self {
        Self {
            kind: ArticleKind::Material.as_str().to_string(),
            name: name.into(),
            quantity: Some(quantity),
            unit: Some(unit.as_str().to_string()),
            unit_cost: Some(0.0),
            ..Self::default()
        }
    }

    /// Input record for a new piece of equipment.
    pub fn equipment(name: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            kind: ArticleKind::Equipment.as_str().to_string(),
            name: name.into(),
            serial: Some(serial.into()),
            unit: Some(Unit::Unidad.as_str().to_string()),
            unit_cost: Some(0.0),
            ..Self::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_brand_model(mut self, brand: impl Into<String>, model: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self.model = Some(model.into());
        self
    }

    pub fn with_cost(mut self, unit_cost: f64) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl From<Article> for ArticleRecord {
    fn from(a: Article) -> Self {
        let mut record = ArticleRecord {
            id: Some(a.id),
            inventory_id: Some(a.inventory_id),
            kind: a.kind().as_str().to_string(),
            name: a.name,
            description: a.description,
            quantity: None,
            unit: None,
            unit_cost: Some(a.unit_cost),
            brand: a.brand,
            model: a.model,
            serial: None,
            mac: None,
            wireless_key: None,
            warranty_months: None,
            min_quantity: None,
            location: a.location,
            code: a.code,
            created_at: Some(a.created_at),
            updated_at: Some(a.updated_at),
            version: Some(a.version),
        };
        match a.details {
            ArticleDetails::Material(m) => {
                record.quantity = Some(m.quantity);
                record.unit = Some(m.unit.as_str().to_string());
                record.min_quantity = m.min_quantity;
            }
            ArticleDetails::Equipment(e) => {
                record.quantity = Some(1);
                record.unit = Some(Unit::Unidad.as_str().to_string());
                record.serial = Some(e.serial);
                record.mac = e.mac;
                record.wireless_key = e.wireless_key;
                record.warranty_months = e.warranty_months;
            }
        }
        record
    }
}

impl TryFrom<ArticleRecord> for Article {
    type Error = DomainError;

    fn try_from(record: ArticleRecord) -> Result<Self, Self::Error> {
        let id = record
            .id
            .ok_or_else(|| DomainError::validation("id", "stored article has no id"))?;
        let inventory_id = record
            .inventory_id
            .ok_or_else(|| DomainError::validation("idInventory", "stored article has no inventory"))?;
        let created_at = record
            .created_at
            .ok_or_else(|| DomainError::validation("createdAt", "stored article has no creation time"))?;

        if ArticleKind::parse(&record.kind) == Some(ArticleKind::Equipment)
            && record.quantity.is_some_and(|q| q != 1)
        {
            return Err(DomainError::validation("cantidad", "equipment quantity is always 1"));
        }

        Ok(Article::from_record(&record, id, inventory_id, created_at)?)
    }
}

/// Field patch used by edit flows.
///
/// `None` leaves a field alone. For optional text fields `Some("")` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleChanges {
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "cantidad", default)]
    pub quantity: Option<i64>,
    #[serde(rename = "unidad", default)]
    pub unit: Option<String>,
    #[serde(rename = "costo", default)]
    pub unit_cost: Option<f64>,
    #[serde(rename = "marca", default)]
    pub brand: Option<String>,
    #[serde(rename = "modelo", default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(rename = "wirelessKey", default)]
    pub wireless_key: Option<String>,
    #[serde(rename = "garantia", default)]
    pub warranty_months: Option<i64>,
    #[serde(rename = "cantidad_minima", default)]
    pub min_quantity: Option<i64>,
    #[serde(rename = "ubicacion", default)]
    pub location: Option<String>,
    #[serde(rename = "codigo", default)]
    pub code: Option<String>,
}

impl ArticleChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay the patch onto a record.
    pub fn apply_to(&self, record: &mut ArticleRecord) {
        fn set<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if let Some(v) = value {
                *target = Some(v.clone());
            }
        }

        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        set(&mut record.description, &self.description);
        set(&mut record.quantity, &self.quantity);
        set(&mut record.unit, &self.unit);
        set(&mut record.unit_cost, &self.unit_cost);
        set(&mut record.brand, &self.brand);
        set(&mut record.model, &self.model);
        set(&mut record.serial, &self.serial);
        set(&mut record.mac, &self.mac);
        set(&mut record.wireless_key, &self.wireless_key);
        set(&mut record.warranty_months, &self.warranty_months);
        set(&mut record.min_quantity, &self.min_quantity);
        set(&mut record.location, &self.location);
        set(&mut record.code, &self.code);
    }
}

/// Trim; blank becomes `None`.
fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(record: ArticleRecord) -> Article {
        Article::from_record(&record, ArticleId::new(), InventoryId::new(), Utc::now()).unwrap()
    }

    #[test]
    fn material_record_builds_material_article() {
        let a = stored(ArticleRecord::material("  Cable UTP ", 100, Unit::Metro).with_code(" "));
        assert_eq!(a.kind(), ArticleKind::Material);
        assert_eq!(a.name, "Cable UTP");
        assert_eq!(a.quantity(), 100);
        assert_eq!(a.unit(), Unit::Metro);
        assert_eq!(a.code, None);
    }

    #[test]
    fn equipment_quantity_is_always_one() {
        let mut a = stored(ArticleRecord::equipment("Router", "SN123"));
        assert_eq!(a.quantity(), 1);
        assert!(a.set_quantity(1).is_ok());
        assert!(a.set_quantity(2).is_err());
        assert_eq!(a.quantity(), 1);
    }

    #[test]
    fn material_quantity_cannot_go_negative() {
        let mut a = stored(ArticleRecord::material("Tornillo", 5, Unit::Caja));
        assert!(a.set_quantity(-1).is_err());
        assert_eq!(a.quantity(), 5);
    }

    #[test]
    fn persisted_shape_uses_document_field_names() {
        let a = stored(
            ArticleRecord::equipment("Router", "SN123")
                .with_brand_model("Mikrotik", "hAP")
                .with_location("Rack 1"),
        );
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["tipo"], "EQUIPO");
        assert_eq!(json["nombre"], "Router");
        assert_eq!(json["cantidad"], 1);
        assert_eq!(json["ubicacion"], "Rack 1");
        assert!(json.get("idInventory").is_some());

        let back: Article = serde_json::from_value(json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn stored_equipment_with_wrong_quantity_is_rejected() {
        let a = stored(ArticleRecord::equipment("Router", "SN123"));
        let mut record = a.to_record();
        record.quantity = Some(3);
        assert!(Article::try_from(record).is_err());
    }

    #[test]
    fn changes_overlay_only_set_fields() {
        let mut record = ArticleRecord::material("Cable", 10, Unit::Metro).with_brand_model("AMP", "Cat6");
        let changes = ArticleChanges {
            name: Some("Cable UTP".into()),
            model: Some("Cat6A".into()),
            ..ArticleChanges::default()
        };
        changes.apply_to(&mut record);
        assert_eq!(record.name, "Cable UTP");
        assert_eq!(record.brand.as_deref(), Some("AMP"));
        assert_eq!(record.model.as_deref(), Some("Cat6A"));
        assert_eq!(record.quantity, Some(10));
    }
}
