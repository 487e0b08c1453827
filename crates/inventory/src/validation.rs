//! Business rules checked before any write.
//!
//! Every check is fail-fast: the first rule that fails is returned and the rest are
//! not evaluated.

use serde::{Deserialize, Serialize};

use stockflow_core::{DomainError, DomainResult, LocationId, ValidationError};

use crate::article::{Article, ArticleKind, ArticleRecord};
use crate::identity::normalize;
use crate::location::Location;
use crate::unit::Unit;

/// Numeric bounds for the article and location rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    pub name_max: usize,
    pub code_min: usize,
    pub code_max: usize,
    pub description_max: usize,
    pub serial_max: usize,
    pub quantity_max: i64,
    pub cost_max: f64,
    pub location_name_max: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            name_max: 200,
            code_min: 3,
            code_max: 50,
            description_max: 1000,
            serial_max: 100,
            quantity_max: 999_999,
            cost_max: 999_999_999.0,
            location_name_max: 100,
        }
    }
}

/// Check an article record against the field and per-kind rules.
///
/// Returns the parsed kind on success.
pub fn validate_article(record: &ArticleRecord, limits: &ValidationLimits) -> Result<ArticleKind, ValidationError> {
    let name_len = record.name.trim().chars().count();
    if name_len == 0 {
        return Err(ValidationError::new("nombre", "name is required"));
    }
    if name_len > limits.name_max {
        return Err(ValidationError::new(
            "nombre",
            format!("name must be at most {} characters", limits.name_max),
        ));
    }

    if let Some(code) = record.code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        let len = code.chars().count();
        if len < limits.code_min || len > limits.code_max {
            return Err(ValidationError::new(
                "codigo",
                format!(
                    "code must be between {} and {} characters",
                    limits.code_min, limits.code_max
                ),
            ));
        }
    }

    let kind = ArticleKind::parse(&record.kind).ok_or_else(|| {
        ValidationError::new("tipo", format!("unknown article kind '{}'", record.kind))
    })?;

    match kind {
        ArticleKind::Material => validate_material(record, limits)?,
        ArticleKind::Equipment => validate_equipment(record, limits)?,
    }

    if let Some(description) = &record.description {
        if description.chars().count() > limits.description_max {
            return Err(ValidationError::new(
                "descripcion",
                format!("description must be at most {} characters", limits.description_max),
            ));
        }
    }

    Ok(kind)
}

fn validate_material(record: &ArticleRecord, limits: &ValidationLimits) -> Result<(), ValidationError> {
    let quantity = record.quantity.unwrap_or(0);
    if !(0..=limits.quantity_max).contains(&quantity) {
        return Err(ValidationError::new(
            "cantidad",
            format!("quantity must be between 0 and {}", limits.quantity_max),
        ));
    }

    match record.unit.as_deref() {
        Some(raw) => {
            raw.parse::<Unit>()?;
        }
        None => return Err(ValidationError::new("unidad", "unit of measure is required")),
    }

    validate_cost(record, limits)?;

    if record.min_quantity.is_some_and(|m| m < 0) {
        return Err(ValidationError::new("cantidad_minima", "minimum quantity cannot be negative"));
    }

    Ok(())
}

fn validate_equipment(record: &ArticleRecord, limits: &ValidationLimits) -> Result<(), ValidationError> {
    let serial_len = record.serial.as_deref().map(|s| s.trim().chars().count()).unwrap_or(0);
    if serial_len == 0 {
        return Err(ValidationError::new("serial", "serial is required for equipment"));
    }
    if serial_len > limits.serial_max {
        return Err(ValidationError::new(
            "serial",
            format!("serial must be at most {} characters", limits.serial_max),
        ));
    }

    if record.quantity.is_some_and(|q| q != 1) {
        return Err(ValidationError::new("cantidad", "equipment quantity must be 1"));
    }

    validate_cost(record, limits)
}

fn validate_cost(record: &ArticleRecord, limits: &ValidationLimits) -> Result<(), ValidationError> {
    let cost = record.unit_cost.unwrap_or(0.0);
    if !cost.is_finite() || cost < 0.0 || cost > limits.cost_max {
        return Err(ValidationError::new(
            "costo",
            format!("cost must be between 0 and {}", limits.cost_max),
        ));
    }
    Ok(())
}

/// Guard for anything that takes stock out of an article (exit or transfer).
pub fn validate_exit(article: &Article, quantity: i64) -> DomainResult<()> {
    let available = article.quantity();
    match article.kind() {
        ArticleKind::Material => {
            if quantity <= 0 {
                return Err(DomainError::validation("cantidad", "quantity must be greater than 0"));
            }
            if quantity > available {
                return Err(DomainError::insufficient_stock(available, quantity));
            }
        }
        ArticleKind::Equipment => {
            if quantity != 1 {
                return Err(DomainError::validation("cantidad", "equipment moves one unit at a time"));
            }
            if available < 1 {
                return Err(DomainError::insufficient_stock(available, quantity));
            }
        }
    }
    Ok(())
}

/// Check a location name against the global namespace.
///
/// Returns the trimmed name to store.
pub fn validate_location_name(
    name: &str,
    existing: &[Location],
    exclude: Option<LocationId>,
    limits: &ValidationLimits,
) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len == 0 {
        return Err(ValidationError::new("nombre", "location name is required"));
    }
    if len > limits.location_name_max {
        return Err(ValidationError::new(
            "nombre",
            format!("location name must be at most {} characters", limits.location_name_max),
        ));
    }

    let wanted = normalize(trimmed);
    let taken = existing
        .iter()
        .filter(|l| Some(l.id) != exclude)
        .any(|l| normalize(&l.name) == wanted);
    if taken {
        return Err(ValidationError::new(
            "nombre",
            format!("a location named '{trimmed}' already exists"),
        ));
    }

    Ok(trimmed.to_string())
}
