//! Identity keys: deciding whether two article records describe the same thing.
//!
//! Three keys exist, strongest first:
//!
//! 1. **code** (SKU), scoped to one inventory;
//! 2. **composite key** for materials: name + unit, narrowed by brand/model;
//! 3. **serial** for equipment, unique across every inventory.
//!
//! This module only holds the comparisons. Scoping and priority are applied by the
//! resolver that queries the store.

use serde::{Deserialize, Serialize};

use stockflow_core::{ArticleId, InventoryId};

use crate::article::{Article, ArticleKind};

/// Brand/model value an empty field compares as.
pub const GENERIC: &str = "generic";

/// Trim and lower-case.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Normalized value, or `None` when blank.
pub fn normalized(value: Option<&str>) -> Option<String> {
    value.map(normalize).filter(|v| !v.is_empty())
}

/// Which identity key produced a match.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKey {
    Code,
    CompositeKey,
    Serial,
}

/// Both articles carry the same non-empty code.
pub fn code_matches(candidate: &Article, other: &Article) -> bool {
    match (normalized(candidate.code.as_deref()), normalized(other.code.as_deref())) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Material composite key: same name and unit; brand and model compared only when the
/// candidate has them, with an empty value on `other` standing in as `generic`.
pub fn composite_matches(candidate: &Article, other: &Article, generic: &str) -> bool {
    if candidate.kind() != ArticleKind::Material || other.kind() != ArticleKind::Material {
        return false;
    }
    if normalize(&candidate.name) != normalize(&other.name) || candidate.unit() != other.unit() {
        return false;
    }

    let generic = normalize(generic);
    let side_matches = |wanted: Option<&str>, theirs: Option<&str>| match normalized(wanted) {
        Some(wanted) => wanted == normalized(theirs).unwrap_or_else(|| generic.clone()),
        None => true,
    };

    side_matches(candidate.brand.as_deref(), other.brand.as_deref())
        && side_matches(candidate.model.as_deref(), other.model.as_deref())
}

/// Both are equipment with the same non-empty serial.
pub fn serial_matches(candidate: &Article, other: &Article) -> bool {
    match (normalized(candidate.serial()), normalized(other.serial())) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Non-blocking hint that an article elsewhere uses the same code for something that
/// looks different.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencySuggestion {
    /// Article the code already belongs to.
    pub reference: ArticleId,
    pub reference_inventory: InventoryId,
    /// Values the caller may adopt; `None` means that field already agrees.
    pub name: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
}

impl ConsistencySuggestion {
    pub fn fields(&self) -> Vec<&'static str> {
        [
            ("name", self.name.is_some()),
            ("brand", self.brand.is_some()),
            ("model", self.model.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, differs)| differs.then_some(field))
        .collect()
    }
}

/// Compare a candidate to an article sharing its code.
///
/// Returns `None` when the codes differ or the descriptive fields already agree.
pub fn consistency_suggestion(candidate: &Article, reference: &Article) -> Option<ConsistencySuggestion> {
    if candidate.id == reference.id || !code_matches(candidate, reference) {
        return None;
    }

    let differs = |a: Option<&str>, b: Option<&str>| normalized(a) != normalized(b);

    let name = differs(Some(&candidate.name), Some(&reference.name)).then(|| reference.name.clone());
    let brand = differs(candidate.brand.as_deref(), reference.brand.as_deref())
        .then(|| reference.brand.clone().unwrap_or_default());
    let model = differs(candidate.model.as_deref(), reference.model.as_deref())
        .then(|| reference.model.clone().unwrap_or_default());

    if name.is_none() && brand.is_none() && model.is_none() {
        return None;
    }

    Some(ConsistencySuggestion {
        reference: reference.id,
        reference_inventory: reference.inventory_id,
        name,
        brand,
        model,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use proptest::prelude::*;

    use super::*;
    use crate::article::ArticleRecord;
    use crate::unit::Unit;

    fn article(record: ArticleRecord) -> Article {
        Article::from_record(&record, ArticleId::new(), InventoryId::new(), Utc::now()).unwrap()
    }

    #[test]
    fn code_comparison_ignores_case_and_padding() {
        let a = article(ArticleRecord::material("Cable", 1, Unit::Metro).with_code(" cab-001 "));
        let b = article(ArticleRecord::material("Otro", 1, Unit::Caja).with_code("CAB-001"));
        assert!(code_matches(&a, &b));

        let none = article(ArticleRecord::material("Cable", 1, Unit::Metro));
        assert!(!code_matches(&none, &none.clone()));
    }

    #[test]
    fn composite_requires_name_and_unit() {
        let a = article(ArticleRecord::material("Cable UTP", 1, Unit::Metro));
        let same = article(ArticleRecord::material("  cable utp", 9, Unit::Metro));
        let other_unit = article(ArticleRecord::material("Cable UTP", 9, Unit::Rollo));
        assert!(composite_matches(&a, &same, GENERIC));
        assert!(!composite_matches(&a, &other_unit, GENERIC));
    }

    #[test]
    fn composite_filters_by_candidate_brand_and_model() {
        let branded = article(ArticleRecord::material("Cable", 1, Unit::Metro).with_brand_model("AMP", "Cat6"));
        let other_brand = article(ArticleRecord::material("Cable", 1, Unit::Metro).with_brand_model("Belden", "Cat6"));
        let unbranded = article(ArticleRecord::material("Cable", 1, Unit::Metro));
        let same = article(ArticleRecord::material("cable", 1, Unit::Metro).with_brand_model("amp", "CAT6"));

        assert!(composite_matches(&branded, &same, GENERIC));
        assert!(!composite_matches(&branded, &other_brand, GENERIC));
        assert!(!composite_matches(&branded, &unbranded, GENERIC));
        // No brand on the candidate: brand is not used to narrow.
        assert!(composite_matches(&unbranded, &branded, GENERIC));
    }

    #[test]
    fn empty_brand_compares_as_generic() {
        let generic = article(ArticleRecord::material("Cable", 1, Unit::Metro).with_brand_model("Generic", "generic"));
        let blank = article(ArticleRecord::material("Cable", 1, Unit::Metro));
        assert!(composite_matches(&generic, &blank, GENERIC));
    }

    #[test]
    fn equipment_never_matches_by_composite_key() {
        let a = article(ArticleRecord::equipment("Router", "SN1"));
        let b = article(ArticleRecord::equipment("Router", "SN2"));
        assert!(!composite_matches(&a, &b, GENERIC));
    }

    #[test]
    fn serials_compare_normalized() {
        let a = article(ArticleRecord::equipment("Router", "sn123 "));
        let b = article(ArticleRecord::equipment("AP", "SN123"));
        let m = article(ArticleRecord::material("Cable", 1, Unit::Metro));
        assert!(serial_matches(&a, &b));
        assert!(!serial_matches(&a, &m));
    }

    #[test]
    fn suggestion_lists_differing_fields() {
        let candidate = article(ArticleRecord::material("Cable", 1, Unit::Metro).with_code("CAB-001"));
        let reference = article(
            ArticleRecord::material("Cable UTP", 5, Unit::Metro)
                .with_code("cab-001")
                .with_brand_model("AMP", ""),
        );

        let s = consistency_suggestion(&candidate, &reference).unwrap();
        assert_eq!(s.reference, reference.id);
        assert_eq!(s.name.as_deref(), Some("Cable UTP"));
        assert_eq!(s.brand.as_deref(), Some("AMP"));
        assert_eq!(s.model, None);
        assert_eq!(s.fields(), vec!["name", "brand"]);
    }

    #[test]
    fn no_suggestion_when_fields_agree() {
        let candidate = article(ArticleRecord::material("Cable", 1, Unit::Metro).with_code("CAB-001"));
        let reference = article(ArticleRecord::material("CABLE ", 5, Unit::Rollo).with_code("CAB-001"));
        assert_eq!(consistency_suggestion(&candidate, &reference), None);
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "[ a-zA-Z0-9ÁÉÍÓÚñÑ_-]{0,40}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn code_match_is_symmetric(a in "[a-zA-Z0-9 -]{0,12}", b in "[a-zA-Z0-9 -]{0,12}") {
            let x = article(ArticleRecord::material("A", 1, Unit::Metro).with_code(a));
            let y = article(ArticleRecord::material("B", 1, Unit::Metro).with_code(b));
            prop_assert_eq!(code_matches(&x, &y), code_matches(&y, &x));
        }
    }
}
