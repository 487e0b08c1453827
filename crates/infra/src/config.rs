//! Engine configuration.
//!
//! Defaults match the business rules the UI has always enforced; every value can be
//! overridden through `STOCKFLOW_*` environment variables.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use stockflow_inventory::{GENERIC, ValidationLimits};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Field length and range limits used by article/location validation.
    pub limits: ValidationLimits,
    /// Value an empty brand/model compares as in the material composite key.
    pub generic_label: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limits: ValidationLimits::default(),
            generic_label: GENERIC.to_string(),
        }
    }
}

impl EngineConfig {
    /// Load from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (tests pass a map here).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let limits = &mut config.limits;

        override_with(&lookup, "STOCKFLOW_NAME_MAX", &mut limits.name_max);
        override_with(&lookup, "STOCKFLOW_CODE_MIN", &mut limits.code_min);
        override_with(&lookup, "STOCKFLOW_CODE_MAX", &mut limits.code_max);
        override_with(&lookup, "STOCKFLOW_DESCRIPTION_MAX", &mut limits.description_max);
        override_with(&lookup, "STOCKFLOW_SERIAL_MAX", &mut limits.serial_max);
        override_with(&lookup, "STOCKFLOW_QUANTITY_MAX", &mut limits.quantity_max);
        override_with(&lookup, "STOCKFLOW_COST_MAX", &mut limits.cost_max);
        override_with(&lookup, "STOCKFLOW_LOCATION_NAME_MAX", &mut limits.location_name_max);

        if let Some(label) = lookup("STOCKFLOW_GENERIC_LABEL").filter(|v| !v.trim().is_empty()) {
            config.generic_label = label.trim().to_string();
        }

        config
    }
}

fn override_with<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut T) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => warn!(key, value = %raw, "ignoring unparsable configuration value"),
    }
}
