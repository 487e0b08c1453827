use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockflow_core::ValidationError;

/// Unit of measure for material stock.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Unit {
    Unidad,
    Metro,
    Kilogramo,
    Gramo,
    Litro,
    Caja,
    Paquete,
    Rollo,
    Par,
    Juego,
}

impl Unit {
    pub const ALL: [Unit; 10] = [
        Unit::Unidad,
        Unit::Metro,
        Unit::Kilogramo,
        Unit::Gramo,
        Unit::Litro,
        Unit::Caja,
        Unit::Paquete,
        Unit::Rollo,
        Unit::Par,
        Unit::Juego,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Unidad => "UNIDAD",
            Unit::Metro => "METRO",
            Unit::Kilogramo => "KILOGRAMO",
            Unit::Gramo => "GRAMO",
            Unit::Litro => "LITRO",
            Unit::Caja => "CAJA",
            Unit::Paquete => "PAQUETE",
            Unit::Rollo => "ROLLO",
            Unit::Par => "PAR",
            Unit::Juego => "JUEGO",
        }
    }
}

impl core::fmt::Display for Unit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = ValidationError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Unit::ALL
            .into_iter()
            .find(|u| u.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::new("unidad", format!("unknown unit of measure '{wanted}'")))
    }
}
