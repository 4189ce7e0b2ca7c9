use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lowest selectable infill percentage.
pub const MIN_INFILL_PERCENT: u32 = 10;
/// Highest selectable infill percentage.
pub const MAX_INFILL_PERCENT: u32 = 50;

/// Filament material offered for printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Material {
    #[default]
    Pla,
    Abs,
    Petg,
    Asa,
}

impl Material {
    pub const ALL: [Material; 4] = [Material::Pla, Material::Abs, Material::Petg, Material::Asa];

    pub fn as_str(self) -> &'static str {
        match self {
            Material::Pla => "PLA",
            Material::Abs => "ABS",
            Material::Petg => "PETG",
            Material::Asa => "ASA",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a material name is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown material: {0}")]
pub struct UnknownMaterial(pub String);

impl FromStr for Material {
    type Err = UnknownMaterial;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Material::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownMaterial(s.to_string()))
    }
}

/// User-selected print options. Mutable from the UI; every change triggers
/// a full, synchronous price recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSelection {
    pub material: Material,
    /// `#rrggbb`, compared case-insensitively.
    pub color_hex: String,
    /// Interior fill, 10..=50.
    pub infill_percent: u32,
    /// Number of copies, at least 1.
    pub quantity: u32,
}

impl Default for PricingSelection {
    fn default() -> Self {
        Self {
            material: Material::Pla,
            color_hex: "#000000".to_string(),
            infill_percent: 20,
            quantity: 1,
        }
    }
}

impl PricingSelection {
    /// Copy with infill clamped to its slider range and quantity to at least 1.
    pub fn normalized(&self) -> Self {
        Self {
            material: self.material,
            color_hex: self.color_hex.trim().to_ascii_lowercase(),
            infill_percent: self
                .infill_percent
                .clamp(MIN_INFILL_PERCENT, MAX_INFILL_PERCENT),
            quantity: self.quantity.max(1),
        }
    }
}

/// Derived cost figures for one metrics + selection pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub weight_grams: f64,
    pub unit_price: f64,
    pub total_price: f64,
    /// `total_price`, raised to the minimum order when that applies.
    pub final_total_price: f64,
    pub gram_price_used: f64,
    pub density_used: f64,
    pub color_surcharge_applied: bool,
    pub minimum_applied: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_parses_case_insensitively() {
        assert_eq!("petg".parse::<Material>().unwrap(), Material::Petg);
        assert_eq!(" ASA ".parse::<Material>().unwrap(), Material::Asa);
        let err = "nylon".parse::<Material>().unwrap_err();
        assert_eq!(err, UnknownMaterial("nylon".to_string()));
        assert_eq!(err.to_string(), "unknown material: nylon");
    }

    #[test]
    fn material_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Material::Pla).unwrap(), "\"PLA\"");
        let m: Material = serde_json::from_str("\"PETG\"").unwrap();
        assert_eq!(m, Material::Petg);
    }

    #[test]
    fn normalization_clamps_ranges() {
        let sel = PricingSelection {
            material: Material::Abs,
            color_hex: " #FF3B3B ".to_string(),
            infill_percent: 90,
            quantity: 0,
        };
        let n = sel.normalized();
        assert_eq!(n.infill_percent, MAX_INFILL_PERCENT);
        assert_eq!(n.quantity, 1);
        assert_eq!(n.color_hex, "#ff3b3b");

        let low = PricingSelection {
            infill_percent: 0,
            ..PricingSelection::default()
        };
        assert_eq!(low.normalized().infill_percent, MIN_INFILL_PERCENT);
    }
}
