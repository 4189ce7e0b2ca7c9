//! Pricing constants and the material table.

use quote_types::Material;
use serde::{Deserialize, Serialize};

/// Density and filament price of one material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialProps {
    /// g/cm³
    pub density: f64,
    /// Currency per gram.
    pub gram_price: f64,
}

/// Fixed material → properties table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialTable {
    #[serde(rename = "PLA")]
    pub pla: MaterialProps,
    #[serde(rename = "ABS")]
    pub abs: MaterialProps,
    #[serde(rename = "PETG")]
    pub petg: MaterialProps,
    #[serde(rename = "ASA")]
    pub asa: MaterialProps,
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self {
            pla: MaterialProps {
                density: 1.24,
                gram_price: 5.00,
            },
            abs: MaterialProps {
                density: 1.04,
                gram_price: 5.50,
            },
            petg: MaterialProps {
                density: 1.27,
                gram_price: 6.00,
            },
            asa: MaterialProps {
                density: 1.07,
                gram_price: 6.50,
            },
        }
    }
}

impl MaterialTable {
    pub fn get(&self, material: Material) -> MaterialProps {
        match material {
            Material::Pla => self.pla,
            Material::Abs => self.abs,
            Material::Petg => self.petg,
            Material::Asa => self.asa,
        }
    }
}

/// All constants of the shell/infill cost model.
///
/// These are tuned independently of the model's shape; change them here,
/// not in [`crate::model`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PricingConfig {
    /// Final calibration factor against real slicer output.
    pub calibration: f64,
    /// Extrusion flow multiplier.
    pub flow: f64,
    /// Fraction of the nominal infill volume actually deposited.
    pub infill_efficiency: f64,
    /// Nozzle width (mm).
    pub nozzle_mm: f64,
    /// Layer height (mm).
    pub layer_height_mm: f64,
    /// Perimeter count.
    pub walls: u32,
    pub top_layers: u32,
    pub bottom_layers: u32,
    /// Packing factor of adjacent perimeter lines.
    pub wall_packing: f64,
    /// Wall volume is capped at this fraction of the solid volume.
    pub wall_cap_fraction: f64,
    /// Unit price multiplier for colors outside `base_colors`.
    pub color_surcharge: f64,
    /// Lowercase `#rrggbb` colors exempt from the surcharge.
    pub base_colors: Vec<String>,
    /// Minimum order total.
    pub minimum_total: f64,
    /// ISO currency code used for display.
    pub currency: String,
    pub materials: MaterialTable,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            calibration: 0.61,
            flow: 1.06,
            infill_efficiency: 1.0,
            nozzle_mm: 0.4,
            layer_height_mm: 0.2,
            walls: 2,
            top_layers: 5,
            bottom_layers: 5,
            wall_packing: 0.92,
            wall_cap_fraction: 0.35,
            color_surcharge: 1.10,
            base_colors: vec!["#000000".to_string(), "#ffffff".to_string()],
            minimum_total: 200.0,
            currency: "TRY".to_string(),
            materials: MaterialTable::default(),
        }
    }
}

impl PricingConfig {
    /// Whether `color_hex` pays the color surcharge.
    pub fn is_surcharged(&self, color_hex: &str) -> bool {
        let color = color_hex.trim();
        !self
            .base_colors
            .iter()
            .any(|base| base.eq_ignore_ascii_case(color))
    }

    /// Wall thickness in centimeters.
    pub fn wall_thickness_cm(&self) -> f64 {
        self.walls as f64 * self.nozzle_mm * self.wall_packing / 10.0
    }

    /// Reject constants that would make the model produce NaN, negative or
    /// infinite prices.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("calibration", self.calibration),
            ("flow", self.flow),
            ("infillEfficiency", self.infill_efficiency),
            ("nozzleMm", self.nozzle_mm),
            ("layerHeightMm", self.layer_height_mm),
            ("wallPacking", self.wall_packing),
            ("colorSurcharge", self.color_surcharge),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value,
                });
            }
        }
        for (field, value) in [
            ("wallCapFraction", self.wall_cap_fraction),
            ("minimumTotal", self.minimum_total),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value,
                });
            }
        }
        for material in Material::ALL {
            let props = self.materials.get(material);
            for (what, value) in [("density", props.density), ("gramPrice", props.gram_price)] {
                if !value.is_finite() || value <= 0.0 {
                    return Err(ConfigError::InvalidValue {
                        field: format!("materials.{material}.{what}"),
                        value,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Errors from pricing configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid pricing constant {field}: {value}")]
    InvalidValue { field: String, value: f64 },
}
