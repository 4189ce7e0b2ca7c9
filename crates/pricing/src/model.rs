//! Shell/infill filament model.
//!
//! The printed volume is split into three parts:
//! - top and bottom skins over the horizontal area
//! - perimeter walls over the remaining (side) area, capped relative to the
//!   solid volume so thin parts are not over-counted
//! - sparse infill of whatever core is left
//!
//! The sum is scaled by flow and calibration, converted to grams by material
//! density and priced per gram.

use quote_types::{Metrics, PriceBreakdown, PricingSelection};
use tracing::debug;

use crate::config::PricingConfig;

/// Deposited plastic, in cm³, split by region.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VolumeBreakdown {
    pub top_bottom_cm3: f64,
    pub walls_cm3: f64,
    pub infill_cm3: f64,
    /// `(top_bottom + walls + infill) * flow * calibration`
    pub total_cm3: f64,
}

/// Split the solid volume of `metrics` into skins, walls and infill.
pub fn deposited_volume(
    metrics: &Metrics,
    infill_percent: u32,
    config: &PricingConfig,
) -> VolumeBreakdown {
    let solid = metrics.volume_cm3();
    let area = metrics.surface_area_cm2();
    let horizontal = metrics.horizontal_area_cm2();

    let skin_layers = (config.top_layers + config.bottom_layers) as f64;
    let top_bottom = horizontal * skin_layers * (config.layer_height_mm / 10.0);

    let side_area = (area - horizontal).max(0.0);
    let walls = (side_area * config.wall_thickness_cm()).min(config.wall_cap_fraction * solid);

    let core = (solid - top_bottom - walls).max(0.0);
    let infill = core * (infill_percent as f64 / 100.0) * config.infill_efficiency;

    VolumeBreakdown {
        top_bottom_cm3: top_bottom,
        walls_cm3: walls,
        infill_cm3: infill,
        total_cm3: (top_bottom + walls + infill) * config.flow * config.calibration,
    }
}

/// Price `selection` for a mesh with the built-in constants.
pub fn price(metrics: Option<&Metrics>, selection: &PricingSelection) -> PriceBreakdown {
    price_with_config(metrics, selection, &PricingConfig::default())
}

/// Price `selection` for a mesh.
///
/// `selection` is normalized first (infill clamped, quantity at least 1).
/// With no metrics every amount is zero and the minimum is not applied,
/// but the gram price, density and surcharge flag still describe the
/// selection.
pub fn price_with_config(
    metrics: Option<&Metrics>,
    selection: &PricingSelection,
    config: &PricingConfig,
) -> PriceBreakdown {
    let selection = selection.normalized();
    let props = config.materials.get(selection.material);
    let surcharged = config.is_surcharged(&selection.color_hex);

    let Some(metrics) = metrics else {
        return PriceBreakdown {
            gram_price_used: props.gram_price,
            density_used: props.density,
            color_surcharge_applied: surcharged,
            ..PriceBreakdown::default()
        };
    };

    let volume = deposited_volume(metrics, selection.infill_percent, config);
    let weight = volume.total_cm3 * props.density;
    let color_factor = if surcharged { config.color_surcharge } else { 1.0 };
    let unit = weight * props.gram_price * color_factor;
    let total = unit * selection.quantity as f64;

    let minimum_applied = total > 0.0 && total < config.minimum_total;
    let final_total = if minimum_applied {
        config.minimum_total
    } else {
        total
    };

    debug!(
        material = %selection.material,
        infill = selection.infill_percent,
        quantity = selection.quantity,
        weight_grams = weight,
        total,
        minimum_applied,
        "priced selection"
    );

    PriceBreakdown {
        weight_grams: weight,
        unit_price: unit,
        total_price: total,
        final_total_price: final_total,
        gram_price_used: props.gram_price,
        density_used: props.density,
        color_surcharge_applied: surcharged,
        minimum_applied,
    }
}
