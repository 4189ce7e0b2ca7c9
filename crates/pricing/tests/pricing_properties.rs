//! Scenario and property tests for the price model.

use approx::assert_relative_eq;
use pricing::{price, price_with_config, PricingConfig};
use proptest::prelude::*;
use quote_types::{Material, Metrics, PricingSelection, MAX_INFILL_PERCENT, MIN_INFILL_PERCENT};

fn cube(edge_mm: f64) -> Metrics {
    Metrics {
        volume_mm3: edge_mm.powi(3),
        surface_area_mm2: 6.0 * edge_mm * edge_mm,
        horizontal_area_mm2: 2.0 * edge_mm * edge_mm,
    }
}

#[test]
fn hundred_mm_cube_in_black_pla() {
    let p = price(Some(&cube(100.0)), &PricingSelection::default());
    assert_relative_eq!(p.weight_grams, 204.897, epsilon = 1e-3);
    assert_relative_eq!(p.unit_price, 1024.49, epsilon = 1e-2);
    assert!(!p.minimum_applied);
    assert_eq!(p.final_total_price, p.total_price);
}

#[test]
fn ten_mm_cube_is_raised_to_minimum() {
    let p = price(Some(&cube(10.0)), &PricingSelection::default());
    assert_relative_eq!(p.weight_grams, 0.6057, epsilon = 1e-3);
    assert!(p.total_price > 0.0 && p.total_price < 200.0);
    assert!(p.minimum_applied);
    assert_eq!(p.final_total_price, 200.0);
}

#[test]
fn quantity_can_lift_an_order_over_the_minimum() {
    let metrics = cube(30.0);
    let one = price(Some(&metrics), &PricingSelection::default());
    assert!(one.minimum_applied);

    let copies = (200.0 / one.unit_price).ceil() as u32 + 1;
    let many = price(
        Some(&metrics),
        &PricingSelection {
            quantity: copies,
            ..PricingSelection::default()
        },
    );
    assert!(!many.minimum_applied);
    assert_relative_eq!(many.total_price, one.unit_price * copies as f64, max_relative = 1e-12);
}

#[test]
fn white_is_exempt_from_color_surcharge() {
    let metrics = cube(50.0);
    let black = price(Some(&metrics), &PricingSelection::default());
    let white = price(
        Some(&metrics),
        &PricingSelection {
            color_hex: "#FFFFFF".to_string(),
            ..PricingSelection::default()
        },
    );
    assert_eq!(black.unit_price, white.unit_price);
    assert!(!white.color_surcharge_applied);
}

#[test]
fn custom_minimum_from_json() {
    let config: PricingConfig = serde_json::from_str(r#"{"minimumTotal": 0.0}"#).unwrap();
    config.validate().unwrap();
    let p = price_with_config(Some(&cube(10.0)), &PricingSelection::default(), &config);
    assert!(!p.minimum_applied);
    assert_eq!(p.final_total_price, p.total_price);
}

#[test]
fn out_of_range_selection_is_clamped() {
    let metrics = cube(40.0);
    let wild = PricingSelection {
        infill_percent: 95,
        quantity: 0,
        ..PricingSelection::default()
    };
    let clamped = PricingSelection {
        infill_percent: MAX_INFILL_PERCENT,
        quantity: 1,
        ..PricingSelection::default()
    };
    assert_eq!(price(Some(&metrics), &wild), price(Some(&metrics), &clamped));
}

fn arb_metrics() -> impl Strategy<Value = Metrics> {
    (1.0f64..1e6, 1.0f64..1e5, 0.0f64..1.0).prop_map(|(volume, area, h_frac)| Metrics {
        volume_mm3: volume,
        surface_area_mm2: area,
        horizontal_area_mm2: area * h_frac,
    })
}

fn arb_material() -> impl Strategy<Value = Material> {
    prop::sample::select(Material::ALL.to_vec())
}

proptest! {
    #[test]
    fn total_is_unit_times_quantity(
        metrics in arb_metrics(),
        material in arb_material(),
        quantity in 1u32..500,
    ) {
        let sel = PricingSelection { material, quantity, ..PricingSelection::default() };
        let p = price(Some(&metrics), &sel);
        prop_assert!((p.total_price - p.unit_price * quantity as f64).abs() <= 1e-9 * p.total_price.max(1.0));
        prop_assert!(p.final_total_price >= p.total_price);
        if p.minimum_applied {
            prop_assert_eq!(p.final_total_price, 200.0);
        }
    }

    #[test]
    fn more_infill_never_costs_less(
        metrics in arb_metrics(),
        lo in MIN_INFILL_PERCENT..=MAX_INFILL_PERCENT,
        hi in MIN_INFILL_PERCENT..=MAX_INFILL_PERCENT,
    ) {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let at = |infill| price(
            Some(&metrics),
            &PricingSelection { infill_percent: infill, ..PricingSelection::default() },
        );
        prop_assert!(at(lo).weight_grams <= at(hi).weight_grams);
    }

    #[test]
    fn surcharge_is_exactly_ten_percent(metrics in arb_metrics(), rgb in 1u32..0xffffff) {
        let color = format!("#{rgb:06x}");
        let black = price(Some(&metrics), &PricingSelection::default());
        let colored = price(
            Some(&metrics),
            &PricingSelection { color_hex: color, ..PricingSelection::default() },
        );
        prop_assert!(colored.color_surcharge_applied);
        prop_assert!((colored.unit_price - black.unit_price * 1.10).abs() <= 1e-9 * colored.unit_price.max(1.0));
    }
}
