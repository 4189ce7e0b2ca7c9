//! Verification oracles: pure functions returning pass/fail verdicts.
//!
//! Each oracle returns an `OracleVerdict` with diagnostic detail, not panics.
//! This lets a test collect every failure in one pass.

use std::collections::HashMap;

use pricing::PricingConfig;
use quote_types::{Metrics, PriceBreakdown, PricingSelection};
use stl_mesh::TriangleMesh;

/// The result of a single oracle check.
#[derive(Debug, Clone)]
pub struct OracleVerdict {
    pub oracle_name: String,
    pub passed: bool,
    pub detail: String,
    pub value: Option<f64>,
}

impl OracleVerdict {
    fn pass(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: None,
        }
    }

    fn pass_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: Some(value),
        }
    }

    fn fail(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: None,
        }
    }

    fn fail_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: Some(value),
        }
    }
}

// ── Mesh Oracles ────────────────────────────────────────────────────────────

/// Check that every edge is shared by exactly two triangles, so the volume
/// figure is meaningful.
///
/// Edges are matched by quantized position (1e-4 mm), which handles
/// triangle soups where neighbors do not share vertex indices.
pub fn check_watertight_mesh(mesh: &TriangleMesh) -> OracleVerdict {
    type Key = (i64, i64, i64);

    fn vert_key(mesh: &TriangleMesh, i: usize) -> Key {
        let p = &mesh.positions[i * 3..i * 3 + 3];
        let q = |v: f32| (v as f64 * 10000.0).round() as i64;
        (q(p[0]), q(p[1]), q(p[2]))
    }

    fn make_edge(a: Key, b: Key) -> (Key, Key) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    if let Err(e) = mesh.validate() {
        return OracleVerdict::fail("watertight_mesh", format!("invalid mesh: {}", e));
    }

    let mut edge_counts: HashMap<(Key, Key), usize> = HashMap::new();
    for t in 0..mesh.triangle_count() {
        let [i0, i1, i2] = mesh.triangle(t);
        let (a, b, c) = (vert_key(mesh, i0), vert_key(mesh, i1), vert_key(mesh, i2));
        *edge_counts.entry(make_edge(a, b)).or_insert(0) += 1;
        *edge_counts.entry(make_edge(b, c)).or_insert(0) += 1;
        *edge_counts.entry(make_edge(c, a)).or_insert(0) += 1;
    }

    let unpaired = edge_counts.values().filter(|&&c| c != 2).count();
    if unpaired == 0 {
        OracleVerdict::pass(
            "watertight_mesh",
            format!("all {} edges paired", edge_counts.len()),
        )
    } else {
        OracleVerdict::fail(
            "watertight_mesh",
            format!("{} unpaired edges out of {} total", unpaired, edge_counts.len()),
        )
    }
}

/// Check that the mesh sits centered on the vertical axis.
pub fn check_horizontally_centered(mesh: &TriangleMesh) -> OracleVerdict {
    let Some(bb) = mesh.bounding_box() else {
        return OracleVerdict::fail("horizontally_centered", "mesh has no vertices".into());
    };
    let c = bb.center();
    let off = c.x.abs().max(c.z.abs());
    if off < 1e-4 {
        OracleVerdict::pass_val(
            "horizontally_centered",
            format!("center at ({:.5}, {:.5}) in XZ", c.x, c.z),
            off,
        )
    } else {
        OracleVerdict::fail_val(
            "horizontally_centered",
            format!("center at ({:.5}, {:.5}) in XZ", c.x, c.z),
            off,
        )
    }
}

// ── Metric Oracles ──────────────────────────────────────────────────────────

/// Check that all three figures are finite and non-negative.
pub fn check_metrics_finite(m: &Metrics) -> OracleVerdict {
    let figures = [m.volume_mm3, m.surface_area_mm2, m.horizontal_area_mm2];
    if figures.iter().all(|v| v.is_finite() && *v >= 0.0) {
        OracleVerdict::pass_val(
            "metrics_finite",
            format!("volume {:.4} mm³", m.volume_mm3),
            m.volume_mm3,
        )
    } else {
        OracleVerdict::fail(
            "metrics_finite",
            format!(
                "V={} A={} H={}",
                m.volume_mm3, m.surface_area_mm2, m.horizontal_area_mm2
            ),
        )
    }
}

/// Check that the horizontal-facing area never exceeds the total area.
pub fn check_horizontal_within_total(m: &Metrics) -> OracleVerdict {
    let slack = m.surface_area_mm2 * 1e-9 + 1e-9;
    let ratio = if m.surface_area_mm2 > 0.0 {
        m.horizontal_area_mm2 / m.surface_area_mm2
    } else {
        0.0
    };
    if m.horizontal_area_mm2 <= m.surface_area_mm2 + slack {
        OracleVerdict::pass_val(
            "horizontal_within_total",
            format!("horizontal share {:.4}", ratio),
            ratio,
        )
    } else {
        OracleVerdict::fail_val(
            "horizontal_within_total",
            format!(
                "horizontal {:.4} > total {:.4}",
                m.horizontal_area_mm2, m.surface_area_mm2
            ),
            ratio,
        )
    }
}

// ── Price Oracles ───────────────────────────────────────────────────────────

/// Check `total = unit × quantity`.
pub fn check_total_matches_quantity(
    b: &PriceBreakdown,
    selection: &PricingSelection,
) -> OracleVerdict {
    let qty = selection.normalized().quantity as f64;
    let expected = b.unit_price * qty;
    if (b.total_price - expected).abs() <= 1e-9 * expected.abs().max(1.0) {
        OracleVerdict::pass_val(
            "total_matches_quantity",
            format!("{:.4} × {} = {:.4}", b.unit_price, qty, b.total_price),
            b.total_price,
        )
    } else {
        OracleVerdict::fail_val(
            "total_matches_quantity",
            format!("{:.4} × {} != {:.4}", b.unit_price, qty, b.total_price),
            b.total_price,
        )
    }
}

/// Check the minimum-order rule: the floor applies exactly when the raw
/// total is positive and below the minimum.
pub fn check_minimum_rule(b: &PriceBreakdown, config: &PricingConfig) -> OracleVerdict {
    let min = config.minimum_total;
    let should_apply = b.total_price > 0.0 && b.total_price < min;
    let expected_final = if should_apply { min } else { b.total_price };
    if b.minimum_applied == should_apply && b.final_total_price == expected_final {
        OracleVerdict::pass_val(
            "minimum_rule",
            format!(
                "raw {:.2}, final {:.2}, minimum applied: {}",
                b.total_price, b.final_total_price, b.minimum_applied
            ),
            b.final_total_price,
        )
    } else {
        OracleVerdict::fail_val(
            "minimum_rule",
            format!(
                "raw {:.2} against minimum {:.2}: expected final {:.2} (applied {}), got {:.2} (applied {})",
                b.total_price,
                min,
                expected_final,
                should_apply,
                b.final_total_price,
                b.minimum_applied
            ),
            b.final_total_price,
        )
    }
}

/// Check the surcharge flag against the color: base colors never carry it.
pub fn check_surcharge_flag(
    b: &PriceBreakdown,
    selection: &PricingSelection,
    config: &PricingConfig,
) -> OracleVerdict {
    let expected = config.is_surcharged(&selection.color_hex);
    if b.color_surcharge_applied == expected {
        OracleVerdict::pass(
            "surcharge_flag",
            format!("{} surcharged: {}", selection.color_hex, expected),
        )
    } else {
        OracleVerdict::fail(
            "surcharge_flag",
            format!(
                "{} expected surcharge {}, breakdown says {}",
                selection.color_hex, expected, b.color_surcharge_applied
            ),
        )
    }
}

// ── Composite ───────────────────────────────────────────────────────────────

/// Run all applicable checks on a loaded mesh and its metrics.
pub fn run_all_metric_checks(mesh: &TriangleMesh, metrics: &Metrics) -> Vec<OracleVerdict> {
    vec![
        check_watertight_mesh(mesh),
        check_horizontally_centered(mesh),
        check_metrics_finite(metrics),
        check_horizontal_within_total(metrics),
    ]
}

/// Run all checks on a price breakdown.
pub fn run_all_price_checks(
    breakdown: &PriceBreakdown,
    selection: &PricingSelection,
    config: &PricingConfig,
) -> Vec<OracleVerdict> {
    vec![
        check_total_matches_quantity(breakdown, selection),
        check_minimum_rule(breakdown, config),
        check_surcharge_flag(breakdown, selection, config),
    ]
}
