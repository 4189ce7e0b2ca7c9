//! Rich assertion helpers with diagnostic output.
//!
//! Every failure names the context, the expected value and what the session
//! actually holds.

use quote_types::{ErrorCode, Metrics, PriceBreakdown};
use quote_worker::{QuoteSession, SessionState};

use crate::helpers::HarnessError;

fn within(actual: f64, expected: f64, tol: f64) -> bool {
    (actual - expected).abs() <= tol * expected.abs().max(1.0)
}

/// Assert the three metric figures, each within a relative tolerance.
pub fn assert_metrics_close(
    actual: &Metrics,
    volume_mm3: f64,
    surface_area_mm2: f64,
    horizontal_area_mm2: f64,
    tol: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    if within(actual.volume_mm3, volume_mm3, tol)
        && within(actual.surface_area_mm2, surface_area_mm2, tol)
        && within(actual.horizontal_area_mm2, horizontal_area_mm2, tol)
    {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!(
                "[{}] expected V={:.4} A={:.4} H={:.4}, got V={:.4} A={:.4} H={:.4}",
                ctx,
                volume_mm3,
                surface_area_mm2,
                horizontal_area_mm2,
                actual.volume_mm3,
                actual.surface_area_mm2,
                actual.horizontal_area_mm2,
            ),
        })
    }
}

/// Assert the session is showing a result for `file_name`.
pub fn assert_ready(session: &QuoteSession, file_name: &str, ctx: &str) -> Result<(), HarnessError> {
    match session.state() {
        SessionState::Ready { file_name: f, .. } if f == file_name => Ok(()),
        other => Err(HarnessError::AssertionFailed {
            detail: format!("[{}] expected Ready for {:?}, got {:?}", ctx, file_name, other),
        }),
    }
}

/// Assert the session is showing `code` with no metrics.
pub fn assert_error_code(
    session: &QuoteSession,
    code: ErrorCode,
    ctx: &str,
) -> Result<(), HarnessError> {
    match session.error_code() {
        Some(actual) if actual == code && session.metrics().is_none() => Ok(()),
        actual => Err(HarnessError::AssertionFailed {
            detail: format!(
                "[{}] expected {}, got {:?} (state {:?})",
                ctx,
                code,
                actual,
                session.state(),
            ),
        }),
    }
}

/// Assert the displayed total, within an absolute tolerance in currency units.
pub fn assert_final_total(
    breakdown: &PriceBreakdown,
    expected: f64,
    tol: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    if (breakdown.final_total_price - expected).abs() <= tol {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!(
                "[{}] expected final total {:.2}, got {:.2} (raw total {:.2}, minimum applied: {})",
                ctx,
                expected,
                breakdown.final_total_price,
                breakdown.total_price,
                breakdown.minimum_applied,
            ),
        })
    }
}

/// Assert the weight in grams, within a relative tolerance.
pub fn assert_weight(
    breakdown: &PriceBreakdown,
    expected_grams: f64,
    tol: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    if within(breakdown.weight_grams, expected_grams, tol) {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!(
                "[{}] expected {:.4} g, got {:.4} g",
                ctx, expected_grams, breakdown.weight_grams,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_mismatch_reports_both_sides() {
        let m = Metrics {
            volume_mm3: 1000.0,
            surface_area_mm2: 600.0,
            horizontal_area_mm2: 200.0,
        };
        assert!(assert_metrics_close(&m, 1000.0, 600.0, 200.0, 1e-9, "cube").is_ok());
        let err = assert_metrics_close(&m, 999.0, 600.0, 200.0, 1e-9, "cube").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("[cube]"));
        assert!(text.contains("V=999.0000"));
        assert!(text.contains("V=1000.0000"));
    }

    #[test]
    fn final_total_uses_absolute_tolerance() {
        let b = PriceBreakdown {
            final_total_price: 200.0,
            ..PriceBreakdown::default()
        };
        assert!(assert_final_total(&b, 200.004, 0.01, "min").is_ok());
        assert!(assert_final_total(&b, 201.0, 0.01, "min").is_err());
    }
}
