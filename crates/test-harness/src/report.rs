//! Structured text reports of a scripted quote run.
//!
//! Plain text rather than JSON, so a failing test can print the whole run
//! in a form that reads top to bottom.

use std::fmt;

use quote_types::{Metrics, PriceBreakdown, PricingSelection};
use quote_worker::SessionState;

use crate::oracle::OracleVerdict;
use crate::workflow::QuoteBuilder;

/// Snapshot of a quote session plus the checks run against it.
pub struct QuoteRunReport {
    pub state: SessionState,
    pub selection: PricingSelection,
    pub metrics: Option<Metrics>,
    pub breakdown: PriceBreakdown,
    pub currency: String,
    pub stale_dropped: u64,
    pub oracle_results: Vec<OracleVerdict>,
    pub history: Vec<(String, String)>,
}

impl QuoteRunReport {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("=== Quote Run Report ===\n\n");

        out.push_str(&format!("Steps ({}):\n", self.history.len()));
        for (i, (op, detail)) in self.history.iter().enumerate() {
            if detail.is_empty() {
                out.push_str(&format!("  [{}] {}\n", i, op));
            } else {
                out.push_str(&format!("  [{}] {} {}\n", i, op, detail));
            }
        }

        out.push_str(&format!("\nState: {}\n", describe_state(&self.state)));
        if self.stale_dropped > 0 {
            out.push_str(&format!("  stale results dropped: {}\n", self.stale_dropped));
        }

        if let Some(m) = &self.metrics {
            out.push_str(&format!(
                "\nMetrics: V={:.3} mm³ A={:.3} mm² H={:.3} mm²\n",
                m.volume_mm3, m.surface_area_mm2, m.horizontal_area_mm2,
            ));
        }

        let s = &self.selection;
        let b = &self.breakdown;
        out.push_str(&format!(
            "\nSelection: {} {} infill {}% x{}\n",
            s.material, s.color_hex, s.infill_percent, s.quantity,
        ));
        out.push_str(&format!(
            "Price: {:.3} g, unit {:.2}, total {:.2}, final {:.2} {}",
            b.weight_grams, b.unit_price, b.total_price, b.final_total_price, self.currency,
        ));
        if b.minimum_applied {
            out.push_str(" [MINIMUM]");
        }
        if b.color_surcharge_applied {
            out.push_str(" [SURCHARGE]");
        }
        out.push('\n');

        if !self.oracle_results.is_empty() {
            out.push_str(&format!(
                "\nOracle Results ({} checks):\n",
                self.oracle_results.len()
            ));
            for v in &self.oracle_results {
                let status = if v.passed { "PASS" } else { "FAIL" };
                out.push_str(&format!("  [{}] {}: {}\n", status, v.oracle_name, v.detail));
            }
        }

        out
    }

    pub fn all_passed(&self) -> bool {
        self.oracle_results.iter().all(|v| v.passed)
    }
}

fn describe_state(state: &SessionState) -> String {
    match state {
        SessionState::Idle => "idle".to_string(),
        SessionState::Processing { file_name, job_id } => {
            format!("processing \"{}\" (job {})", file_name, job_id)
        }
        SessionState::Ready { file_name, .. } => format!("ready \"{}\"", file_name),
        SessionState::Failed { file_name, code } => format!("failed \"{}\": {}", file_name, code),
    }
}

impl fmt::Display for QuoteRunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl QuoteBuilder {
    /// Snapshot the session and run the price oracles.
    pub fn report(&self) -> QuoteRunReport {
        let session = self.session();
        QuoteRunReport {
            state: session.state().clone(),
            selection: session.selection().clone(),
            metrics: session.metrics().copied(),
            breakdown: *session.pricing(),
            currency: session.pricing_config().currency.clone(),
            stale_dropped: session.stale_results_dropped(),
            oracle_results: self.check_price(),
            history: self.history().to_vec(),
        }
    }
}
