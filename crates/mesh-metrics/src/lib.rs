//! Geometric figures for print quoting: enclosed volume, surface area and
//! horizontal-facing area of a triangle mesh.

pub mod compute;
pub mod error;

pub use compute::{compute_metrics, compute_metrics_with_limits};
pub use error::MetricsError;
