//! Price estimation for 3D prints from mesh metrics.
//!
//! [`price`] is a pure function of [`Metrics`](quote_types::Metrics), a
//! [`PricingSelection`](quote_types::PricingSelection) and a
//! [`PricingConfig`]. It never fails: missing metrics give a zero breakdown.

pub mod config;
pub mod model;

pub use config::{ConfigError, MaterialProps, MaterialTable, PricingConfig};
pub use model::{deposited_volume, price, price_with_config, VolumeBreakdown};
