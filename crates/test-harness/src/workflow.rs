//! QuoteBuilder, a fluent API for scripting quote-page workflows in tests.
//!
//! Wraps a real [`QuoteSession`], so uploads go through the same validation,
//! worker host and pricing as the page does. Files are registered by name
//! with a [`FixtureFetcher`] and uploaded by that name.

use std::sync::Arc;
use std::time::Duration;

use preview_render::{PreviewScene, SvgBackend};
use quote_types::{ErrorCode, Material, Platform};
use quote_worker::{QuoteConfig, QuoteSession};
use stl_mesh::load_stl;
use uuid::Uuid;

use crate::assertions;
use crate::helpers::{FixtureFetcher, HarnessError};
use crate::oracle::{self, OracleVerdict};

/// A fluent builder around one quote session.
pub struct QuoteBuilder {
    session: QuoteSession,
    files: Arc<FixtureFetcher>,
    history: Vec<(String, String)>,
}

impl QuoteBuilder {
    pub fn desktop() -> Self {
        Self::with_config(QuoteConfig::default(), Platform::Desktop)
    }

    pub fn mobile() -> Self {
        Self::with_config(QuoteConfig::default(), Platform::Mobile)
    }

    pub fn with_config(config: QuoteConfig, platform: Platform) -> Self {
        let files = Arc::new(FixtureFetcher::new());
        let session = QuoteSession::with_fetcher(config, platform, files.clone());
        Self {
            session,
            files,
            history: Vec::new(),
        }
    }

    // ── Files ───────────────────────────────────────────────────────────

    /// Register `bytes` under `name` for later uploads.
    pub fn add_file(&mut self, name: &str, bytes: Vec<u8>) -> &mut Self {
        self.files.insert(name, bytes);
        self
    }

    /// Register a file whose reads take at least `delay`.
    pub fn add_slow_file(&mut self, name: &str, bytes: Vec<u8>, delay: Duration) -> &mut Self {
        self.files.insert_delayed(name, bytes, delay);
        self
    }

    // ── Uploads ─────────────────────────────────────────────────────────

    /// Pick a registered file. The reported size is its real length.
    pub fn upload(&mut self, name: &str) -> Result<Uuid, HarnessError> {
        let size = self
            .files
            .size_of(name)
            .ok_or_else(|| HarnessError::UnknownFile {
                name: name.to_string(),
            })?;
        self.upload_claiming_size(name, size)
    }

    /// Pick a file the picker reports as `size` bytes, registered or not.
    pub fn upload_claiming_size(&mut self, name: &str, size: u64) -> Result<Uuid, HarnessError> {
        self.record("upload", format!("{} ({} bytes)", name, size));
        self.session
            .accept_file(name, size, name)
            .map_err(|code| HarnessError::Rejected {
                detail: format!("{}: {}", name, code),
            })
    }

    /// Hand in-memory bytes straight to the session.
    pub fn upload_bytes(&mut self, name: &str, bytes: Vec<u8>) -> Result<Uuid, HarnessError> {
        self.record("upload_bytes", format!("{} ({} bytes)", name, bytes.len()));
        self.session
            .accept_bytes(name, bytes)
            .map_err(|code| HarnessError::Rejected {
                detail: format!("{}: {}", name, code),
            })
    }

    /// Block until the in-flight job resolves.
    pub fn wait(&mut self) -> &mut Self {
        let changed = self.session.wait();
        self.record("wait", format!("state changed: {}", changed));
        self
    }

    /// Apply a response if one has arrived. Returns whether the state changed.
    pub fn poll(&mut self) -> bool {
        self.session.poll()
    }

    pub fn clear(&mut self) -> &mut Self {
        self.record("clear", String::new());
        self.session.clear_file();
        self
    }

    // ── Selection ───────────────────────────────────────────────────────

    pub fn material(&mut self, material: Material) -> &mut Self {
        self.record("material", material.to_string());
        self.session.set_material(material);
        self
    }

    pub fn color(&mut self, hex: &str) -> &mut Self {
        self.record("color", hex.to_string());
        self.session.set_color(hex);
        self
    }

    pub fn infill(&mut self, percent: u32) -> &mut Self {
        self.record("infill", percent.to_string());
        self.session.set_infill(percent);
        self
    }

    pub fn quantity(&mut self, quantity: u32) -> &mut Self {
        self.record("quantity", quantity.to_string());
        self.session.set_quantity(quantity);
        self
    }

    // ── Query ───────────────────────────────────────────────────────────

    pub fn session(&self) -> &QuoteSession {
        &self.session
    }

    /// How many times the loader asked for file bytes.
    pub fn fetch_count(&self) -> usize {
        self.files.fetch_count()
    }

    /// The operations performed so far, as (operation, detail) pairs.
    pub fn history(&self) -> &[(String, String)] {
        &self.history
    }

    /// Render the registered file on the preview bed as SVG.
    pub fn preview_svg(&self, name: &str) -> Result<String, HarnessError> {
        let bytes = self.registered(name)?;
        let mut scene = PreviewScene::new(SvgBackend::default(), self.session.platform())
            .with_limits(self.session.limits());
        scene
            .set_color(&self.session.selection().color_hex)
            .map_err(|e| HarnessError::Preview(e.to_string()))?;
        scene
            .load_model(&bytes)
            .map_err(|e| HarnessError::Preview(e.to_string()))?;
        scene
            .render()
            .map_err(|e| HarnessError::Preview(e.to_string()))
    }

    // ── Assertions ──────────────────────────────────────────────────────

    pub fn assert_ready(&self, name: &str) -> Result<&Self, HarnessError> {
        assertions::assert_ready(&self.session, name, "assert_ready")?;
        Ok(self)
    }

    pub fn assert_failed(&self, code: ErrorCode) -> Result<&Self, HarnessError> {
        assertions::assert_error_code(&self.session, code, "assert_failed")?;
        Ok(self)
    }

    pub fn assert_final_total(&self, expected: f64, tol: f64) -> Result<&Self, HarnessError> {
        assertions::assert_final_total(self.session.pricing(), expected, tol, "assert_final_total")?;
        Ok(self)
    }

    pub fn assert_fetch_count(&self, expected: usize) -> Result<&Self, HarnessError> {
        let actual = self.fetch_count();
        if actual == expected {
            Ok(self)
        } else {
            Err(HarnessError::AssertionFailed {
                detail: format!("expected {} fetches, got {}", expected, actual),
            })
        }
    }

    // ── Oracles ─────────────────────────────────────────────────────────

    /// Reload the registered file the way the worker does and run the mesh
    /// and metric oracles against the session's figures.
    pub fn check_mesh(&self, name: &str) -> Result<Vec<OracleVerdict>, HarnessError> {
        let bytes = self.registered(name)?;
        let metrics = self
            .session
            .metrics()
            .ok_or_else(|| HarnessError::AssertionFailed {
                detail: format!("no metrics for {} (state {:?})", name, self.session.state()),
            })?;
        let loaded = load_stl(&bytes, &self.session.limits()).map_err(|e| HarnessError::StlError {
            reason: e.to_string(),
        })?;
        Ok(oracle::run_all_metric_checks(&loaded.mesh, metrics))
    }

    pub fn check_price(&self) -> Vec<OracleVerdict> {
        oracle::run_all_price_checks(
            self.session.pricing(),
            self.session.selection(),
            self.session.pricing_config(),
        )
    }

    /// Fail with the first failing verdict, if any.
    pub fn require_all(verdicts: &[OracleVerdict]) -> Result<(), HarnessError> {
        match verdicts.iter().find(|v| !v.passed) {
            Some(v) => Err(HarnessError::OracleFailure {
                oracle: v.oracle_name.clone(),
                detail: v.detail.clone(),
            }),
            None => Ok(()),
        }
    }

    fn registered(&self, name: &str) -> Result<Vec<u8>, HarnessError> {
        self.files
            .bytes_of(name)
            .ok_or_else(|| HarnessError::UnknownFile {
                name: name.to_string(),
            })
    }

    fn record(&mut self, op: &str, detail: String) {
        self.history.push((op.to_string(), detail));
    }
}
