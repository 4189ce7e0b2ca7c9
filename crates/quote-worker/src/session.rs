//! State behind the quote page.

use std::sync::Arc;

use pricing::{price_with_config, PricingConfig};
use quote_types::{
    ErrorCode, Material, MeshBounds, Metrics, Platform, PriceBreakdown, PricingSelection,
};
use stl_mesh::ComplexityLimits;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::QuoteConfig;
use crate::fetch::{FileFetcher, FsFetcher, MemoryFetcher, RoutingFetcher};
use crate::host::WorkerHost;
use crate::messages::WorkerResponse;
use crate::upload::UploadLimits;

/// What the page shows for the current upload.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No file picked.
    Idle,
    Processing {
        file_name: String,
        job_id: Uuid,
    },
    Ready {
        file_name: String,
        metrics: Metrics,
        bounds: MeshBounds,
    },
    Failed {
        file_name: String,
        code: ErrorCode,
    },
}

/// One quote page: an upload slot, a pricing selection and the derived
/// price. Every input change recomputes the breakdown synchronously.
pub struct QuoteSession {
    host: WorkerHost,
    blobs: Arc<MemoryFetcher>,
    upload: UploadLimits,
    pricing: PricingConfig,
    platform: Platform,
    state: SessionState,
    /// Object URL of the current in-memory upload, revoked on replacement.
    blob_url: Option<String>,
    selection: PricingSelection,
    breakdown: PriceBreakdown,
}

impl QuoteSession {
    /// A session whose non-`blob:` URLs are read from the filesystem.
    pub fn new(config: QuoteConfig, platform: Platform) -> Self {
        Self::with_fetcher(config, platform, Arc::new(FsFetcher))
    }

    /// A session whose non-`blob:` URLs go to `fetcher`.
    pub fn with_fetcher(
        config: QuoteConfig,
        platform: Platform,
        fetcher: Arc<dyn FileFetcher>,
    ) -> Self {
        let blobs = Arc::new(MemoryFetcher::new());
        let router = RoutingFetcher::new(Arc::clone(&blobs), fetcher);
        let QuoteConfig {
            upload,
            pricing,
            worker,
        } = config;
        let mut session = Self {
            host: WorkerHost::new(Arc::new(router), worker),
            blobs,
            upload,
            pricing,
            platform,
            state: SessionState::Idle,
            blob_url: None,
            selection: PricingSelection::default(),
            breakdown: PriceBreakdown::default(),
        };
        session.reprice();
        session
    }

    /// Validate a picked file and start parsing it.
    ///
    /// Rejected files never reach the worker. Either way the previous file's
    /// metrics, error and in-flight job are gone when this returns.
    pub fn accept_file(
        &mut self,
        file_name: &str,
        size: u64,
        file_url: &str,
    ) -> Result<Uuid, ErrorCode> {
        self.release_upload();
        self.check_upload(file_name, size)?;
        Ok(self.start(file_name, size, file_url))
    }

    /// [`accept_file`](Self::accept_file) for bytes already in memory. The
    /// bytes are registered under a fresh `blob:` URL owned by the session.
    pub fn accept_bytes(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<Uuid, ErrorCode> {
        self.release_upload();
        let size = bytes.len() as u64;
        self.check_upload(file_name, size)?;
        let url = self.blobs.register(bytes);
        let job_id = self.start(file_name, size, &url);
        self.blob_url = Some(url);
        Ok(job_id)
    }

    /// Drop the current file, its result and any in-flight job.
    pub fn clear_file(&mut self) {
        self.release_upload();
        self.state = SessionState::Idle;
        self.reprice();
    }

    /// Apply the worker's response if one has arrived. Returns whether the
    /// state changed.
    pub fn poll(&mut self) -> bool {
        match self.host.poll() {
            Some(response) => self.apply(response),
            None => false,
        }
    }

    /// Block until the in-flight job resolves. Returns whether the state
    /// changed.
    pub fn wait(&mut self) -> bool {
        match self.host.wait() {
            Some(response) => self.apply(response),
            None => false,
        }
    }

    pub fn set_selection(&mut self, selection: PricingSelection) {
        self.selection = selection.normalized();
        self.reprice();
    }

    pub fn set_material(&mut self, material: Material) {
        self.selection.material = material;
        self.reprice();
    }

    pub fn set_color(&mut self, color_hex: &str) {
        self.selection.color_hex = color_hex.trim().to_ascii_lowercase();
        self.reprice();
    }

    pub fn set_infill(&mut self, infill_percent: u32) {
        self.selection.infill_percent = infill_percent;
        self.selection = self.selection.normalized();
        self.reprice();
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.selection.quantity = quantity.max(1);
        self.reprice();
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn selection(&self) -> &PricingSelection {
        &self.selection
    }

    pub fn pricing(&self) -> &PriceBreakdown {
        &self.breakdown
    }

    pub fn pricing_config(&self) -> &PricingConfig {
        &self.pricing
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// The complexity ceiling uploads are parsed against.
    pub fn limits(&self) -> ComplexityLimits {
        self.host.config().limits_for(self.platform)
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.state, SessionState::Processing { .. })
    }

    pub fn file_name(&self) -> Option<&str> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Processing { file_name, .. }
            | SessionState::Ready { file_name, .. }
            | SessionState::Failed { file_name, .. } => Some(file_name),
        }
    }

    pub fn metrics(&self) -> Option<&Metrics> {
        match &self.state {
            SessionState::Ready { metrics, .. } => Some(metrics),
            _ => None,
        }
    }

    pub fn bounds(&self) -> Option<&MeshBounds> {
        match &self.state {
            SessionState::Ready { bounds, .. } => Some(bounds),
            _ => None,
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match &self.state {
            SessionState::Failed { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Responses that arrived for superseded uploads and were discarded.
    pub fn stale_results_dropped(&self) -> u64 {
        self.host.stale_dropped()
    }

    fn apply(&mut self, response: WorkerResponse) -> bool {
        let SessionState::Processing { file_name, job_id } = &self.state else {
            warn!(job_id = %response.job_id(), "response with no upload in progress");
            return false;
        };
        if *job_id != response.job_id() {
            warn!(
                expected = %job_id,
                got = %response.job_id(),
                "ignoring response for another upload"
            );
            return false;
        }
        let file_name = file_name.clone();
        self.state = match response.into_result() {
            Ok((metrics, bounds)) => SessionState::Ready {
                file_name,
                metrics,
                bounds,
            },
            Err(code) => SessionState::Failed { file_name, code },
        };
        self.reprice();
        true
    }

    fn check_upload(&mut self, file_name: &str, size: u64) -> Result<(), ErrorCode> {
        match self.upload.validate(file_name, size) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(file_name, e.error_code())),
        }
    }

    fn start(&mut self, file_name: &str, size: u64, file_url: &str) -> Uuid {
        let ticket = self.host.submit(file_url, self.platform);
        info!(file_name, size, job_id = %ticket.job_id, "accepted upload");
        self.state = SessionState::Processing {
            file_name: file_name.to_string(),
            job_id: ticket.job_id,
        };
        self.reprice();
        ticket.job_id
    }

    fn fail(&mut self, file_name: &str, code: ErrorCode) -> ErrorCode {
        self.state = SessionState::Failed {
            file_name: file_name.to_string(),
            code,
        };
        self.reprice();
        code
    }

    fn release_upload(&mut self) {
        self.host.cancel();
        if let Some(url) = self.blob_url.take() {
            self.blobs.revoke(&url);
        }
    }

    fn reprice(&mut self) {
        self.breakdown = price_with_config(self.metrics(), &self.selection, &self.pricing);
        debug!(
            final_total = self.breakdown.final_total_price,
            minimum_applied = self.breakdown.minimum_applied,
            "repriced"
        );
    }
}

impl Drop for QuoteSession {
    fn drop(&mut self) {
        self.release_upload();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TETRA: &[u8] = b"solid t
facet normal 0 0 0
outer loop
vertex 0 0 0
vertex 0 6 0
vertex 6 0 0
endloop
endfacet
facet normal 0 0 0
outer loop
vertex 0 0 0
vertex 6 0 0
vertex 0 0 6
endloop
endfacet
facet normal 0 0 0
outer loop
vertex 0 0 0
vertex 0 0 6
vertex 0 6 0
endloop
endfacet
facet normal 0 0 0
outer loop
vertex 6 0 0
vertex 0 6 0
vertex 0 0 6
endloop
endfacet
endsolid t
";

    #[test]
    fn fresh_session_prices_to_zero() {
        let session = QuoteSession::new(QuoteConfig::default(), Platform::Desktop);
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.pricing().final_total_price, 0.0);
        assert_eq!(session.pricing().gram_price_used, 5.0);
    }

    #[test]
    fn bytes_upload_reaches_ready() {
        let mut session = QuoteSession::new(QuoteConfig::default(), Platform::Desktop);
        session.accept_bytes("tetra.stl", TETRA.to_vec()).unwrap();
        assert!(session.is_processing());
        assert!(session.wait());
        let metrics = session.metrics().copied().unwrap();
        assert!((metrics.volume_mm3 - 36.0).abs() < 1e-6);
        assert_eq!(session.file_name(), Some("tetra.stl"));
        assert!(session.pricing().minimum_applied);
        assert_eq!(session.pricing().final_total_price, 200.0);
    }

    #[test]
    fn rejected_upload_clears_previous_result() {
        let mut session = QuoteSession::new(QuoteConfig::default(), Platform::Desktop);
        session.accept_bytes("tetra.stl", TETRA.to_vec()).unwrap();
        session.wait();
        assert!(session.metrics().is_some());

        let err = session.accept_bytes("tetra.obj", TETRA.to_vec()).unwrap_err();
        assert_eq!(err, ErrorCode::UnsupportedFormat);
        assert_eq!(session.error_code(), Some(ErrorCode::UnsupportedFormat));
        assert!(session.metrics().is_none());
        assert_eq!(session.pricing().final_total_price, 0.0);
    }

    #[test]
    fn clearing_revokes_blob() {
        let mut session = QuoteSession::new(QuoteConfig::default(), Platform::Desktop);
        session.accept_bytes("tetra.stl", TETRA.to_vec()).unwrap();
        assert_eq!(session.blobs.len(), 1);
        session.clear_file();
        assert!(session.blobs.is_empty());
        assert_eq!(session.state(), &SessionState::Idle);
        assert!(!session.wait());
    }

    #[test]
    fn selection_changes_reprice() {
        let mut session = QuoteSession::new(QuoteConfig::default(), Platform::Desktop);
        session.accept_bytes("tetra.stl", TETRA.to_vec()).unwrap();
        session.wait();
        let base = session.pricing().unit_price;

        session.set_color("#FF0000");
        assert!(session.pricing().color_surcharge_applied);
        assert!(session.pricing().unit_price > base);

        session.set_quantity(0);
        assert_eq!(session.selection().quantity, 1);

        session.set_infill(99);
        assert_eq!(session.selection().infill_percent, 50);

        session.set_material(Material::Asa);
        assert_eq!(session.pricing().gram_price_used, 6.5);
    }
}
