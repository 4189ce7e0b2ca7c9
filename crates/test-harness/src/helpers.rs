//! Helper functions: error type, fixture meshes, STL byte builders and
//! scripted file fetchers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use quote_worker::{FetchError, FileFetcher};
use stl_mesh::{export_ascii_stl, export_binary_stl, TriangleMesh};

// ── Error Type ──────────────────────────────────────────────────────────────

/// Unified error type for the test harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("file not registered: {name}")]
    UnknownFile { name: String },

    #[error("upload rejected: {detail}")]
    Rejected { detail: String },

    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("oracle failure ({oracle}): {detail}")]
    OracleFailure { oracle: String, detail: String },

    #[error("STL error: {reason}")]
    StlError { reason: String },

    #[error("preview error: {0}")]
    Preview(String),
}

// ── Fixture Meshes ──────────────────────────────────────────────────────────

const BOX_INDICES: [u32; 36] = [
    0, 2, 1, 0, 3, 2, // z = min
    4, 5, 6, 4, 6, 7, // z = max
    0, 1, 5, 0, 5, 4, // y = min
    3, 7, 6, 3, 6, 2, // y = max
    0, 4, 7, 0, 7, 3, // x = min
    1, 2, 6, 1, 6, 5, // x = max
];

/// Closed axis-aligned box with one corner at the origin, outward winding.
pub fn box_mesh(sx: f32, sy: f32, sz: f32) -> TriangleMesh {
    TriangleMesh::indexed(
        vec![
            0.0, 0.0, 0.0, sx, 0.0, 0.0, sx, sy, 0.0, 0.0, sy, 0.0, //
            0.0, 0.0, sz, sx, 0.0, sz, sx, sy, sz, 0.0, sy, sz,
        ],
        BOX_INDICES.to_vec(),
    )
}

pub fn cube_mesh(edge: f32) -> TriangleMesh {
    box_mesh(edge, edge, edge)
}

/// Right tetrahedron with legs of length `leg` along X, Y, Z. Volume is
/// `leg³ / 6`.
pub fn tetra_mesh(leg: f32) -> TriangleMesh {
    TriangleMesh::indexed(
        vec![0.0, 0.0, 0.0, leg, 0.0, 0.0, 0.0, leg, 0.0, 0.0, 0.0, leg],
        vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
    )
}

// ── STL Byte Builders ───────────────────────────────────────────────────────

pub fn binary_stl(mesh: &TriangleMesh) -> Result<Vec<u8>, HarnessError> {
    export_binary_stl(mesh, "fixture").map_err(|e| HarnessError::StlError {
        reason: e.to_string(),
    })
}

pub fn ascii_stl(mesh: &TriangleMesh) -> Result<Vec<u8>, HarnessError> {
    export_ascii_stl(mesh, "fixture")
        .map(String::into_bytes)
        .map_err(|e| HarnessError::StlError {
            reason: e.to_string(),
        })
}

/// A binary STL whose header declares `declared` triangles but whose body
/// holds `actual` zeroed records. The header never starts with `solid`.
pub fn binary_with_declared_count(declared: u32, actual: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; 80];
    bytes[..7].copy_from_slice(b"fixture");
    bytes.extend_from_slice(&declared.to_le_bytes());
    bytes.resize(84 + actual * 50, 0);
    bytes
}

// ── Scripted Fetchers ───────────────────────────────────────────────────────

/// Serves registered files, optionally after a per-file delay, and counts
/// every fetch so tests can prove rejected uploads never reached the loader.
#[derive(Default)]
pub struct FixtureFetcher {
    files: Mutex<HashMap<String, FixtureFile>>,
    fetches: AtomicUsize,
}

#[derive(Clone)]
struct FixtureFile {
    bytes: Vec<u8>,
    delay: Duration,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: &str, bytes: Vec<u8>) {
        self.insert_delayed(url, bytes, Duration::ZERO);
    }

    pub fn insert_delayed(&self, url: &str, bytes: Vec<u8>, delay: Duration) {
        let mut files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        files.insert(url.to_string(), FixtureFile { bytes, delay });
    }

    pub fn size_of(&self, url: &str) -> Option<u64> {
        let files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        files.get(url).map(|f| f.bytes.len() as u64)
    }

    /// Registered bytes for `url`, without counting as a fetch.
    pub fn bytes_of(&self, url: &str) -> Option<Vec<u8>> {
        let files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        files.get(url).map(|f| f.bytes.clone())
    }

    /// Number of `fetch` calls so far, including failed ones.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl FileFetcher for FixtureFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let file = {
            let files = self.files.lock().unwrap_or_else(|e| e.into_inner());
            files.get(url).cloned()
        };
        let file = file.ok_or_else(|| FetchError::NotFound {
            url: url.to_string(),
        })?;
        if !file.delay.is_zero() {
            thread::sleep(file.delay);
        }
        Ok(file.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_metrics::compute_metrics;
    use stl_mesh::{load_stl, ComplexityLimits};

    #[test]
    fn box_fixture_is_closed() {
        let m = compute_metrics(&box_mesh(2.0, 3.0, 4.0)).unwrap();
        assert!((m.volume_mm3 - 24.0).abs() < 1e-9);
        assert!((m.surface_area_mm2 - 52.0).abs() < 1e-9);
    }

    #[test]
    fn declared_count_builder_is_unreadable() {
        let bytes = binary_with_declared_count(100, 10);
        assert_eq!(bytes.len(), 84 + 500);
        let err = load_stl(&bytes, &ComplexityLimits::desktop()).unwrap_err();
        assert_eq!(err.error_code(), quote_types::ErrorCode::StlUnreadable);
    }

    #[test]
    fn fetcher_counts_misses() {
        let fetcher = FixtureFetcher::new();
        fetcher.insert("a.stl", vec![1, 2, 3]);
        assert_eq!(fetcher.fetch("a.stl").unwrap(), vec![1, 2, 3]);
        assert!(fetcher.fetch("b.stl").is_err());
        assert_eq!(fetcher.fetch_count(), 2);
        assert_eq!(fetcher.size_of("a.stl"), Some(3));
        assert!(fetcher.bytes_of("a.stl").is_some());
        assert_eq!(fetcher.fetch_count(), 2);
    }
}
