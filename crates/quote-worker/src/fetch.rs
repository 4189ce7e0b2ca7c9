//! Byte sources for the parse worker.
//!
//! The worker only ever sees a URL. Filesystem paths and `file://` URLs go
//! to [`FsFetcher`]; in-memory uploads are registered with a
//! [`MemoryFetcher`] under a `blob:` URL, the way a browser hands a picked
//! file to a web worker.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use quote_types::ErrorCode;
use uuid::Uuid;

pub const BLOB_SCHEME: &str = "blob:";
const FILE_SCHEME: &str = "file://";

/// Errors reading an upload's bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("no file at {url}")]
    NotFound { url: String },

    #[error("failed to read {url}: {reason}")]
    Io { url: String, reason: String },

    #[error("unsupported URL scheme: {url}")]
    UnsupportedScheme { url: String },
}

impl FetchError {
    /// Every fetch failure is a transport failure for the page.
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::UploadFailed
    }
}

/// Resolves a file URL to bytes. Implementations are shared with worker
/// threads.
pub trait FileFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

impl<F: FileFetcher + ?Sized> FileFetcher for Arc<F> {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url)
    }
}

/// Reads local files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFetcher;

impl FileFetcher for FsFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if url.starts_with(BLOB_SCHEME) {
            return Err(FetchError::UnsupportedScheme {
                url: url.to_string(),
            });
        }
        let path = url.strip_prefix(FILE_SCHEME).unwrap_or(url);
        std::fs::read(Path::new(path)).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FetchError::NotFound {
                url: url.to_string(),
            },
            _ => FetchError::Io {
                url: url.to_string(),
                reason: e.to_string(),
            },
        })
    }
}

/// Object-URL registry for uploads that only exist in memory.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    blobs: Mutex<HashMap<String, Arc<Vec<u8>>>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` and return the `blob:` URL that resolves to them.
    pub fn register(&self, bytes: Vec<u8>) -> String {
        let url = format!("{BLOB_SCHEME}{}", Uuid::new_v4());
        self.insert(url.clone(), bytes);
        url
    }

    /// Store `bytes` under a caller-chosen URL, replacing any previous entry.
    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) {
        self.lock().insert(url.into(), Arc::new(bytes));
    }

    /// Forget `url`. Returns whether it was registered.
    pub fn revoke(&self, url: &str) -> bool {
        self.lock().remove(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Vec<u8>>>> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FileFetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.lock()
            .get(url)
            .map(|bytes| bytes.as_ref().clone())
            .ok_or_else(|| FetchError::NotFound {
                url: url.to_string(),
            })
    }
}

/// Sends `blob:` URLs to an in-memory registry and everything else to a
/// fallback fetcher.
pub struct RoutingFetcher {
    blobs: Arc<MemoryFetcher>,
    fallback: Arc<dyn FileFetcher>,
}

impl RoutingFetcher {
    pub fn new(blobs: Arc<MemoryFetcher>, fallback: Arc<dyn FileFetcher>) -> Self {
        Self { blobs, fallback }
    }

    pub fn blobs(&self) -> &Arc<MemoryFetcher> {
        &self.blobs
    }
}

impl FileFetcher for RoutingFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if url.starts_with(BLOB_SCHEME) {
            self.blobs.fetch(url)
        } else {
            self.fallback.fetch(url)
        }
    }
}
