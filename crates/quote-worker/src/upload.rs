use quote_types::ErrorCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 50 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Pre-parse checks on a picked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadLimits {
    pub max_bytes: u64,
    /// Accepted extensions without the dot, compared case-insensitively.
    pub extensions: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            extensions: vec!["stl".to_string()],
        }
    }
}

/// A file rejected before the loader ran.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("{name}: only .stl files are accepted")]
    UnsupportedFormat { name: String },

    #[error("{name}: {size} bytes exceeds the {limit}-byte limit")]
    FileTooLarge { name: String, size: u64, limit: u64 },
}

impl UploadError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            UploadError::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            UploadError::FileTooLarge { .. } => ErrorCode::FileTooLarge,
        }
    }
}

impl UploadLimits {
    /// Check extension, then size. Never touches the file contents.
    pub fn validate(&self, name: &str, size: u64) -> Result<(), UploadError> {
        let accepted = name
            .rsplit_once('.')
            .map(|(_, ext)| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false);
        if !accepted {
            warn!(name, "rejected upload: unsupported extension");
            return Err(UploadError::UnsupportedFormat {
                name: name.to_string(),
            });
        }
        if size > self.max_bytes {
            warn!(name, size, limit = self.max_bytes, "rejected upload: too large");
            return Err(UploadError::FileTooLarge {
                name: name.to_string(),
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}
