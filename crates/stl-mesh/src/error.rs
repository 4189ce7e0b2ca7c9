use quote_types::ErrorCode;

use crate::limits::ComplexityExceeded;
use crate::mesh::MeshError;

/// Errors from STL loading and export.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StlError {
    #[error("malformed STL: {reason}")]
    Malformed { reason: String },

    #[error(transparent)]
    TooComplex(#[from] ComplexityExceeded),

    #[error("invalid mesh: {0}")]
    InvalidMesh(#[from] MeshError),
}

impl StlError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        StlError::Malformed {
            reason: reason.into(),
        }
    }

    /// Presentation-layer code for this failure.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            StlError::Malformed { .. } | StlError::InvalidMesh(_) => ErrorCode::StlUnreadable,
            StlError::TooComplex(_) => ErrorCode::TooComplex,
        }
    }
}
