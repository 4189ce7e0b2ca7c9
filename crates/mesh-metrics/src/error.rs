use quote_types::ErrorCode;
use stl_mesh::{ComplexityExceeded, MeshError};

/// Errors from the metrics pass.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    #[error(transparent)]
    TooComplex(#[from] ComplexityExceeded),

    #[error("invalid mesh: {0}")]
    InvalidMesh(#[from] MeshError),
}

impl MetricsError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            MetricsError::TooComplex(_) => ErrorCode::TooComplex,
            MetricsError::InvalidMesh(_) => ErrorCode::StlUnreadable,
        }
    }
}
