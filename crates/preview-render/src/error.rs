use quote_types::ErrorCode;
use stl_mesh::StlError;

/// Errors from the preview renderer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreviewError {
    #[error("invalid color '{value}', expected #rrggbb")]
    InvalidColor { value: String },

    #[error(transparent)]
    Load(#[from] StlError),

    #[error("geometry handle is not live")]
    UnknownGeometry,

    #[error("material handle is not live")]
    UnknownMaterial,
}

impl PreviewError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            PreviewError::Load(e) => e.error_code(),
            _ => ErrorCode::Unknown,
        }
    }
}
