//! User-facing text for each error code.

use quote_types::ErrorCode;

/// Title and next-step message shown for a failed upload.
pub fn describe(code: ErrorCode) -> (&'static str, &'static str) {
    match code {
        ErrorCode::UnsupportedFormat => (
            "Unsupported file type",
            "Only .stl files can be quoted. Export your model as STL and try again.",
        ),
        ErrorCode::FileTooLarge => (
            "File too large",
            "The file is over 50 MB. Reduce the mesh resolution or split the model.",
        ),
        ErrorCode::StlUnreadable => (
            "Cannot read STL",
            "The file is damaged or not a valid STL. Re-export it from your CAD tool.",
        ),
        ErrorCode::TooComplex => (
            "Model too complex",
            "The mesh has too many triangles to process here. Decimate it or use a desktop browser.",
        ),
        ErrorCode::UploadFailed => (
            "Upload failed",
            "The file could not be read. Check the path and try again.",
        ),
        ErrorCode::Unknown => (
            "Unexpected error",
            "Something unexpected happened while processing the file. Contact support with the file attached.",
        ),
    }
}
