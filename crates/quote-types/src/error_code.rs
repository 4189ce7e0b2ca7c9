use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal failure of a single upload/parse attempt, as seen by the
/// presentation layer. None of these are retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Wrong file extension; raised before any parse attempt.
    UnsupportedFormat,
    /// File exceeds the byte ceiling; raised before any parse attempt.
    FileTooLarge,
    /// Bytes do not form a readable STL.
    StlUnreadable,
    /// Vertex or triangle count exceeds the processing ceiling.
    TooComplex,
    /// Reading the file or talking to the worker failed.
    UploadFailed,
    /// Anything else.
    Unknown,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 6] = [
        ErrorCode::UnsupportedFormat,
        ErrorCode::FileTooLarge,
        ErrorCode::StlUnreadable,
        ErrorCode::TooComplex,
        ErrorCode::UploadFailed,
        ErrorCode::Unknown,
    ];

    /// Wire name, e.g. `STL_UNREADABLE`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::UnsupportedFormat => "UNSUPPORTED_FORMAT",
            ErrorCode::FileTooLarge => "FILE_TOO_LARGE",
            ErrorCode::StlUnreadable => "STL_UNREADABLE",
            ErrorCode::TooComplex => "TOO_COMPLEX",
            ErrorCode::UploadFailed => "UPLOAD_FAILED",
            ErrorCode::Unknown => "UNKNOWN",
        }
    }

    /// Parse a wire name. Unrecognized names become `Unknown` so a code is
    /// never dropped on the floor.
    pub fn from_wire(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == name)
            .unwrap_or(ErrorCode::Unknown)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_serde() {
        for code in ErrorCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
            assert_eq!(ErrorCode::from_wire(code.as_str()), code);
        }
    }

    #[test]
    fn unrecognized_wire_name_is_unknown() {
        assert_eq!(ErrorCode::from_wire("NO_POSITION"), ErrorCode::Unknown);
    }
}
