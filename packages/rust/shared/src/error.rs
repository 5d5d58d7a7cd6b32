//! Error types for the course importer.
//!
//! Library crates use [`CourseImportError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The failure taxonomy surfaced to callers of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportErrorKind {
    /// Invalid URL, non-2xx response, timeout, or network error.
    FetchFailed,
    /// The response was not HTML.
    UnsupportedContent,
    /// Unrecoverable extraction error.
    ParsingFailed,
    /// Unrecoverable normalization error.
    NormalizationFailed,
}

impl ImportErrorKind {
    /// Wire name of the kind, e.g. `FETCH_FAILED`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchFailed => "FETCH_FAILED",
            Self::UnsupportedContent => "UNSUPPORTED_CONTENT",
            Self::ParsingFailed => "PARSING_FAILED",
            Self::NormalizationFailed => "NORMALIZATION_FAILED",
        }
    }
}

impl std::fmt::Display for ImportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type for all importer operations.
#[derive(Debug, thiserror::Error)]
pub enum CourseImportError {
    /// An import run failed with one of the taxonomy kinds.
    #[error("{kind}: {message}")]
    Import {
        kind: ImportErrorKind,
        message: String,
    },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CourseImportError>;

impl CourseImportError {
    /// Create an import failure of the given kind.
    pub fn import(kind: ImportErrorKind, msg: impl Into<String>) -> Self {
        Self::Import {
            kind,
            message: msg.into(),
        }
    }

    /// Invalid URL, bad status, timeout, or transport failure.
    pub fn fetch_failed(msg: impl Into<String>) -> Self {
        Self::import(ImportErrorKind::FetchFailed, msg)
    }

    /// The fetched resource is not HTML.
    pub fn unsupported_content(msg: impl Into<String>) -> Self {
        Self::import(ImportErrorKind::UnsupportedContent, msg)
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The import taxonomy kind, if this error came from an import run.
    pub fn kind(&self) -> Option<ImportErrorKind> {
        match self {
            Self::Import { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = CourseImportError::fetch_failed("Received status 404 from source");
        assert_eq!(
            err.to_string(),
            "FETCH_FAILED: Received status 404 from source"
        );

        let err = CourseImportError::config("timeout_secs must be positive");
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn kind_is_exposed_for_import_errors_only() {
        let err = CourseImportError::unsupported_content("not html");
        assert_eq!(err.kind(), Some(ImportErrorKind::UnsupportedContent));

        let err = CourseImportError::config("bad");
        assert_eq!(err.kind(), None);
    }

    #[test]
    fn kind_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ImportErrorKind::NormalizationFailed).expect("serialize");
        assert_eq!(json, "\"NORMALIZATION_FAILED\"");
    }
}
