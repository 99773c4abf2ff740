//! Error types for the docsplit ingestion pipeline.
//!
//! Per-file failures (walk, classification, encoding, timeout,
//! parse, split) are recovered inside the pipeline and turned into
//! skip records. Only configuration and root-path errors escape the
//! top-level `ingest` call.

use thiserror::Error;

/// Result type alias for docsplit operations
pub type Result<T> = std::result::Result<T, DocsplitError>;

/// Main error type for the ingestion pipeline
#[derive(Error, Debug)]
pub enum DocsplitError {
    #[error("Could not classify {0}")]
    Classification(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Parse failed: {0}")]
    Parse(String),

    #[error("Walk error: {0}")]
    Walk(String),

    #[error("Split failed: {0}")]
    Split(String),

    #[error("Batch failed: {0}")]
    BatchFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl DocsplitError {
    /// Get user-friendly error message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Check if this error only affects a single file
    ///
    /// Recoverable errors skip the offending file and let the run
    /// continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DocsplitError::Classification(_)
                | DocsplitError::Encoding(_)
                | DocsplitError::Timeout(_)
                | DocsplitError::Parse(_)
                | DocsplitError::Walk(_)
                | DocsplitError::Split(_)
                | DocsplitError::BatchFailed(_)
                | DocsplitError::IoError(_)
        )
    }

    /// Check if this is a caller error detected before any work
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            DocsplitError::ConfigError(_) | DocsplitError::InvalidPath(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_is_recoverable() {
        let err = DocsplitError::Encoding("latin.txt".to_string());
        assert!(err.is_recoverable());
        assert!(!err.is_bad_request());
    }

    #[test]
    fn test_config_error_is_bad_request() {
        let err = DocsplitError::ConfigError("max_workers must be >= 1".to_string());
        assert!(err.is_bad_request());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_invalid_path_is_bad_request() {
        let err = DocsplitError::InvalidPath("/does/not/exist".to_string());
        assert!(err.is_bad_request());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = DocsplitError::from(io_err);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_error_message() {
        let err = DocsplitError::Timeout("encoding detection for big.txt".to_string());
        assert!(err.message().contains("big.txt"));
        assert!(err.message().starts_with("Timed out"));
    }
}
