//! Error types for Brewdex

use thiserror::Error;

/// Result type alias for Brewdex storage operations
pub type Result<T> = std::result::Result<T, BrewdexError>;

/// Main error type for Brewdex
#[derive(Error, Debug)]
pub enum BrewdexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Collection '{collection}' missing from {path}")]
    MissingCollection { collection: String, path: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_collection_message() {
        let err = BrewdexError::MissingCollection {
            collection: "hops".to_string(),
            path: "/tmp/hops.json".to_string(),
        };
        assert_eq!(err.to_string(), "Collection 'hops' missing from /tmp/hops.json");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: BrewdexError = io.into();
        assert!(matches!(err, BrewdexError::Io(_)));
    }
}
