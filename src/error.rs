//! Error types for the RPP assistant

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("File or directory not found: {0}")]
    NotFound(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File too large: {path} ({size} bytes, limit {limit})")]
    TooLarge { path: String, size: u64, limit: u64 },

    #[error("Failed to read document: {0}")]
    ReadError(String),

    #[error("Failed to parse document: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Similarity index is empty - ingest documents first")]
    EmptyIndex,

    #[error("Embedding dimension mismatch: index has {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Generation backend error: {0}")]
    GenerationFailure(String),

    #[error("Embedding backend error: {0}")]
    EmbeddingFailure(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Failed to acquire store lock: {0}")]
    Lock(String),

    #[error("Model creation failed: {0}")]
    ModelCreation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("docs/missing.pdf".to_string());
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains("docs/missing.pdf"));
    }

    #[test]
    fn test_error_display_unsupported_type() {
        let err = Error::UnsupportedType(".xlsx".to_string());
        assert!(err.to_string().contains("Unsupported file type"));
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn test_error_display_too_large() {
        let err = Error::TooLarge {
            path: "big.pdf".to_string(),
            size: 20_000_000,
            limit: 10_485_760,
        };
        let msg = err.to_string();
        assert!(msg.contains("big.pdf"));
        assert!(msg.contains("20000000"));
        assert!(msg.contains("10485760"));
    }

    #[test]
    fn test_error_display_empty_index() {
        let err = Error::EmptyIndex;
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_error_display_dimension_mismatch() {
        let err = Error::DimensionMismatch {
            expected: 768,
            actual: 384,
        };
        let msg = err.to_string();
        assert!(msg.contains("768"));
        assert!(msg.contains("384"));
    }

    #[test]
    fn test_error_display_invalid_config() {
        let err = Error::InvalidConfig("chunk_overlap must be < chunk_size".to_string());
        assert!(err.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Persistence(_)));
        assert!(err.to_string().contains("Persistence error"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_error_display_generation_failure() {
        let err = Error::GenerationFailure("Ollama error 500: boom".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Generation backend error"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_error_all_variants_debug() {
        let variants: Vec<Error> = vec![
            Error::NotFound("x".to_string()),
            Error::UnsupportedType(".bin".to_string()),
            Error::ReadError("read".to_string()),
            Error::ParseError("parse".to_string()),
            Error::InvalidConfig("cfg".to_string()),
            Error::EmptyIndex,
            Error::GenerationFailure("gen".to_string()),
            Error::EmbeddingFailure("embed".to_string()),
            Error::Serialization("ser".to_string()),
            Error::Lock("lock".to_string()),
            Error::ModelCreation("create".to_string()),
        ];

        for err in variants {
            let debug_str = format!("{:?}", err);
            assert!(!debug_str.is_empty());
        }
    }

    #[test]
    fn test_result_type_err() {
        let result: Result<i32> = Err(Error::EmptyIndex);
        assert!(result.is_err());
    }
}
