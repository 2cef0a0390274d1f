//! Store error types

use thiserror::Error;

/// Errors produced by [`Store`](crate::Store) operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {collection}/{id}")]
    NotFound { collection: &'static str, id: String },

    #[error("record already exists: {collection}/{id}")]
    AlreadyExists { collection: &'static str, id: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout this crate
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = StoreError::NotFound {
            collection: "batches",
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "record not found: batches/abc");
    }

    #[test]
    fn test_serialization_wraps() {
        let inner = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = StoreError::from(inner);
        assert!(err.to_string().starts_with("serialization error"));
    }
}
