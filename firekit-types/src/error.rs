//! Error types for firekit paths.

use thiserror::Error;

/// Errors raised when a document or collection path is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Path was empty
    #[error("path is empty")]
    Empty,

    /// A document path needs an even number of segments
    #[error("not a document path: {0}")]
    NotADocument(String),

    /// A collection path needs an odd number of segments
    #[error("not a collection path: {0}")]
    NotACollection(String),

    /// A single segment is empty, reserved or contains a slash
    #[error("invalid path segment: {0:?}")]
    InvalidSegment(String),

    /// Path exceeds the store's size limit
    #[error("path too long: {0} bytes")]
    TooLong(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PathError::NotADocument("users".into());
        assert_eq!(err.to_string(), "not a document path: users");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PathError>();
    }
}
