//! Error types for blob store operations.

use std::fmt;

/// Result type for blob store operations.
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors that can occur during blob store operations.
#[derive(Debug)]
pub enum BlobError {
    /// No blob exists under the requested key.
    NotFound { key: String },

    /// A blob already exists under the key of a conditional put.
    AlreadyExists { key: String },

    /// Invalid storage URL format or scheme.
    InvalidUrl { url: String, reason: String },

    /// Network or backend error (S3/Azure/local filesystem).
    Network { source: anyhow::Error },

    /// Generic error.
    Other { source: anyhow::Error },
}

impl fmt::Display for BlobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobError::NotFound { key } => write!(f, "blob not found: {}", key),
            BlobError::AlreadyExists { key } => write!(f, "blob already exists: {}", key),
            BlobError::InvalidUrl { url, reason } => {
                write!(f, "invalid storage url '{}': {}", url, reason)
            }
            BlobError::Network { source } => write!(f, "storage backend error: {}", source),
            BlobError::Other { source } => write!(f, "blob store error: {}", source),
        }
    }
}

impl std::error::Error for BlobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BlobError::Network { source } => Some(source.as_ref()),
            BlobError::Other { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for BlobError {
    fn from(err: anyhow::Error) -> Self {
        BlobError::Other { source: err }
    }
}

impl From<object_store::Error> for BlobError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => BlobError::NotFound { key: path },
            object_store::Error::AlreadyExists { path, .. } => {
                BlobError::AlreadyExists { key: path }
            }
            _ => BlobError::Network {
                source: anyhow::Error::from(err),
            },
        }
    }
}

impl From<url::ParseError> for BlobError {
    fn from(err: url::ParseError) -> Self {
        BlobError::InvalidUrl {
            url: String::new(),
            reason: err.to_string(),
        }
    }
}
