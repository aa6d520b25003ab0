//! Binary object storage for uploaded media.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob store unavailable: {0}")]
    Unavailable(String),

    #[error("blob rejected: {0}")]
    Rejected(String),
}

/// Stores a media artifact and returns a stable retrieval URL.
///
/// A returned URL is assumed durable. Implementations must pick names that
/// never overwrite an earlier upload.
pub trait BlobStore: Send + Sync {
    fn put(&self, bytes: &[u8], name: &str, mime_type: &str) -> Result<String, BlobError>;
}
