//! Nullable blob store: in-memory uploads for testing.

use groundtruth_store::{BlobError, BlobStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// One recorded upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub url: String,
}

/// An in-memory blob store that can be told to fail.
pub struct NullBlobStore {
    blobs: Mutex<Vec<StoredBlob>>,
    unavailable: AtomicBool,
}

impl NullBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `put` fail with [`BlobError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Everything uploaded so far, in upload order.
    pub fn uploads(&self) -> Vec<StoredBlob> {
        self.blobs.lock().unwrap().clone()
    }
}

impl Default for NullBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for NullBlobStore {
    fn put(&self, bytes: &[u8], name: &str, mime_type: &str) -> Result<String, BlobError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BlobError::Unavailable("null blob store offline".into()));
        }
        let mut blobs = self.blobs.lock().unwrap();
        let url = format!("memory://media-uploads/{}-{}", blobs.len(), name);
        blobs.push(StoredBlob {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            bytes: bytes.to_vec(),
            url: url.clone(),
        });
        Ok(url)
    }
}
