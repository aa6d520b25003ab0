//! Filesystem blob store for uploaded media.
//!
//! Files land in a single directory as `<millis>-<name>`; whatever serves
//! that directory is expected to answer under `public_base_url`.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::Arc;

use groundtruth_store::{BlobError, BlobStore};
use groundtruth_types::Clock;

/// Attempts at a fresh name before giving up on a crowded millisecond.
const MAX_NAME_ATTEMPTS: u32 = 16;

pub struct FsBlobStore {
    dir: PathBuf,
    public_base_url: String,
    clock: Arc<dyn Clock>,
}

impl FsBlobStore {
    /// Create the media directory if needed.
    pub fn new(
        dir: PathBuf,
        public_base_url: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> std::io::Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            clock,
        })
    }
}

/// Reduce a client-supplied file name to a safe single path component.
fn sanitize(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}

impl BlobStore for FsBlobStore {
    fn put(&self, bytes: &[u8], name: &str, mime_type: &str) -> Result<String, BlobError> {
        let clean = sanitize(name);
        if clean.is_empty() {
            return Err(BlobError::Rejected(format!("unusable file name {name:?}")));
        }
        let millis = self.clock.now().as_millis();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let blob_name = if attempt == 0 {
                format!("{millis}-{clean}")
            } else {
                format!("{millis}-{attempt}-{clean}")
            };
            let path = self.dir.join(&blob_name);
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(BlobError::Unavailable(e.to_string())),
            };
            if let Err(e) = file.write_all(bytes).and_then(|_| file.sync_all()) {
                let _ = std::fs::remove_file(&path);
                return Err(BlobError::Unavailable(e.to_string()));
            }
            tracing::debug!(blob = %blob_name, size = bytes.len(), mime_type, "stored media");
            return Ok(format!("{}/{}", self.public_base_url, blob_name));
        }

        Err(BlobError::Unavailable(format!(
            "no free name for {clean} at {millis}"
        )))
    }
}
