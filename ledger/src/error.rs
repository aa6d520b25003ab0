use groundtruth_store::{BlobError, StoreError};
use groundtruth_types::{UserRole, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid submission: {0}")]
    Validation(#[from] ValidationError),

    /// The chain head kept moving until the link budget ran out.
    #[error("chain head moved during {attempts} link attempts")]
    Conflict { attempts: u32 },

    #[error("report not found: {0}")]
    NotFound(String),

    #[error("{user} ({role}) may not {action}")]
    Forbidden {
        user: String,
        role: UserRole,
        action: &'static str,
    },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("blob store unavailable: {0}")]
    BlobUnavailable(String),

    #[error("media rejected by blob store: {0}")]
    BlobRejected(String),

    #[error("storage error: {0}")]
    Store(StoreError),
}

impl LedgerError {
    /// Whether resubmitting the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Conflict { .. } | Self::StoreUnavailable(_) | Self::BlobUnavailable(_)
        )
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Conflict { .. } => Self::Conflict { attempts: 1 },
            err @ (StoreError::Unavailable(_) | StoreError::Backend(_)) => {
                Self::StoreUnavailable(err.to_string())
            }
            other => Self::Store(other),
        }
    }
}

impl From<BlobError> for LedgerError {
    fn from(e: BlobError) -> Self {
        match e {
            BlobError::Unavailable(msg) => Self::BlobUnavailable(msg),
            BlobError::Rejected(msg) => Self::BlobRejected(msg),
        }
    }
}
