use groundtruth_store::StoreError;
use groundtruth_types::UserRole;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("user {user_id} has already voted on report {report_id}")]
    DuplicateVote { report_id: String, user_id: String },

    #[error("report not found: {0}")]
    NotFound(String),

    #[error("{user} ({role}) may not vote")]
    Forbidden { user: String, role: UserRole },

    #[error("invalid consensus policy: {0}")]
    InvalidPolicy(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("storage error: {0}")]
    Store(StoreError),
}

impl VerificationError {
    /// Whether repeating the vote may succeed. A duplicate never will.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<StoreError> for VerificationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateVote { report_id, user_id } => {
                Self::DuplicateVote { report_id, user_id }
            }
            StoreError::NotFound(what) => Self::NotFound(what),
            err @ (StoreError::Unavailable(_) | StoreError::Backend(_)) => {
                Self::StoreUnavailable(err.to_string())
            }
            other => Self::Store(other),
        }
    }
}
