use groundtruth_store::StoreError;
use groundtruth_types::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid query: {0}")]
    Validation(#[from] ValidationError),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("storage error: {0}")]
    Store(StoreError),
}

impl QueryError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<StoreError> for QueryError {
    fn from(e: StoreError) -> Self {
        match e {
            err @ (StoreError::Unavailable(_) | StoreError::Backend(_)) => {
                Self::StoreUnavailable(err.to_string())
            }
            other => Self::Store(other),
        }
    }
}
