//! RPC error types and their JSON representation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use groundtruth_ledger::LedgerError;
use groundtruth_query::QueryError;
use groundtruth_types::ValidationError;
use groundtruth_verification::VerificationError;

/// Errors that stop the server itself.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

/// An error returned from a handler.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            retryable: false,
        }
    }

    fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    fn unavailable(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, code, message).retryable(true)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(code = self.code, message = %self.message, "request failed");
        }
        let body = ErrorBody {
            code: self.code,
            message: self.message,
            retryable: self.retryable,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        let retryable = e.is_retryable();
        let message = e.to_string();
        match e {
            LedgerError::Validation(_) => Self::bad_request(message),
            LedgerError::BlobRejected(_) => {
                Self::new(StatusCode::BAD_REQUEST, "MEDIA_REJECTED", message)
            }
            LedgerError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
            LedgerError::Forbidden { .. } => Self::forbidden(message),
            LedgerError::Conflict { .. } => {
                Self::new(StatusCode::CONFLICT, "CHAIN_CONFLICT", message).retryable(retryable)
            }
            LedgerError::StoreUnavailable(_) => Self::unavailable("STORE_UNAVAILABLE", message),
            LedgerError::BlobUnavailable(_) => Self::unavailable("BLOB_UNAVAILABLE", message),
            LedgerError::Store(_) => Self::internal(message),
        }
    }
}

impl From<VerificationError> for ApiError {
    fn from(e: VerificationError) -> Self {
        let message = e.to_string();
        match e {
            VerificationError::DuplicateVote { .. } => {
                Self::new(StatusCode::CONFLICT, "DUPLICATE_VOTE", message)
            }
            VerificationError::NotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
            }
            VerificationError::Forbidden { .. } => Self::forbidden(message),
            VerificationError::StoreUnavailable(_) => {
                Self::unavailable("STORE_UNAVAILABLE", message)
            }
            VerificationError::InvalidPolicy(_) | VerificationError::Store(_) => {
                Self::internal(message)
            }
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        let message = e.to_string();
        match e {
            QueryError::Validation(_) => Self::bad_request(message),
            QueryError::StoreUnavailable(_) => Self::unavailable("STORE_UNAVAILABLE", message),
            QueryError::Store(_) => Self::internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_is_retryable_duplicate_is_not() {
        let conflict = ApiError::from(LedgerError::Conflict { attempts: 5 });
        assert_eq!(conflict.status, StatusCode::CONFLICT);
        assert!(conflict.retryable);

        let dup = ApiError::from(VerificationError::DuplicateVote {
            report_id: "r".into(),
            user_id: "u".into(),
        });
        assert_eq!(dup.status, StatusCode::CONFLICT);
        assert!(!dup.retryable);
    }

    #[test]
    fn role_refusals_map_to_403() {
        let e = ApiError::from(LedgerError::Forbidden {
            user: "alice".into(),
            role: groundtruth_types::UserRole::Regular,
            action: "archive reports",
        });
        assert_eq!(e.status, StatusCode::FORBIDDEN);
        assert_eq!(e.code, "FORBIDDEN");
        assert_eq!(e.message, "alice (Regular) may not archive reports");
        assert!(!e.retryable);
    }

    #[test]
    fn outages_map_to_503() {
        let e = ApiError::from(LedgerError::BlobUnavailable("down".into()));
        assert_eq!(e.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(e.retryable);
    }
}
