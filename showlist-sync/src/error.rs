//! Error types for showlist-sync
//!
//! `SyncError` is the pipeline taxonomy. Source and candidate errors are
//! recovered where they occur; only transaction failures and run-lock
//! contention reach the caller of a pass. `ApiError` covers the read-only
//! HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Sync pipeline errors
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network failure, timeout or bad status while fetching a source
    #[error("Source '{source_name}' unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// Candidate lacks a usable name, date or venue
    #[error("Malformed candidate: {0}")]
    MalformedCandidate(String),

    /// Two different shows produced the same derived identity key
    #[error("Identity collision on '{key}': stored '{stored}', incoming '{incoming}'")]
    IdentityCollision {
        key: String,
        stored: String,
        incoming: String,
    },

    /// Store transaction could not be completed; nothing was committed
    #[error("Transaction failed: {0}")]
    TransactionFailure(#[source] sqlx::Error),

    /// Another pass holds the run lock
    #[error("Sync already running (lock held by {0})")]
    RunInProgress(String),

    /// showlist-common error
    #[error("Common error: {0}")]
    Common(#[from] showlist_common::Error),
}

impl SyncError {
    pub fn source_unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        SyncError::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Map a store error raised inside a pass to `TransactionFailure`
    pub(crate) fn from_store(err: showlist_common::Error) -> Self {
        match err {
            showlist_common::Error::Database(e) => SyncError::TransactionFailure(e),
            other => SyncError::Common(other),
        }
    }
}

/// Result type for the sync pipeline
pub type SyncResult<T> = Result<T, SyncError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// showlist-common error
    #[error("Common error: {0}")]
    Common(#[from] showlist_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
