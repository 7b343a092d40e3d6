use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::llm_client::{LlmError, TransportFailure};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant renders as `{ "error": ..., "details"?: ... }`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Completion service credential is not configured")]
    Configuration,

    #[error("Completion service returned status {status}")]
    Upstream { status: u16, body: String },

    #[error("Completion service unreachable: {0}")]
    Transport(TransportFailure),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Configuration => AppError::Configuration,
            LlmError::Upstream { status, body } => AppError::Upstream { status, body },
            LlmError::Transport(failure) => AppError::Transport(failure),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Configuration
            | AppError::Upstream { .. }
            | AppError::Transport(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, details) = match self {
            AppError::Validation(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                (msg, None)
            }
            // Completion failures are logged by the client where they occur.
            AppError::Configuration => (
                "The completion service credential is not configured".to_string(),
                None,
            ),
            AppError::Upstream { body, .. } => (
                "The completion service returned an error".to_string(),
                Some(body),
            ),
            AppError::Transport(failure) => (
                "The completion service could not be reached".to_string(),
                Some(failure.to_string()),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                ("An internal server error occurred".to_string(), None)
            }
        };

        (status, Json(ErrorBody { error, details })).into_response()
    }
}
