//! Service and API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use enrollment_types::WorkflowError;
use serde_json::json;
use thiserror::Error;

/// Result type for service startup and lifecycle
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Top-level service failures (startup, shutdown, transport)
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request itself was malformed (bad id, bad role string)
    #[error("{0}")]
    BadRequest(String),

    /// The engine refused the operation
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Workflow(err) => match err {
                WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
                WorkflowError::UnauthorizedActor { .. } => StatusCode::FORBIDDEN,
                WorkflowError::PreconditionFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                WorkflowError::InvalidTransition { .. }
                | WorkflowError::StaleState { .. }
                | WorkflowError::TerminalState(_)
                | WorkflowError::DuplicateEnrollment { .. } => StatusCode::CONFLICT,
                WorkflowError::CollaboratorUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BadRequestError",
            Self::Workflow(err) => err.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "status": "error",
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}
