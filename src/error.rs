// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::workflow::WorkflowError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Operation not permitted")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Image rejected: {0}")]
    InvalidClassification(String),

    #[error("Classification service unavailable: {0}")]
    ClassificationUnavailable(String),

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::InvalidTransition { .. } => AppError::InvalidTransition(err.to_string()),
            WorkflowError::Forbidden => AppError::Forbidden,
            WorkflowError::PreconditionFailed(msg) => AppError::PreconditionFailed(msg),
            WorkflowError::ClassificationUnavailable(msg) => {
                AppError::ClassificationUnavailable(msg)
            }
            WorkflowError::InvalidClassification(label) => AppError::InvalidClassification(label),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// HTTP status and stable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::PreconditionFailed(_) => {
                (StatusCode::PRECONDITION_REQUIRED, "precondition_failed")
            }
            AppError::InvalidTransition(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_transition")
            }
            AppError::InvalidClassification(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_classification")
            }
            AppError::ClassificationUnavailable(_) => {
                (StatusCode::BAD_GATEWAY, "classification_unavailable")
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::AlreadyExists(_) => (StatusCode::CONFLICT, "already_exists"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_code();

        let details = match &self {
            AppError::Unauthorized | AppError::InvalidToken | AppError::Forbidden => None,
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::PreconditionFailed(msg)
            | AppError::InvalidTransition(msg)
            | AppError::InvalidClassification(msg)
            | AppError::Conflict(msg)
            | AppError::AlreadyExists(msg) => Some(msg.clone()),
            AppError::ClassificationUnavailable(msg) => {
                tracing::warn!(error = %msg, "Classification service failure");
                Some(msg.clone())
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                None
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                None
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
