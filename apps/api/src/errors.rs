#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::pipeline::PipelineError;
use crate::skills::normalize::TreeError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate resource: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Duplicate(msg) => (StatusCode::BAD_REQUEST, "DUPLICATE", msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            // Stage failures surface as-is: the message names the stage, so
            // callers can tell an extraction failure from a derivation one.
            AppError::Pipeline(e) => {
                tracing::error!("Pipeline error: {e}");
                let code = match e {
                    PipelineError::MalformedOutput { .. } => "MALFORMED_OUTPUT",
                    PipelineError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
                };
                (StatusCode::BAD_GATEWAY, code, e.to_string())
            }
            AppError::Tree(e) => {
                tracing::error!("Skill hierarchy error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CYCLIC_HIERARCHY",
                    "The persisted skill hierarchy is corrupted".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
