use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::service::AnalysisError;
use crate::document::DocumentError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Caller mistakes map to 400, upstream AI failures to 502, and anything
/// unclassified to 500. Every response carries a non-empty `detail`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(#[from] DocumentError),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn analysis_title(err: &AnalysisError) -> &'static str {
        match err {
            AnalysisError::Provider(e) if e.is_call_failure() => "AI provider call failed",
            AnalysisError::Provider(_) => "Unparsable AI provider response",
            AnalysisError::IncompleteResult(_) => "Incomplete analysis result",
            AnalysisError::MalformedResult { .. } => "Malformed analysis result",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, detail) = match &self {
            AppError::InvalidInput(msg) => {
                tracing::warn!("Rejected request: {msg}");
                (StatusCode::BAD_REQUEST, "Invalid input", msg.clone())
            }
            AppError::InvalidDocument(e) => {
                tracing::warn!("Rejected document: {e}");
                (StatusCode::BAD_REQUEST, "Invalid document", e.to_string())
            }
            AppError::Analysis(e) => {
                tracing::error!("AI analysis error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    Self::analysis_title(e),
                    format!("Analysis failed: {e}"),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    format!("An unexpected error occurred: {e}"),
                )
            }
        };

        let body = Json(json!({
            "error": error,
            "detail": detail,
        }));

        (status, body).into_response()
    }
}
