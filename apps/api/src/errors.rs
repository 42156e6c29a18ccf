use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::ingest::pdf::PdfError;
use crate::llm_client::LlmError;
use crate::resume::editor::EditError;

/// The store operation that was refused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreOperation {
    Get,
    Update,
    Delete,
}

impl StoreOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOperation::Get => "get",
            StoreOperation::Update => "update",
            StoreOperation::Delete => "delete",
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Carries the document path, operation and (optionally) the request
    /// payload so the client can show what exactly was refused.
    #[error("Permission denied: {} on {path}", .operation.as_str())]
    PermissionDenied {
        path: String,
        operation: StoreOperation,
        payload: Option<Value>,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<EditError> for AppError {
    fn from(e: EditError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::Llm(e.to_string())
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Internal(anyhow::Error::new(e).context("Failed to render template"))
    }
}

impl From<PdfError> for AppError {
    fn from(e: PdfError) -> Self {
        match e {
            PdfError::NotPdf(msg) => AppError::Validation(msg),
            other => AppError::PdfExtraction(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::PermissionDenied {
                path,
                operation,
                payload,
            } => {
                tracing::warn!("Permission denied: {} on {path}", operation.as_str());
                (
                    StatusCode::FORBIDDEN,
                    "PERMISSION_DENIED",
                    "Missing or insufficient permissions".to_string(),
                    Some(json!({
                        "path": path,
                        "operation": operation.as_str(),
                        "request_resource_data": payload,
                    })),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "ANALYSIS_FAILED",
                    "Analysis failed. Please try again.".to_string(),
                    None,
                )
            }
            AppError::PdfExtraction(msg) => {
                tracing::error!("PDF extraction error: {msg}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "PDF_EXTRACTION_FAILED",
                    "Failed to extract text from PDF.".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_permission_denied_carries_context() {
        let err = AppError::PermissionDenied {
            path: "users/u1/resumes/r1".to_string(),
            operation: StoreOperation::Delete,
            payload: None,
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "PERMISSION_DENIED");
        assert_eq!(body["error"]["details"]["path"], "users/u1/resumes/r1");
        assert_eq!(body["error"]["details"]["operation"], "delete");
    }

    #[tokio::test]
    async fn test_llm_errors_are_generic() {
        let response = AppError::Llm("status 529: overloaded".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "ANALYSIS_FAILED");
        assert!(!body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("overloaded"));
    }

    #[test]
    fn test_edit_error_is_validation() {
        let err: AppError = EditError::IndexOutOfRange {
            section: "experience",
            index: 3,
            len: 1,
        }
        .into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
