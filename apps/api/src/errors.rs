use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// The variants follow the pipeline's failure taxonomy: input rejection,
/// extraction failure, remote-call failure, response-format failure,
/// insufficient-credit rejection, and webhook trust failure. Nothing here is
/// allowed to escape a handler as a panic.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The document yielded too little text to be a digital CV.
    /// Distinct from a generic failure so the client can show an actionable message.
    #[error("Document appears to be scanned or image-only")]
    ScannedDocument,

    #[error("Insufficient credits: {required} required, {available} available")]
    InsufficientCredits { required: i32, available: i32 },

    /// Remote model call failed (network or non-success status). Retryable.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Remote model answered, but the reply contained no parseable JSON object.
    /// Kept separate from `Llm` so the two failure modes are distinguishable in logs.
    #[error("LLM response format error: {0}")]
    LlmFormat(String),

    #[error("Payment provider error: {0}")]
    Payment(String),

    /// Webhook payload failed signature verification or lacked required metadata.
    /// Must never be partially processed.
    #[error("Webhook rejected: {0}")]
    WebhookRejected(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Not implemented")]
    NotImplemented,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnsupportedFormat(msg) => (
                StatusCode::BAD_REQUEST,
                "UNSUPPORTED_FORMAT",
                format!("Unsupported file format: {msg}. Use PDF or DOCX."),
            ),
            AppError::ScannedDocument => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "SCANNED_DOCUMENT",
                "This PDF appears to be scanned or image-only. Please upload a CV with selectable text."
                    .to_string(),
            ),
            AppError::InsufficientCredits {
                required,
                available,
            } => (
                StatusCode::PAYMENT_REQUIRED,
                "INSUFFICIENT_CREDITS",
                format!("Insufficient credits ({required} required, {available} available)"),
            ),
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred. Please try again.".to_string(),
                )
            }
            AppError::LlmFormat(msg) => {
                tracing::error!("LLM format error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_FORMAT_ERROR",
                    "An AI processing error occurred. Please try again.".to_string(),
                )
            }
            AppError::Payment(msg) => {
                tracing::error!("Payment provider error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "PAYMENT_ERROR",
                    "A payment provider error occurred. Please try again.".to_string(),
                )
            }
            AppError::WebhookRejected(msg) => {
                tracing::warn!("Webhook rejected: {msg}");
                (StatusCode::BAD_REQUEST, "WEBHOOK_REJECTED", msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
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
            AppError::NotImplemented => (
                StatusCode::NOT_IMPLEMENTED,
                "NOT_IMPLEMENTED",
                "This feature is not yet implemented".to_string(),
            ),
        };

        // Insufficient credits always carries a pointer to the purchase flow.
        let body = if matches!(self, AppError::InsufficientCredits { .. }) {
            Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                    "purchase_url": "/pricing"
                }
            }))
        } else {
            Json(json!({
                "error": {
                    "code": code,
                    "message": message
                }
            }))
        };

        (status, body).into_response()
    }
}
