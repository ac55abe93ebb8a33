use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mediaset_core::captioning::CaptionError;
use mediaset_core::error::CoreError;
use serde_json::json;

/// Message returned for every 5xx so internal details never leak.
const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `mediaset_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} '{id}' not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Caption(caption) => classify_caption_error(caption),
                CoreError::Storage { .. } | CoreError::Archive(_) | CoreError::Internal(_) => {
                    tracing::error!(error = %core, "Internal core error");
                    internal()
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "success": false,
            "message": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a caption failure to a status.
///
/// - Not configured maps to 503.
/// - Upstream failures (bad status, bad body, timeout) map to 502.
/// - Failing to read the media file maps to 500.
fn classify_caption_error(err: &CaptionError) -> (StatusCode, &'static str, String) {
    match err {
        CaptionError::Configuration(msg) => {
            tracing::warn!(error = %msg, "Caption generation requested but not configured");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "CAPTIONING_UNAVAILABLE",
                "Caption generation is not configured".to_string(),
            )
        }
        CaptionError::Upstream(msg) => {
            tracing::error!(error = %msg, "Captioning service error");
            (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "Caption generation failed".to_string(),
            )
        }
        CaptionError::Io(e) => {
            tracing::error!(error = %e, "Failed to read media for captioning");
            internal()
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}
