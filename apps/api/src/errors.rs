use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractionError;
use crate::llm_client::LlmError;
use crate::models::resume::StructuralError;
use crate::render::RenderError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Candidate or collaborator output that is not a résumé object.
    #[error("{0}")]
    Structural(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The session is not in a stage that allows the operation.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    UnsupportedMedia(String),

    /// Failure reported by an external collaborator, passed on verbatim.
    #[error("{0}")]
    Collaborator(String),

    #[error("{0}")]
    Timeout(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StructuralError> for AppError {
    fn from(e: StructuralError) -> Self {
        AppError::Structural(e.to_string())
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Timeout { .. } => AppError::Timeout(e.to_string()),
            LlmError::Parse(_) | LlmError::EmptyContent => {
                AppError::Structural(format!("Failed to parse resume data: {e}"))
            }
            other => AppError::Collaborator(other.to_string()),
        }
    }
}

impl From<ExtractionError> for AppError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::UnsupportedFormat => AppError::UnsupportedMedia(e.to_string()),
            other => AppError::Collaborator(other.to_string()),
        }
    }
}

impl From<RenderError> for AppError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::Template(err) => AppError::Internal(anyhow::Error::new(err)),
            other => AppError::Collaborator(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Structural(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "STRUCTURAL_ERROR",
                msg.clone(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::UnsupportedMedia(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                msg.clone(),
            ),
            AppError::Collaborator(msg) => {
                tracing::error!("Collaborator error: {msg}");
                (StatusCode::BAD_GATEWAY, "COLLABORATOR_ERROR", msg.clone())
            }
            AppError::Timeout(msg) => {
                tracing::error!("Collaborator timeout: {msg}");
                (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT", msg.clone())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_timeout_is_distinct_from_parse_failure() {
        let timeout: AppError = LlmError::Timeout { secs: 120 }.into();
        assert!(matches!(timeout, AppError::Timeout(_)));

        let parse: AppError = LlmError::Parse(serde_json::from_str::<u8>("x").unwrap_err()).into();
        assert!(matches!(parse, AppError::Structural(_)));

        let api: AppError = LlmError::Api {
            status: 400,
            message: "bad".into(),
        }
        .into();
        assert!(matches!(api, AppError::Collaborator(_)));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Structural("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (ExtractionError::UnsupportedFormat.into(), StatusCode::UNSUPPORTED_MEDIA_TYPE),
            (ExtractionError::NoText.into(), StatusCode::BAD_GATEWAY),
            (AppError::Timeout("x".into()), StatusCode::GATEWAY_TIMEOUT),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_collaborator_message_is_verbatim() {
        let err: AppError = RenderError::Service {
            status: 500,
            message: "chromium crashed".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Render service error (status 500): chromium crashed"
        );
    }
}
