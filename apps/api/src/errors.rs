use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractionError;
use crate::llm_client::LlmError;
use crate::render::RenderError;
use crate::tailoring::parser::ParseError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Diagnostic detail stays in the server log; clients only see the safe message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Payment required")]
    PaymentRequired,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("AI output parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::Upstream(e.to_string())
    }
}

impl From<RenderError> for AppError {
    fn from(e: RenderError) -> Self {
        AppError::Internal(anyhow::Error::new(e))
    }
}

impl From<ExtractionError> for AppError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::Unsupported(name) => AppError::UnsupportedMedia(format!(
                "Unsupported file type '{name}'. Upload a .docx, .pdf or .txt file"
            )),
            ExtractionError::Empty => {
                AppError::UnprocessableEntity("No text could be read from the file".to_string())
            }
            ExtractionError::TooLarge { .. } => {
                AppError::UnprocessableEntity("The document is too large to process".to_string())
            }
            other => AppError::Upstream(format!("Text extraction failed: {other}")),
        }
    }
}

impl AppError {
    /// HTTP status this error maps to at the request boundary.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
            AppError::Upstream(_) | AppError::Parse(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone()),
            AppError::UnsupportedMedia(msg) => ("UNSUPPORTED_MEDIA", msg.clone()),
            AppError::UnprocessableEntity(msg) => ("UNPROCESSABLE_ENTITY", msg.clone()),
            AppError::Unauthorized => ("UNAUTHORIZED", "Authentication required".to_string()),
            AppError::Forbidden => ("FORBIDDEN", "Access denied".to_string()),
            AppError::PaymentRequired => (
                "PAYMENT_REQUIRED",
                "You have no credits left. Credits are replenished monthly".to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                ("DATABASE_ERROR", "A database error occurred".to_string())
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream service error: {msg}");
                (
                    "UPSTREAM_ERROR",
                    "An external service failed. Please try again".to_string(),
                )
            }
            AppError::Parse(e) => {
                tracing::error!("AI output parse error: {e}; raw prefix: {:?}", e.raw_prefix);
                (
                    "AI_PARSE_ERROR",
                    "The AI response could not be processed. Please try again".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
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
    fn test_taxonomy_status_codes() {
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::NotFound("job".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::PaymentRequired.status(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            AppError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Upstream("x".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_parse_error_body_hides_raw_output() {
        let err = AppError::Parse(ParseError::new("secret model output {broken"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("AI_PARSE_ERROR"));
        assert!(!text.contains("secret model output"));
    }

    #[test]
    fn test_extraction_errors_map_to_client_statuses() {
        let unsupported: AppError = ExtractionError::Unsupported("cv.odt".into()).into();
        assert_eq!(unsupported.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let empty: AppError = ExtractionError::Empty.into();
        assert_eq!(empty.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let oversized: AppError = ExtractionError::TooLarge { limit: 1024 }.into();
        assert_eq!(oversized.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
