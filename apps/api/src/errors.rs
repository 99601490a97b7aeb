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
/// The response body is always `{"error": "<message>"}`. Validation and
/// encoding errors carry their message to the client; internal failures are
/// logged in full server-side and surfaced as a generic message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request payload: {0}")]
    InvalidPayload(String),

    #[error("Missing {0} in request")]
    MissingField(&'static str),

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("image_base64 is not valid base64: {0}")]
    InvalidEncoding(String),

    #[error("Decoded image data is empty")]
    EmptyImageData,

    #[error("Image data is not in a recognized image format")]
    UnrecognizedImageFormat,

    #[error("Image scoring is not available in this deployment")]
    ImageSupportUnavailable,

    #[error("AI scoring is currently unavailable. API key not configured.")]
    OracleNotConfigured,

    #[error("Your request was blocked by the AI for safety reasons. Please modify your post content.")]
    PromptBlocked,

    #[error("Could not extract a score from the AI response")]
    ScoreExtractionFailed(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidPayload(_)
            | AppError::MissingField(_)
            | AppError::EmptyField(_)
            | AppError::InvalidEncoding(_)
            | AppError::EmptyImageData
            | AppError::UnrecognizedImageFormat
            | AppError::PromptBlocked => (StatusCode::BAD_REQUEST, self.to_string()),

            AppError::ImageSupportUnavailable => (StatusCode::NOT_IMPLEMENTED, self.to_string()),

            AppError::OracleNotConfigured => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),

            AppError::ScoreExtractionFailed(raw) => {
                tracing::error!("Score extraction failed. Oracle response: [{raw}]");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The AI response could not be interpreted as a score. Please try again."
                        .to_string(),
                )
            }

            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred while scoring the post.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
