//! Request validator — turns a raw JSON body into a `ScoreRequest` or a
//! classified rejection. No side effects beyond validation.

use base64::Engine;
use serde_json::Value;

use crate::errors::AppError;
use crate::scoring::models::{PostImage, ScoreRequest};

/// Whether this deployment can decode uploaded images.
///
/// Determined once at startup from the `images` cargo feature and injected,
/// so the 501 path is deterministic and testable rather than a call-time
/// import probe.
#[derive(Debug, Clone, Copy)]
pub struct ImageSupport {
    available: bool,
}

impl ImageSupport {
    pub fn detect() -> Self {
        Self {
            available: cfg!(feature = "images"),
        }
    }

    pub fn disabled() -> Self {
        Self { available: false }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }
}

/// Validates the raw JSON body of POST /api/score_post.
pub fn validate_request(body: &Value, images: ImageSupport) -> Result<ScoreRequest, AppError> {
    let post_text = required_string(body, "post_text")?;
    let platform = required_string(body, "platform")?;

    let image = match body.get("image_base64") {
        None | Some(Value::Null) => None,
        Some(Value::String(encoded)) if encoded.trim().is_empty() => None,
        Some(Value::String(encoded)) => Some(decode_image(encoded.trim(), images)?),
        Some(_) => {
            return Err(AppError::InvalidPayload(
                "image_base64 must be a string".to_string(),
            ))
        }
    };

    Ok(ScoreRequest {
        post_text,
        platform,
        image,
    })
}

fn required_string(body: &Value, field: &'static str) -> Result<String, AppError> {
    let value = body.get(field).ok_or(AppError::MissingField(field))?;
    let text = value
        .as_str()
        .ok_or_else(|| AppError::InvalidPayload(format!("{field} must be a string")))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::EmptyField(field));
    }
    Ok(text.to_string())
}

fn decode_image(encoded: &str, images: ImageSupport) -> Result<PostImage, AppError> {
    // Capability check comes first: reject before spending any decode work.
    if !images.is_available() {
        return Err(AppError::ImageSupportUnavailable);
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| AppError::InvalidEncoding(e.to_string()))?;

    if bytes.is_empty() {
        return Err(AppError::EmptyImageData);
    }

    let mime_type = sniff_image(&bytes)?;

    Ok(PostImage {
        mime_type: mime_type.to_string(),
        data: bytes,
    })
}

/// Verifies the bytes are an openable image and returns the sniffed MIME type.
#[cfg(feature = "images")]
fn sniff_image(bytes: &[u8]) -> Result<&'static str, AppError> {
    let format = image::guess_format(bytes).map_err(|_| AppError::UnrecognizedImageFormat)?;
    image::load_from_memory(bytes).map_err(|_| AppError::UnrecognizedImageFormat)?;
    Ok(format.to_mime_type())
}

#[cfg(not(feature = "images"))]
fn sniff_image(_bytes: &[u8]) -> Result<&'static str, AppError> {
    Err(AppError::ImageSupportUnavailable)
}
