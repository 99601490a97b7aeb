use serde::{Deserialize, Serialize};

/// Score below which the oracle is asked to supply `content_suggestions`.
pub const SUGGESTION_THRESHOLD: u8 = 60;

/// A validated scoring request. Constructed only by the validator;
/// lives for exactly one request.
#[derive(Debug, Clone)]
pub struct ScoreRequest {
    pub post_text: String,
    pub platform: String,
    pub image: Option<PostImage>,
}

/// A decoded, format-verified image upload.
#[derive(Debug, Clone)]
pub struct PostImage {
    /// MIME type sniffed from the byte stream, e.g. "image/png".
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// The normalized scoring result relayed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Always present and in 0–100 on any successful response.
    pub score: u8,
    /// Brief explanation, ≤150 characters by convention (not enforced).
    pub feedback: String,
    /// Longer actionable rewrite ideas; expected (not guaranteed) when
    /// score < 60, and omitted from the body when the oracle supplied none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_suggestions: Option<String>,
}
