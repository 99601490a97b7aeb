/// LLM client — the single point of entry for all Gemini API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All oracle interactions MUST go through this module.
///
/// Model: gemini-1.5-flash-latest (hardcoded — do not make configurable to prevent drift)
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// The model used for all scoring calls.
pub const MODEL: &str = "gemini-1.5-flash-latest";

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("prompt blocked by content-safety policy")]
    Blocked,

    #[error("oracle returned empty content")]
    EmptyContent,
}

/// One ordered segment of the prompt sent to the oracle.
/// Text parts carry instructions and the post itself; an inline image part
/// carries the decoded upload, re-encoded for the wire.
#[derive(Debug, Clone)]
pub enum PromptPart {
    Text(String),
    InlineImage { mime_type: String, data: Vec<u8> },
}

/// The text/image-in, text-out oracle that scores a post.
/// A trait so handlers are tested against a fake instead of the live API.
#[async_trait]
pub trait ScoreOracle: Send + Sync {
    /// Sends the ordered prompt parts and returns the raw response text.
    /// One call, no retries; transport and provider failures map onto
    /// `OracleError` rather than propagating raw.
    async fn generate(&self, parts: &[PromptPart]) -> Result<String, OracleError>;
}

/// The Gemini-backed oracle used in production.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            GEMINI_API_BASE, MODEL, self.api_key
        )
    }
}

#[async_trait]
impl ScoreOracle for GeminiClient {
    async fn generate(&self, parts: &[PromptPart]) -> Result<String, OracleError> {
        let wire_parts: Vec<ContentPart> = parts.iter().map(ContentPart::from).collect();

        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: wire_parts,
            }],
        };

        debug!(part_count = parts.len(), "Sending request to Gemini API");

        let response = self
            .client
            .post(self.api_url())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse a structured error message
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(OracleError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Api {
                status: status.as_u16(),
                message: format!("Failed to parse response: {e}"),
            })?;

        // A blocked prompt has no candidates and a promptFeedback.blockReason;
        // a blocked completion surfaces as finishReason SAFETY on the candidate.
        if let Some(feedback) = &api_response.prompt_feedback {
            if feedback.block_reason.is_some() {
                return Err(OracleError::Blocked);
            }
        }
        if api_response
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            == Some("SAFETY")
        {
            return Err(OracleError::Blocked);
        }

        api_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .and_then(|p| match p {
                ContentPart::Text { text } => Some(text.clone()),
                _ => None,
            })
            .ok_or(OracleError::EmptyContent)
    }
}

// ============================================================================
// Gemini API request/response types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl From<&PromptPart> for ContentPart {
    fn from(part: &PromptPart) -> Self {
        match part {
            PromptPart::Text(text) => ContentPart::Text { text: text.clone() },
            PromptPart::InlineImage { mime_type, data } => ContentPart::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(data),
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Content,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}
