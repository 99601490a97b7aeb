use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::{OracleError, ScoreOracle};
use crate::scoring::models::{ScoreRequest, ScoreResult, SUGGESTION_THRESHOLD};
use crate::scoring::parser::{parse_oracle_response, ParseOutcome};
use crate::scoring::prompts::build_prompt_parts;
use crate::scoring::validation::validate_request;
use crate::state::AppState;

/// POST /api/score_post
///
/// The body is taken as raw JSON so validation can classify a malformed
/// payload itself instead of surfacing axum's default rejection shape.
pub async fn handle_score_post(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ScoreResult>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::InvalidPayload(e.body_text()))?;

    let request = validate_request(&body, state.images)?;

    // Configuration is checked before any oracle work is attempted.
    let oracle = state
        .oracle
        .as_deref()
        .ok_or(AppError::OracleNotConfigured)?;

    let result = score_post(oracle, &request).await?;
    Ok(Json(result))
}

/// Orchestrates one scoring call: builds the prompt parts, invokes the
/// oracle once, and parses the response with strict-then-fallback recovery.
pub async fn score_post(
    oracle: &dyn ScoreOracle,
    request: &ScoreRequest,
) -> Result<ScoreResult, AppError> {
    let parts = build_prompt_parts(request);

    let raw = oracle.generate(&parts).await.map_err(|e| match e {
        OracleError::Blocked => AppError::PromptBlocked,
        other => AppError::Internal(anyhow::Error::new(other)),
    })?;

    match parse_oracle_response(&raw) {
        ParseOutcome::Strict(result) => {
            // Lenient policy: a sub-60 score without suggestions is logged,
            // never rejected.
            if result.score < SUGGESTION_THRESHOLD && result.content_suggestions.is_none() {
                warn!(
                    score = result.score,
                    "Oracle omitted content_suggestions for a score below {SUGGESTION_THRESHOLD}"
                );
            }
            Ok(result)
        }
        ParseOutcome::Fallback(result) => {
            warn!(
                score = result.score,
                "Strict parse of oracle response failed; recovered via fallback. Raw text: [{raw}]"
            );
            Ok(result)
        }
        ParseOutcome::ExtractionFailed(raw) => Err(AppError::ScoreExtractionFailed(raw)),
    }
}
