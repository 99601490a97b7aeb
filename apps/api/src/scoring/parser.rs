//! Two-tier parsing of the oracle's response text.
//!
//! Primary path: strip markdown code fences, parse strictly as JSON, and
//! validate the shape. Secondary path: regex salvage of score / feedback /
//! suggestions from malformed text. The oracle's output is not
//! contract-guaranteed to be well-formed JSON, so a fallback recovery is a
//! successful outcome, not a degraded error. Only a response with no
//! recoverable score at all escalates to an error.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::scoring::models::{ScoreResult, SUGGESTION_THRESHOLD};

/// Substituted when a score is salvaged but feedback is not.
pub const GENERIC_FEEDBACK: &str = "AI analysis was partially successful. \
    Could not fully parse detailed feedback from the AI. Please try rephrasing your post.";

static SCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""score"\s*:\s*(\d+)"#).unwrap());

// Bounded string captures: stop at the closing quote, stepping over escapes.
static FEEDBACK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""feedback"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap());
static SUGGESTIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""content_suggestions"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap());

/// Tagged outcome of parsing one oracle response.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The (fence-stripped) response parsed strictly as valid JSON.
    Strict(ScoreResult),
    /// Strict parsing failed; score/feedback were salvaged by pattern match.
    Fallback(ScoreResult),
    /// No score in [0,100] could be recovered. Carries the raw response
    /// for server-side logging.
    ExtractionFailed(String),
}

/// Parses the raw oracle response, trying the strict path first and the
/// regex-salvage path second.
pub fn parse_oracle_response(raw: &str) -> ParseOutcome {
    let cleaned = strip_json_fences(raw);

    if let Some(result) = strict_parse(cleaned) {
        return ParseOutcome::Strict(result);
    }

    match fallback_parse(cleaned) {
        Some(result) => ParseOutcome::Fallback(result),
        None => ParseOutcome::ExtractionFailed(raw.to_string()),
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from oracle output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Strict path: the text must parse as JSON with `score` an integer in
/// [0,100] and `feedback` a string. Any violation returns None so the
/// caller can fall through to salvage.
fn strict_parse(text: &str) -> Option<ScoreResult> {
    let value: Value = serde_json::from_str(text).ok()?;

    let score = value.get("score")?.as_i64()?;
    if !(0..=100).contains(&score) {
        return None;
    }
    let feedback = value.get("feedback")?.as_str()?.to_string();

    // Included only when the oracle supplied a non-empty string.
    let content_suggestions = value
        .get("content_suggestions")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(ScoreResult {
        score: score as u8,
        feedback,
        content_suggestions,
    })
}

/// Fallback path: salvage `"score": <digits>` (first occurrence, accepted
/// only in [0,100]), then best-effort feedback and — for sub-60 scores —
/// content suggestions.
fn fallback_parse(text: &str) -> Option<ScoreResult> {
    let score = SCORE_RE
        .captures(text)
        .and_then(|c| c[1].parse::<u64>().ok())
        .filter(|s| *s <= 100)? as u8;

    let feedback = FEEDBACK_RE
        .captures(text)
        .map(|c| unescape_quotes(c[1].trim()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| GENERIC_FEEDBACK.to_string());

    let content_suggestions = if score < SUGGESTION_THRESHOLD {
        SUGGESTIONS_RE
            .captures(text)
            .map(|c| unescape_quotes(c[1].trim()))
            .filter(|s| !s.is_empty())
    } else {
        None
    };

    Some(ScoreResult {
        score,
        feedback,
        content_suggestions,
    })
}

fn unescape_quotes(s: &str) -> String {
    s.replace("\\\"", "\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_parse_passes_through_unchanged() {
        let raw = r#"{"score": 78, "feedback": "Good hook, add a call to action."}"#;
        let outcome = parse_oracle_response(raw);
        assert_eq!(
            outcome,
            ParseOutcome::Strict(ScoreResult {
                score: 78,
                feedback: "Good hook, add a call to action.".to_string(),
                content_suggestions: None,
            })
        );
    }

    #[test]
    fn test_strict_parse_keeps_non_empty_suggestions() {
        let raw = r#"{"score": 40, "feedback": "Weak.", "content_suggestions": "Lead with the benefit."}"#;
        match parse_oracle_response(raw) {
            ParseOutcome::Strict(result) => {
                assert_eq!(
                    result.content_suggestions.as_deref(),
                    Some("Lead with the benefit.")
                );
            }
            other => panic!("expected strict parse, got {other:?}"),
        }
    }

    #[test]
    fn test_strict_parse_drops_empty_suggestions() {
        let raw = r#"{"score": 40, "feedback": "Weak.", "content_suggestions": "  "}"#;
        match parse_oracle_response(raw) {
            ParseOutcome::Strict(result) => assert!(result.content_suggestions.is_none()),
            other => panic!("expected strict parse, got {other:?}"),
        }
    }

    #[test]
    fn test_fence_stripping_is_lossless() {
        let bare = r#"{"score": 78, "feedback": "Good hook, add a call to action."}"#;
        let fenced = format!("```json\n{bare}\n```");
        assert_eq!(parse_oracle_response(bare), parse_oracle_response(&fenced));
    }

    #[test]
    fn test_fence_without_language_tag() {
        let bare = r#"{"score": 61, "feedback": "Fine."}"#;
        let fenced = format!("```\n{bare}\n```");
        assert_eq!(parse_oracle_response(bare), parse_oracle_response(&fenced));
    }

    #[test]
    fn test_unfenced_input_untouched() {
        assert_eq!(strip_json_fences("{\"score\": 1}"), "{\"score\": 1}");
    }

    #[test]
    fn test_fallback_recovers_score_from_unparsable_text() {
        let raw = r#"Sure! Here is my assessment: "score": 72, and then some trailing prose"#;
        match parse_oracle_response(raw) {
            ParseOutcome::Fallback(result) => {
                assert_eq!(result.score, 72);
                assert_eq!(result.feedback, GENERIC_FEEDBACK);
            }
            other => panic!("expected fallback parse, got {other:?}"),
        }
    }

    #[test]
    fn test_fallback_recovers_feedback_too() {
        let raw = r#"Here you go: "score": 65, "feedback": "Solid post." — hope that helps!"#;
        match parse_oracle_response(raw) {
            ParseOutcome::Fallback(result) => {
                assert_eq!(result.score, 65);
                assert_eq!(result.feedback, "Solid post.");
            }
            other => panic!("expected fallback parse, got {other:?}"),
        }
    }

    #[test]
    fn test_fallback_unescapes_embedded_quotes() {
        let raw = r#"not json "score": 55, "feedback": "Use \"strong\" verbs here", trailing"#;
        match parse_oracle_response(raw) {
            ParseOutcome::Fallback(result) => {
                assert_eq!(result.feedback, "Use \"strong\" verbs here");
            }
            other => panic!("expected fallback parse, got {other:?}"),
        }
    }

    #[test]
    fn test_fallback_extracts_suggestions_below_threshold() {
        let raw = r#"broken { "score": 42, "feedback": "Weak.", "content_suggestions": "Try a question hook.""#;
        match parse_oracle_response(raw) {
            ParseOutcome::Fallback(result) => {
                assert_eq!(
                    result.content_suggestions.as_deref(),
                    Some("Try a question hook.")
                );
            }
            other => panic!("expected fallback parse, got {other:?}"),
        }
    }

    #[test]
    fn test_fallback_skips_suggestions_at_or_above_threshold() {
        let raw = r#"broken { "score": 72, "feedback": "Fine.", "content_suggestions": "Irrelevant.""#;
        match parse_oracle_response(raw) {
            ParseOutcome::Fallback(result) => assert!(result.content_suggestions.is_none()),
            other => panic!("expected fallback parse, got {other:?}"),
        }
    }

    #[test]
    fn test_no_recoverable_score_is_extraction_failure() {
        let raw = "I cannot score this post, sorry.";
        assert_eq!(
            parse_oracle_response(raw),
            ParseOutcome::ExtractionFailed(raw.to_string())
        );
    }

    #[test]
    fn test_out_of_range_score_is_never_fabricated() {
        // Strict validation rejects 150; the fallback must not invent a
        // default in its place.
        let raw = r#"{"score": 150, "feedback": "Too enthusiastic."}"#;
        assert!(matches!(
            parse_oracle_response(raw),
            ParseOutcome::ExtractionFailed(_)
        ));
    }

    #[test]
    fn test_float_score_falls_back_to_integer_prefix() {
        let raw = r#"{"score": 85.5, "feedback": "Nice."}"#;
        match parse_oracle_response(raw) {
            ParseOutcome::Fallback(result) => {
                assert_eq!(result.score, 85);
                assert_eq!(result.feedback, "Nice.");
            }
            other => panic!("expected fallback parse, got {other:?}"),
        }
    }

    #[test]
    fn test_non_string_feedback_falls_back() {
        let raw = r#"{"score": 70, "feedback": 12}"#;
        match parse_oracle_response(raw) {
            ParseOutcome::Fallback(result) => {
                assert_eq!(result.score, 70);
                assert_eq!(result.feedback, GENERIC_FEEDBACK);
            }
            other => panic!("expected fallback parse, got {other:?}"),
        }
    }

    #[test]
    fn test_huge_digit_run_does_not_panic_or_pass() {
        let raw = r#"nonsense "score": 99999999999999999999999 nonsense"#;
        assert!(matches!(
            parse_oracle_response(raw),
            ParseOutcome::ExtractionFailed(_)
        ));
    }
}
