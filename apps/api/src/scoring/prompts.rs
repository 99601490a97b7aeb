//! Prompt construction for the scoring oracle.
//!
//! The prompt is an ordered sequence of parts: instruction, the post text
//! quoted verbatim, the image (when present), the scoring criteria, and the
//! output-format contract with worked examples.

use crate::llm_client::PromptPart;
use crate::scoring::models::ScoreRequest;

/// Introduces the inline image part that follows it.
const IMAGE_INTRO: &str =
    "The post includes the following image, which should be evaluated as part of the content:";

/// Scoring criteria. `{platform}` is replaced with the display-capitalized
/// platform name before sending. Visual Appeal is worded conditionally so a
/// text-only post is not penalized for the missing image.
const CRITERIA_TEMPLATE: &str = r#"Provide a performance score from 0 to 100 based on the following criteria:
1.  Engagement Potential (likes, comments, shares).
2.  Clarity (clear, concise, understandable).
3.  Message Quality (valuable, informative, or entertaining for {platform}).
4.  Hashtag Effectiveness (relevance, visibility, or if beneficial if absent).
5.  Visual Appeal (only if an image is attached: how well the image supports the post; if no image is attached, score this dimension neutrally and ignore it)."#;

/// Output contract. `{platform}` is replaced before sending.
const OUTPUT_FORMAT_TEMPLATE: &str = r#"Return your response ONLY as a valid JSON object with two keys: "score" (an integer between 0 and 100) and "feedback" (a brief string, max 150 characters, explaining the score and offering 1-2 concise improvement suggestions).

If the score is below 60, the JSON object MUST also contain a third key "content_suggestions": a longer, actionable string with concrete alternative post text and image ideas tailored to {platform}.

Example JSON response for a score of 60 or above:
{
  "score": 85,
  "feedback": "Great clarity. Consider adding a question to boost engagement."
}

Example JSON response for a score below 60 when an image is attached:
{
  "score": 45,
  "feedback": "Weak hook and the image does not match the message.",
  "content_suggestions": "Open with the key benefit, e.g. 'Cut your editing time in half — here's how'. Replace the stock photo with a short before/after screenshot of the product in use."
}

Example JSON response for a score below 60 with no image:
{
  "score": 50,
  "feedback": "Too generic; no call to action.",
  "content_suggestions": "Rewrite as 'We just shipped dark mode — tell us what to build next' and add a product screenshot or a 10-second demo clip to stop the scroll."
}"#;

/// Assembles the ordered prompt parts for one scoring request.
pub fn build_prompt_parts(req: &ScoreRequest) -> Vec<PromptPart> {
    let platform = capitalize(&req.platform);

    let mut parts = vec![
        PromptPart::Text(format!(
            "Analyze the following social media post intended for {platform}."
        )),
        PromptPart::Text(format!("Post content:\"{}\"", req.post_text)),
    ];

    if let Some(image) = &req.image {
        parts.push(PromptPart::Text(IMAGE_INTRO.to_string()));
        parts.push(PromptPart::InlineImage {
            mime_type: image.mime_type.clone(),
            data: image.data.clone(),
        });
    }

    parts.push(PromptPart::Text(
        CRITERIA_TEMPLATE.replace("{platform}", &platform),
    ));
    parts.push(PromptPart::Text(
        OUTPUT_FORMAT_TEMPLATE.replace("{platform}", &platform),
    ));

    parts
}

/// Uppercases the first character for display ("twitter" -> "Twitter").
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::models::PostImage;

    fn text_of(part: &PromptPart) -> &str {
        match part {
            PromptPart::Text(text) => text,
            _ => panic!("expected text part"),
        }
    }

    fn text_request() -> ScoreRequest {
        ScoreRequest {
            post_text: "Check out our new launch! #exciting".to_string(),
            platform: "twitter".to_string(),
            image: None,
        }
    }

    fn image_request() -> ScoreRequest {
        ScoreRequest {
            image: Some(PostImage {
                mime_type: "image/png".to_string(),
                data: vec![0x89, 0x50, 0x4e, 0x47],
            }),
            ..text_request()
        }
    }

    #[test]
    fn test_text_only_prompt_order() {
        let parts = build_prompt_parts(&text_request());
        assert_eq!(parts.len(), 4);
        assert!(text_of(&parts[0]).contains("intended for Twitter"));
        assert!(text_of(&parts[1]).contains("\"Check out our new launch! #exciting\""));
        assert!(text_of(&parts[2]).starts_with("Provide a performance score"));
        assert!(text_of(&parts[3]).contains("ONLY as a valid JSON object"));
    }

    #[test]
    fn test_image_parts_inserted_after_post_text() {
        let parts = build_prompt_parts(&image_request());
        assert_eq!(parts.len(), 6);
        assert!(text_of(&parts[2]).contains("includes the following image"));
        match &parts[3] {
            PromptPart::InlineImage { mime_type, data } => {
                assert_eq!(mime_type, "image/png");
                assert!(!data.is_empty());
            }
            _ => panic!("expected inline image part"),
        }
    }

    #[test]
    fn test_platform_is_capitalized_for_display() {
        let parts = build_prompt_parts(&text_request());
        let criteria = text_of(&parts[2]);
        assert!(criteria.contains("entertaining for Twitter"));
        assert!(!criteria.contains("entertaining for twitter"));
    }

    #[test]
    fn test_criteria_enumerates_all_five_dimensions_in_order() {
        let parts = build_prompt_parts(&text_request());
        let criteria = text_of(&parts[2]);
        let positions: Vec<usize> = [
            "Engagement Potential",
            "Clarity",
            "Message Quality",
            "Hashtag Effectiveness",
            "Visual Appeal",
        ]
        .iter()
        .map(|dim| criteria.find(dim).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_output_format_covers_all_three_examples() {
        let parts = build_prompt_parts(&text_request());
        let format = text_of(&parts[3]);
        assert!(format.contains("content_suggestions"));
        assert!(format.contains("score of 60 or above"));
        assert!(format.contains("below 60 when an image is attached"));
        assert!(format.contains("below 60 with no image"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("twitter"), "Twitter");
        assert_eq!(capitalize("LinkedIn"), "LinkedIn");
        assert_eq!(capitalize(""), "");
    }
}
