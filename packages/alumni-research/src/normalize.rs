//! Turns the formatting stage's raw text into a [`ResearchProfile`].
//!
//! The model is asked for strict structured output but occasionally wraps
//! the object in prose, so the text between the first `{` and the last `}`
//! is taken as the payload. Three failures are distinguished and never
//! coerced: no object present, invalid JSON, and JSON that does not fit the
//! profile schema.

use openai_client::truncate_to_char_boundary;
use thiserror::Error;
use tracing::{debug, warn};

use crate::profile::ResearchProfile;

/// Bytes of payload kept in error previews.
pub const PREVIEW_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("no JSON object located in response")]
    NoJsonObject { preview: String },

    #[error("JSON decode error: {message}")]
    Decode { message: String, preview: String },

    #[error("schema validation error: {message}")]
    Schema { message: String, preview: String },
}

impl NormalizeError {
    pub fn preview(&self) -> &str {
        match self {
            Self::NoJsonObject { preview }
            | Self::Decode { preview, .. }
            | Self::Schema { preview, .. } => preview,
        }
    }
}

fn preview(text: &str) -> String {
    truncate_to_char_boundary(text, PREVIEW_LEN).to_string()
}

/// Locate the embedded JSON object: first `{` through last `}`.
///
/// Without a closing brace after the opening one, everything from the `{`
/// on is returned so the decoder reports it.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let text = raw.trim();
    let start = text.find('{')?;
    match text.rfind('}') {
        Some(end) if end > start => Some(&text[start..=end]),
        _ => Some(&text[start..]),
    }
}

/// Decode and validate a profile from raw model output.
pub fn normalize(raw: &str) -> Result<ResearchProfile, NormalizeError> {
    let result = decode(raw);
    match &result {
        Ok(profile) => debug!(
            practices = profile.current_practices_names.len(),
            "Normalized structured output"
        ),
        Err(e) => warn!(error = %e, preview = %e.preview(), "Failed to normalize structured output"),
    }
    result
}

fn decode(raw: &str) -> Result<ResearchProfile, NormalizeError> {
    let payload = extract_json_object(raw).ok_or_else(|| NormalizeError::NoJsonObject {
        preview: preview(raw.trim()),
    })?;

    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| NormalizeError::Decode {
            message: e.to_string(),
            preview: preview(payload),
        })?;

    let mut profile: ResearchProfile =
        serde_json::from_value(value).map_err(|e| NormalizeError::Schema {
            message: e.to_string(),
            preview: preview(payload),
        })?;

    let names = profile.current_practices_names.len();
    let urls = profile.current_practices_urls.len();
    if names != urls {
        return Err(NormalizeError::Schema {
            message: format!("{names} practice names but {urls} practice URLs"),
            preview: preview(payload),
        });
    }

    let removed = profile.dedup_practices();
    if removed > 0 {
        debug!(removed, "Collapsed duplicate practice names");
    }

    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"{
        "current_practices_names": ["Example Radiology Group", "City Hospital"],
        "current_practices_urls": ["https://example.org/doe", ""],
        "current_practice_narrative": "Neuroradiologist since 2012.",
        "additional_information": "",
        "x_twitter_link": "",
        "linkedin_link": "https://www.linkedin.com/in/janedoe",
        "doximity_link": "",
        "google_scholar_link": "",
        "facebook_link": ""
    }"#;

    #[test]
    fn test_normalize_is_idempotent() {
        let first = normalize(PROFILE).unwrap();
        let second = normalize(PROFILE).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        assert_eq!(first.current_practices_names.len(), 2);
    }

    #[test]
    fn test_prose_around_object() {
        let wrapped = format!("Here is the result: {PROFILE} Thanks!");
        let profile = normalize(&wrapped).unwrap();

        assert_eq!(profile.linkedin_link, "https://www.linkedin.com/in/janedoe");
    }

    #[test]
    fn test_no_brace_is_reported() {
        let err = normalize("I could not find anything about this person.").unwrap_err();
        assert!(matches!(err, NormalizeError::NoJsonObject { .. }));
        assert!(err.preview().starts_with("I could not find"));
    }

    #[test]
    fn test_malformed_json_is_decode_error() {
        let err = normalize(r#"{"current_practice_narrative": "unterminated}"#).unwrap_err();
        assert!(matches!(err, NormalizeError::Decode { .. }));

        let err = normalize(r#"Result: {"a": 1,"#).unwrap_err();
        assert!(matches!(err, NormalizeError::Decode { .. }));
    }

    #[test]
    fn test_wrong_types_are_schema_errors() {
        let err = normalize(r#"{"current_practice_narrative": 42}"#).unwrap_err();
        assert!(matches!(err, NormalizeError::Schema { .. }));

        let err = normalize(r#"{"linkedin_link": null}"#).unwrap_err();
        assert!(matches!(err, NormalizeError::Schema { .. }));
    }

    #[test]
    fn test_unequal_practice_lists_rejected() {
        let err = normalize(
            r#"{"current_practices_names": ["A", "B"], "current_practices_urls": ["https://a.org"]}"#,
        )
        .unwrap_err();

        match err {
            NormalizeError::Schema { message, .. } => assert!(message.contains("2 practice names")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_every_field_present_after_normalize() {
        let profile = normalize("{}").unwrap();
        let value = serde_json::to_value(&profile).unwrap();

        for (_, field) in value.as_object().unwrap() {
            assert!(field.is_string() || field.is_array());
        }
        assert_eq!(value.as_object().unwrap().len(), 9);
    }

    #[test]
    fn test_preview_is_truncated() {
        let long = "x".repeat(2_000);
        let err = normalize(&long).unwrap_err();
        assert_eq!(err.preview().len(), PREVIEW_LEN);
    }
}
