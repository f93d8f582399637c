//! Response normalization
//!
//! Model output is untrusted free text. This narrows it down to the first
//! balanced JSON object or array before parsing. It is a syntactic scan,
//! not a parser: the substring it returns may still fail to parse.

use crate::error::AdvisoryError;
use crate::Result;
use serde_json::Value;

const FENCE_MARKERS: &[&str] = &["```json", "```JSON", "```"];

/// Top-level container an advisor expects back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Object,
    Array,
}

impl JsonShape {
    fn delimiters(self) -> (char, char) {
        match self {
            JsonShape::Object => ('{', '}'),
            JsonShape::Array => ('[', ']'),
        }
    }

    /// Token returned when nothing plausible is found
    pub fn empty_token(self) -> &'static str {
        match self {
            JsonShape::Object => "{}",
            JsonShape::Array => "[]",
        }
    }
}

pub struct ResponseNormalizer;

impl ResponseNormalizer {
    /// Remove markdown fence markers
    pub fn strip_fences(raw: &str) -> String {
        FENCE_MARKERS
            .iter()
            .fold(raw.to_string(), |text, marker| text.replace(marker, ""))
    }

    /// First balanced candidate of `shape` in `text`.
    ///
    /// Candidates that parse as JSON win over ones that merely balance, so
    /// prose like "see {above}" ahead of the payload does not shadow it.
    pub fn extract(text: &str, shape: JsonShape) -> Option<&str> {
        let (open, _) = shape.delimiters();
        let mut first_balanced = None;

        for (start, ch) in text.char_indices() {
            if ch != open {
                continue;
            }
            if let Some(end) = balanced_end(&text[start..], shape) {
                let candidate = &text[start..start + end];
                if serde_json::from_str::<Value>(candidate).is_ok() {
                    return Some(candidate);
                }
                first_balanced.get_or_insert(candidate);
            }
        }

        first_balanced
    }

    /// Fence-stripped candidate, or the empty container token
    pub fn normalize(raw: &str, shape: JsonShape) -> String {
        let cleaned = Self::strip_fences(raw);
        Self::extract(&cleaned, shape)
            .unwrap_or(shape.empty_token())
            .to_string()
    }

    /// Normalize and parse in one step
    pub fn parse(raw: &str, shape: JsonShape) -> Result<Value> {
        let cleaned = Self::strip_fences(raw);
        let candidate = Self::extract(&cleaned, shape).ok_or_else(|| {
            AdvisoryError::MalformedResponse(format!(
                "no JSON {} found in model output",
                match shape {
                    JsonShape::Object => "object",
                    JsonShape::Array => "array",
                }
            ))
        })?;

        serde_json::from_str(candidate)
            .map_err(|e| AdvisoryError::MalformedResponse(format!("invalid JSON: {}", e)))
    }
}

/// Byte length of the balanced container starting at `text[0]`, if any.
/// Brackets inside string literals are ignored.
fn balanced_end(text: &str, shape: JsonShape) -> Option<usize> {
    let (open, close) = shape.delimiters();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_object() {
        let value = ResponseNormalizer::parse(r#"{"score": 75}"#, JsonShape::Object).unwrap();
        assert_eq!(value, json!({"score": 75}));
    }

    #[test]
    fn test_wrapped_equals_bare() {
        let bare = r#"{"status": "Has debt", "nested": {"months": 4}, "text": "a } b"}"#;
        let wrapped = format!(
            "Sure! Here is the analysis you asked for:\n```json\n{}\n```\nLet me know {{if}} you need more.",
            bare
        );

        let from_bare = ResponseNormalizer::parse(bare, JsonShape::Object).unwrap();
        let from_wrapped = ResponseNormalizer::parse(&wrapped, JsonShape::Object).unwrap();
        assert_eq!(from_bare, from_wrapped);
    }

    #[test]
    fn test_prose_braces_before_payload() {
        let raw = r#"Using the {standard} rule: {"score": 61}"#;
        let value = ResponseNormalizer::parse(raw, JsonShape::Object).unwrap();
        assert_eq!(value["score"], 61);
    }

    #[test]
    fn test_array_shape() {
        let raw = "```json\n[{\"action\": \"Cook at home\", \"estimated_savings\": 500, \"reason\": \"[dining] is high\"}]\n```";
        let value = ResponseNormalizer::parse(raw, JsonShape::Array).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_missing_json_is_malformed() {
        let err = ResponseNormalizer::parse("I cannot help with that.", JsonShape::Object).unwrap_err();
        assert!(matches!(err, AdvisoryError::MalformedResponse(_)));
        assert_eq!(
            ResponseNormalizer::normalize("nothing here", JsonShape::Array),
            "[]"
        );
        assert_eq!(ResponseNormalizer::normalize("", JsonShape::Object), "{}");
    }

    #[test]
    fn test_unbalanced_is_malformed() {
        let err = ResponseNormalizer::parse(r#"{"score": 75"#, JsonShape::Object).unwrap_err();
        assert!(matches!(err, AdvisoryError::MalformedResponse(_)));
    }

    #[test]
    fn test_balanced_but_invalid_is_returned() {
        let raw = "{score: 75}";
        assert_eq!(ResponseNormalizer::normalize(raw, JsonShape::Object), "{score: 75}");
        assert!(ResponseNormalizer::parse(raw, JsonShape::Object).is_err());
    }
}
