//! Helpers for reading JSON out of model responses.

use regex::Regex;
use std::sync::LazyLock;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*\n(.*?)\n?\s*```").expect("valid fence regex")
});

/// Returns the JSON payload of a model answer.
///
/// Answers are sometimes wrapped in a markdown code fence, with or without a
/// `json` tag. The fenced body is returned when present, otherwise the
/// trimmed text as-is.
pub fn strip_code_fences(text: &str) -> &str {
    FENCED_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or_else(|| text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json_passes_through() {
        assert_eq!(strip_code_fences("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn test_json_fence() {
        let text = "Here you go:\n```json\n{\"calculatedDuty\": 12.5}\n```\n";
        assert_eq!(strip_code_fences(text), "{\"calculatedDuty\": 12.5}");
    }

    #[test]
    fn test_untagged_fence() {
        let text = "```\n{\"dutyRate\": \"Free\"}\n```";
        assert_eq!(strip_code_fences(text), "{\"dutyRate\": \"Free\"}");
    }
}
