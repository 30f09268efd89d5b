//! Utilities for sanitizing messages and page text before they are stored.

use crate::config::MAX_ERROR_MESSAGE_LENGTH;

/// Removes control characters (except tab/newline/carriage return).
pub fn sanitize_error_message(message: &str) -> String {
    message
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

/// Sanitizes a message and caps it at `MAX_ERROR_MESSAGE_LENGTH` characters.
pub fn sanitize_and_truncate_error_message(message: &str) -> String {
    let sanitized = sanitize_error_message(message);
    let length = sanitized.chars().count();
    if length <= MAX_ERROR_MESSAGE_LENGTH {
        return sanitized;
    }
    let kept: String = sanitized
        .chars()
        .take(MAX_ERROR_MESSAGE_LENGTH.saturating_sub(3))
        .collect();
    format!("{kept}...")
}

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_removes_control_characters() {
        assert_eq!(sanitize_error_message("a\u{0}b\u{7}c\nd"), "abc\nd");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        let long = "è".repeat(MAX_ERROR_MESSAGE_LENGTH + 20);
        let truncated = sanitize_and_truncate_error_message(&long);
        assert_eq!(truncated.chars().count(), MAX_ERROR_MESSAGE_LENGTH);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_short_message_untouched() {
        assert_eq!(sanitize_and_truncate_error_message("timeout"), "timeout");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Chi \n\t siamo  "), "Chi siamo");
    }
}
