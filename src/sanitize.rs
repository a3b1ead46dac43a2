// ABOUTME: Redaction of persisted error messages before they reach storage or clients
// ABOUTME: Strips filesystem paths, URLs, and secret-shaped tokens, and caps message length
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use regex::Regex;
use std::sync::OnceLock;

/// Maximum length of a persisted error message, in characters
const MAX_MESSAGE_CHARS: usize = 500;

fn bearer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)bearer\s+[A-Za-z0-9._~+/=-]+").expect("valid regex"))
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s"'<>]+"#).expect("valid regex"))
}

fn keyed_secret_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Vendor-style key prefixes (sk-..., pk_..., AKIA...) followed by key material
    RE.get_or_init(|| {
        Regex::new(r"\b(?:sk|pk|rk|api|key)[-_][A-Za-z0-9_-]{12,}\b|\bAKIA[A-Z0-9]{12,}\b")
            .expect("valid regex")
    })
}

fn long_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Long unbroken base64/hex-ish words are treated as credentials
    RE.get_or_init(|| Regex::new(r"\b[A-Za-z0-9+/=_-]{32,}\b").expect("valid regex"))
}

fn path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Unix paths with at least two components, and Windows drive paths
    RE.get_or_init(|| {
        Regex::new(r#"(?:/[A-Za-z0-9._-]+){2,}/?|\b[A-Za-z]:\\[^\s"']+"#).expect("valid regex")
    })
}

/// Sanitize an error message before persisting it or showing it to a user.
///
/// Raw exception text may embed presigned URLs, API keys, or server paths;
/// each is replaced with a fixed placeholder and the result is length-capped.
#[must_use]
pub fn clean_error_message(raw: &str) -> String {
    let cleaned = bearer_re().replace_all(raw, "[redacted]");
    let cleaned = url_re().replace_all(&cleaned, "[url]");
    let cleaned = keyed_secret_re().replace_all(&cleaned, "[redacted]");
    let cleaned = long_token_re().replace_all(&cleaned, "[redacted]");
    let cleaned = path_re().replace_all(&cleaned, "[path]");

    truncate_chars(cleaned.trim(), MAX_MESSAGE_CHARS)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_redacted() {
        let msg = clean_error_message(
            "Failed to download https://bucket.s3.amazonaws.com/users/abc/ep.mp3?X-Amz-Signature=deadbeef: timeout",
        );
        assert!(!msg.contains("amazonaws"));
        assert!(!msg.contains("X-Amz-Signature"));
        assert!(msg.contains("[url]"));
        assert!(msg.contains("timeout"));
    }

    #[test]
    fn test_api_keys_are_redacted() {
        let msg = clean_error_message("OpenAI rejected key sk-proj1234567890abcdefgh");
        assert!(!msg.contains("sk-proj"));
        assert!(msg.contains("[redacted]"));
    }

    #[test]
    fn test_bearer_tokens_are_redacted() {
        let msg = clean_error_message("401 with header Authorization: Bearer eyJhbGciOi.abc.def");
        assert!(!msg.contains("eyJhbGciOi"));
    }

    #[test]
    fn test_filesystem_paths_are_redacted() {
        let msg = clean_error_message("No such file: /var/lib/castcraft/tmp/upload.mp3");
        assert!(!msg.contains("/var/lib"));
        assert!(msg.contains("[path]"));
    }

    #[test]
    fn test_long_tokens_are_redacted() {
        let msg =
            clean_error_message("got 403: A0B1C2D3E4F5A6B7C8D9E0F1A2B3C4D5E6F7A8B9 is not valid");
        assert!(msg.contains("[redacted]"));
        assert!(msg.contains("is not valid"));
    }

    #[test]
    fn test_length_is_capped() {
        let long = "x ".repeat(600);
        let msg = clean_error_message(&long);
        assert!(msg.chars().count() <= 501);
    }

    #[test]
    fn test_plain_messages_pass_through() {
        let msg = clean_error_message("transcription returned no text");
        assert_eq!(msg, "transcription returned no text");
    }
}
