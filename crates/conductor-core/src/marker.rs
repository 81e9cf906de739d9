//! Terminal marker handling and token estimation.
//!
//! Agents signal completion by including [`TERMINAL_MARKER`] anywhere in
//! their reply text. The marker is a plain substring of free-form model
//! output; it is stripped from results handed back to callers but never
//! from stored conversation turns.

/// Substring in assistant output that ends an agent loop.
pub const TERMINAL_MARKER: &str = "[STOP]";

/// Approximate characters per token for estimation.
const CHARS_PER_TOKEN: usize = 4;

/// Check whether the content contains the terminal marker.
pub fn contains_terminal_marker(content: &str) -> bool {
    content.contains(TERMINAL_MARKER)
}

/// Remove every occurrence of the terminal marker and trim whitespace.
pub fn strip_terminal_marker(content: &str) -> String {
    content.replace(TERMINAL_MARKER, "").trim().to_string()
}

/// Estimate the token count of a text as `ceil(len / 4)`.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(CHARS_PER_TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_marker() {
        assert!(contains_terminal_marker("All done. [STOP]"));
        assert!(contains_terminal_marker("[STOP] early"));
        assert!(!contains_terminal_marker("still working"));
    }

    #[test]
    fn test_strip_marker() {
        assert_eq!(strip_terminal_marker("Report ready. [STOP]"), "Report ready.");
        assert_eq!(strip_terminal_marker("[STOP]a[STOP]b[STOP]"), "ab");
        assert_eq!(strip_terminal_marker("  no marker  "), "no marker");
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens(&"x".repeat(40)), 10);
    }
}
