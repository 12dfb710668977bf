// Content policy: messages may not contain web links.

use regex::Regex;
use std::sync::LazyLock;

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://\S+").expect("link pattern is a valid regex")
});

/// Returns `true` if `content` contains at least one `http(s)://` link.
pub fn contains_link(content: &str) -> bool {
    LINK_PATTERN.is_match(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_links_anywhere() {
        assert!(contains_link("check this out http://evil.example/x"));
        assert!(contains_link("https://a.b"));
        assert!(contains_link("before HTTPS://Example.COM after"));
        assert!(contains_link("(see hTTp://x)"));
    }

    #[test]
    fn test_ignores_text_without_links() {
        assert!(!contains_link("hello world"));
        assert!(!contains_link("example.com without a scheme"));
        assert!(!contains_link("ftp://files.example"));
    }

    #[test]
    fn test_scheme_needs_something_after_it() {
        assert!(!contains_link("just http:// alone"));
        assert!(!contains_link("https://"));
    }
}
