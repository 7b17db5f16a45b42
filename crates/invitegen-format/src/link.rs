//! Registration link extraction.

use std::sync::OnceLock;

use regex::Regex;

/// URL pattern: an `http(s)://` scheme followed by a run of characters that
/// are neither whitespace nor double quotes, containing `register` somewhere.
const REGISTRATION_URL_PATTERN: &str = r#"(?i)https?://[^\s"]*register[^\s"]*"#;

fn registration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(REGISTRATION_URL_PATTERN).expect("registration URL pattern is valid")
    })
}

/// Return the first URL in `text` whose span contains `register`
/// (case-insensitive), or `None` when there is no such URL.
///
/// Matching is purely textual: `https://x.com/registered-trademark` counts.
/// The returned slice always borrows from `text`.
pub fn extract_registration_link(text: &str) -> Option<&str> {
    registration_regex().find(text).map(|m| m.as_str())
}

/// Pick the registration link for a run.
///
/// A non-empty explicit link wins; otherwise the link is extracted from the
/// raw page text.
pub fn resolve_registration_link(explicit: Option<&str>, raw_text: &str) -> Option<String> {
    match explicit.map(str::trim).filter(|link| !link.is_empty()) {
        Some(link) => {
            tracing::debug!(link = %link, "using explicit registration link");
            Some(link.to_owned())
        }
        None => extract_registration_link(raw_text).map(str::to_owned),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_registration_url_from_page_text() {
        let text = "Join us!\nSign up at https://events.example.com/register/123 before Friday.";
        assert_eq!(
            extract_registration_link(text),
            Some("https://events.example.com/register/123")
        );
    }

    #[test]
    fn no_registration_url_yields_none() {
        assert_eq!(extract_registration_link("Visit https://example.com/about"), None);
        assert_eq!(extract_registration_link(""), None);
    }

    #[test]
    fn match_is_case_insensitive() {
        let text = "HTTPS://Example.com/REGISTER?id=7";
        assert_eq!(extract_registration_link(text), Some(text));
    }

    #[test]
    fn unrelated_word_containing_register_still_matches() {
        let text = "see https://brand.example.com/registered-trademark";
        assert_eq!(
            extract_registration_link(text),
            Some("https://brand.example.com/registered-trademark")
        );
    }

    #[test]
    fn first_match_in_document_order_wins() {
        let text = "https://a.example.com/register/1 and https://b.example.com/register/2";
        assert_eq!(
            extract_registration_link(text),
            Some("https://a.example.com/register/1")
        );
    }

    #[test]
    fn url_stops_at_quote_and_whitespace() {
        let text = r#"<a href="https://x.example.com/register">Register</a>"#;
        assert_eq!(
            extract_registration_link(text),
            Some("https://x.example.com/register")
        );
    }

    #[test]
    fn register_in_surrounding_text_is_not_enough() {
        // `register` appears after the URL, separated by whitespace.
        assert_eq!(
            extract_registration_link("https://example.com/event register now"),
            None
        );
    }

    #[test]
    fn explicit_link_overrides_extracted() {
        let raw = "https://events.example.com/register/123";
        assert_eq!(
            resolve_registration_link(Some("https://override.example.com/r"), raw).as_deref(),
            Some("https://override.example.com/r")
        );
    }

    #[test]
    fn empty_explicit_link_falls_back_to_extraction() {
        let raw = "https://events.example.com/register/123";
        assert_eq!(
            resolve_registration_link(Some("  "), raw).as_deref(),
            Some("https://events.example.com/register/123")
        );
        assert_eq!(resolve_registration_link(None, "nothing here"), None);
    }
}
