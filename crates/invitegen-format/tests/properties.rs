//! Integration tests for the invitegen-format crate.
//!
//! These exercise the public API over whole invitations rather than single
//! lines: escaping guarantees, tag balance, determinism and the
//! resolve-then-finalize flow used by the pipeline.

use invitegen_format::{
    FinalizedInvitation, LinkOutcome, convert_to_html, extract_registration_link,
    registration_token, resolve_registration_link,
};

const SAMPLE: &str = "\
**🎉 Tech Talk: Cloud Native 2024**
Join us for an evening of <containers> & \"serverless\" talks.

## 📅 Date
May 5, 2024

### Speakers
- Jane Doe, Principal Engineer
- John Roe

Visit [Register here](https://example.com/register?id=5) now
[bad link](javascript:alert(1))";

/// Count non-overlapping occurrences of `needle` in `haystack`.
fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

// ═══════════════════════════════════════════════════════════════════════
//  Converter
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn full_invitation_renders_expected_elements() {
    let html = convert_to_html(SAMPLE);

    assert!(html.starts_with("<html><body style="));
    assert!(html.ends_with("</body></html>"));
    assert!(!html.contains("<!DOCTYPE"));
    assert!(!html.contains("<head>"));

    assert!(html.contains("<h2>🎉 Tech Talk: Cloud Native 2024</h2>"));
    assert!(html.contains("<h3>📅 Date</h3>"));
    assert!(html.contains("<h4>Speakers</h4>"));
    assert!(html.contains("<li>Jane Doe, Principal Engineer</li>"));
    assert!(html.contains(
        r#"<p>Visit <a href="https://example.com/register?id=5">Register here</a> now</p>"#
    ));
    assert!(html.contains("<p>[bad link](javascript:alert(1))</p>"));
}

#[test]
fn input_markup_never_survives_unescaped() {
    let html = convert_to_html(SAMPLE);
    assert!(html.contains("&lt;containers&gt; &amp; &quot;serverless&quot;"));
    assert!(!html.contains("<containers>"));
}

#[test]
fn opened_tags_are_closed() {
    let html = convert_to_html(SAMPLE);
    for tag in ["p", "li", "h2", "h3", "h4", "a", "body", "html"] {
        let opens = count(&html, &format!("<{tag}>")) + count(&html, &format!("<{tag} "));
        let closes = count(&html, &format!("</{tag}>"));
        assert_eq!(opens, closes, "unbalanced <{tag}>");
    }
}

#[test]
fn hostile_input_is_fully_escaped() {
    let hostile = "</p><script>x</script>\n- <b>&</b>\n**<i>**\n## <u>";
    let html = convert_to_html(hostile);
    for forbidden in ["<script>", "</script>", "<b>", "<i>", "<u>", "</p><"] {
        assert!(!html.contains(forbidden), "found {forbidden} in {html}");
    }
}

#[test]
fn conversion_is_deterministic() {
    assert_eq!(convert_to_html(SAMPLE), convert_to_html(SAMPLE));
}

#[test]
fn crlf_line_endings_are_handled() {
    let html = convert_to_html("**Title**\r\n- item\r\n");
    assert!(html.contains("<h2>Title</h2>"));
    assert!(html.contains("<li>item</li>"));
}

// ═══════════════════════════════════════════════════════════════════════
//  Resolver
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn resolver_result_is_always_a_substring_of_input() {
    let inputs = [
        "",
        "no links at all",
        "https://example.com/REGISTER",
        "prefix https://a.b/register\"quoted",
        "http://x/register\thttps://y/register",
        "\u{0}\u{1}binary-ish https://z/registration",
    ];
    for input in inputs {
        if let Some(found) = extract_registration_link(input) {
            assert!(input.contains(found));
            assert!(found.to_lowercase().contains("register"));
            assert!(found.to_lowercase().starts_with("http"));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Resolve + finalize
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn page_link_is_resolved_and_appended_once() {
    let raw = "Event page. Tickets: https://events.example.com/register/123 (free)";
    let link = resolve_registration_link(None, raw);
    assert_eq!(link.as_deref(), Some("https://events.example.com/register/123"));

    let (inv, outcome) = FinalizedInvitation::finalize("**Event**", link.as_deref());
    assert!(matches!(outcome, LinkOutcome::Appended(_)));

    let token = registration_token("https://events.example.com/register/123");
    assert_eq!(count(inv.as_str(), &token), 1);

    let (again, _) = FinalizedInvitation::finalize(inv.as_str(), link.as_deref());
    assert_eq!(count(again.as_str(), &token), 1);
}

#[test]
fn no_link_anywhere_reports_missing() {
    let link = resolve_registration_link(None, "https://example.com/about");
    let (_, outcome) = FinalizedInvitation::finalize("Body", link.as_deref());
    assert_eq!(outcome, LinkOutcome::Missing);
}
