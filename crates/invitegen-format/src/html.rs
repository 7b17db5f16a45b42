//! Invitation dialect to HTML conversion.
//!
//! Every physical line is escaped, link-rewritten and classified on its own;
//! no state is carried between lines.  The output is intentionally a bare
//! `<html><body>` shell without doctype or head, which is what desktop mail
//! clients render most predictably when the body is pasted into a draft.

use std::sync::OnceLock;

use regex::Regex;

/// Opening of the document shell.
const DOCUMENT_OPEN: &str = r#"<html><body style="font-family: Arial, sans-serif; font-size: 14px;">"#;

/// Closing of the document shell.
const DOCUMENT_CLOSE: &str = "</body></html>";

/// Markdown-style link `[label](http(s)://...)`.
const MARKDOWN_LINK_PATTERN: &str = r"\[([^\]]+)\]\((https?://[^\)]+)\)";

fn markdown_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MARKDOWN_LINK_PATTERN).expect("markdown link pattern is valid"))
}

/// Convert invitation text into a complete HTML document.
///
/// Classification per line, first match wins:
///
/// | line | output |
/// |---|---|
/// | empty / whitespace only | `<br>` |
/// | trimmed starts with `- ` | `<li>` |
/// | starts and ends with `**` | `<h2>` |
/// | starts with `## ` | `<h3>` |
/// | starts with `### ` | `<h4>` |
/// | anything else | `<p>` |
///
/// Never panics; malformed link syntax is left as escaped text.
pub fn convert_to_html(text: &str) -> String {
    let lines = split_lines(text);
    let mut parts: Vec<String> = Vec::with_capacity(lines.len() + 2);
    parts.push(DOCUMENT_OPEN.to_owned());
    parts.extend(lines.into_iter().map(render_line));
    parts.push(DOCUMENT_CLOSE.to_owned());
    parts.join("\n")
}

/// Split `text` into lines on every Unicode line boundary.
///
/// Besides `\n` and `\r\n` this breaks on a lone `\r`, vertical tab, form
/// feed, the file/group/record separators, NEL, U+2028 and U+2029.  A
/// trailing separator does not produce an empty final line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if !is_line_boundary(ch) {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + ch.len_utf8();
        if ch == '\r' && matches!(chars.peek(), Some((_, '\n'))) {
            chars.next();
            start += 1;
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn is_line_boundary(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Render a single line of the dialect.
fn render_line(raw: &str) -> String {
    let escaped = escape_html(raw);
    let line = rewrite_links(&escaped);
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return "<br>".to_owned();
    }
    if let Some(item) = trimmed.strip_prefix("- ") {
        return format!("<li>{item}</li>");
    }
    if line.starts_with("**") && line.ends_with("**") {
        let heading = line.trim_matches(|c| c == '*' || c == ' ');
        return format!("<h2>{heading}</h2>");
    }
    if let Some(heading) = line.strip_prefix("## ") {
        return format!("<h3>{}</h3>", heading.trim());
    }
    if let Some(heading) = line.strip_prefix("### ") {
        return format!("<h4>{}</h4>", heading.trim());
    }
    format!("<p>{line}</p>")
}

/// Replace every `[label](url)` with an anchor element.
///
/// Runs on already-escaped text, so `label` and `url` carry no raw markup.
fn rewrite_links(line: &str) -> String {
    markdown_link_regex()
        .replace_all(line, r#"<a href="${2}">${1}</a>"#)
        .into_owned()
}

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
