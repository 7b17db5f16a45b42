//! Generated-text extraction from inference responses.
//!
//! Providers and model families answer in different JSON shapes.  Each
//! shape is handled by an independent, side-effect-free strategy; strategies
//! are tried in order and the first one that recognises the body wins.  A
//! body no strategy recognises yields an empty string rather than an error.

use serde_json::Value;

/// A single extraction strategy: return the generated text if `body` has
/// the shape this strategy understands.
pub type ExtractionStrategy = fn(&Value) -> Option<&str>;

/// Strategies in priority order, with a name for diagnostics.
pub const STRATEGIES: &[(&str, ExtractionStrategy)] = &[
    ("output.message.content", nested_message_content),
    ("content[0].text", content_block_list),
    ("content", content_string),
    ("result", result_string),
];

/// Extract the generated text from a response body, trimmed.
///
/// Returns an empty string when no strategy matches.
pub fn extract_generated_text(body: &Value) -> String {
    STRATEGIES
        .iter()
        .find_map(|(name, strategy)| {
            strategy(body).map(|text| {
                tracing::debug!(strategy = *name, "extracted generated text");
                text.trim().to_owned()
            })
        })
        .unwrap_or_default()
}

/// Converse-style shape: `{"output": {"message": {"content": [{"text": ...}]}}}`.
fn nested_message_content(body: &Value) -> Option<&str> {
    body.get("output")?
        .get("message")?
        .get("content")?
        .as_array()?
        .first()?
        .get("text")?
        .as_str()
}

/// Messages-API shape: `{"content": [{"type": "text", "text": ...}]}`.
fn content_block_list(body: &Value) -> Option<&str> {
    body.get("content")?
        .as_array()?
        .first()?
        .get("text")?
        .as_str()
}

/// Flat string content: `{"content": "..."}`.
fn content_string(body: &Value) -> Option<&str> {
    body.get("content")?.as_str()
}

/// Flat result string: `{"result": "..."}`.
fn result_string(body: &Value) -> Option<&str> {
    body.get("result")?.as_str()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nova_converse_shape() {
        let body = json!({
            "output": {"message": {"role": "assistant", "content": [{"text": "  **Hi**\n"}]}},
            "stopReason": "end_turn"
        });
        assert_eq!(extract_generated_text(&body), "**Hi**");
    }

    #[test]
    fn anthropic_messages_shape() {
        let body = json!({
            "id": "msg_01",
            "type": "message",
            "content": [{"type": "text", "text": "Invitation\n"}]
        });
        assert_eq!(extract_generated_text(&body), "Invitation");
    }

    #[test]
    fn flat_content_string() {
        assert_eq!(extract_generated_text(&json!({"content": " text "})), "text");
    }

    #[test]
    fn flat_result_string() {
        assert_eq!(extract_generated_text(&json!({"result": "done"})), "done");
    }

    #[test]
    fn malformed_output_falls_through_to_next_strategy() {
        let body = json!({
            "output": {"message": {"content": []}},
            "result": "fallback"
        });
        assert_eq!(extract_generated_text(&body), "fallback");
    }

    #[test]
    fn earlier_strategy_takes_priority() {
        let body = json!({
            "output": {"message": {"content": [{"text": "nested"}]}},
            "content": [{"text": "flat"}],
            "result": "result"
        });
        assert_eq!(extract_generated_text(&body), "nested");
    }

    #[test]
    fn unrecognised_shapes_yield_empty() {
        for body in [
            json!({}),
            json!(null),
            json!([1, 2, 3]),
            json!("just a string"),
            json!({"content": []}),
            json!({"content": [{"type": "image"}]}),
            json!({"content": 42}),
            json!({"result": {"nested": true}}),
            json!({"output": "not an object"}),
        ] {
            assert_eq!(extract_generated_text(&body), "", "body: {body}");
        }
    }

    #[test]
    fn strategy_names_are_unique() {
        let mut names: Vec<&str> = STRATEGIES.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), STRATEGIES.len());
    }
}
