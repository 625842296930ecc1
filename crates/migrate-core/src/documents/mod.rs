//! Document payload handling: id rewriting, validation, title stamping.

pub mod rewrite;

pub use rewrite::{AssetRewriter, RewriteOutcome};

use serde_json::Value;

/// Display title for one document, defensively extracted.
///
/// Looks for `data.title[0].text`, falling back to a positional
/// placeholder when the structure is absent or shaped differently.
pub fn display_title(document: &Value, index: usize) -> String {
    document
        .get("data")
        .and_then(|data| data.get("title"))
        .and_then(|title| title.as_array())
        .and_then(|spans| spans.first())
        .and_then(|span| span.get("text"))
        .and_then(|text| text.as_str())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("document {index}"))
}

/// Whether the document carries the fields the migration endpoint requires.
pub fn has_required_fields(document: &Value) -> bool {
    document.get("id").and_then(Value::as_str).is_some()
        && document.get("type").and_then(Value::as_str).is_some()
}

/// Stamp the display title onto the migration payload.
pub fn stamp_title(document: &mut Value, title: &str) {
    if let Value::Object(map) = document {
        map.insert("title".to_string(), Value::String(title.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_title_from_data() {
        let document = json!({
            "data": { "title": [ { "type": "heading1", "text": "Welcome" } ] }
        });
        assert_eq!(display_title(&document, 4), "Welcome");
    }

    #[test]
    fn test_display_title_fallbacks() {
        assert_eq!(display_title(&json!({}), 2), "document 2");
        assert_eq!(
            display_title(&json!({ "data": { "title": [] } }), 0),
            "document 0"
        );
        assert_eq!(
            display_title(&json!({ "data": { "title": "plain string" } }), 7),
            "document 7"
        );
        assert_eq!(
            display_title(&json!({ "data": { "title": [ { "text": "" } ] } }), 1),
            "document 1"
        );
    }

    #[test]
    fn test_has_required_fields() {
        assert!(has_required_fields(&json!({ "id": "x", "type": "page" })));
        assert!(!has_required_fields(&json!({ "id": "x" })));
        assert!(!has_required_fields(&json!({ "id": 42, "type": "page" })));
    }

    #[test]
    fn test_stamp_title() {
        let mut document = json!({ "id": "x", "type": "page" });
        stamp_title(&mut document, "Welcome");
        assert_eq!(document["title"], "Welcome");
    }
}
