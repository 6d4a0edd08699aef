//! Normalize heterogeneous OCR responses into plain text
//!
//! Vendors populate different fields depending on the document. Strategies
//! are tried in a fixed order and the first one yielding non-empty text wins:
//!
//! 1. top-level `text`
//! 2. `document.text`
//! 3. `pages[]`, each page's `text` or else `markdown`, plus any `tables`
//! 4. `blocks[]` with non-empty `text`
//! 5. top-level `content` (string as-is, anything else JSON-serialized)

use crate::error::ExtractorError;
use serde_json::{Map, Value};
use tracing::debug;

/// Extract text from an OCR response
///
/// # Errors
///
/// [`ExtractorError::NoTextFound`] when no strategy yields text.
///
/// # Examples
///
/// ```
/// use intake_extractor::ocr::extract_text;
/// use serde_json::json;
///
/// let response = json!({"pages": [{"index": 1, "markdown": "Рахунок № 5"}]});
/// assert_eq!(extract_text(&response).unwrap(), "=== Page 1 ===\nРахунок № 5");
/// ```
pub fn extract_text(response: &Value) -> Result<String, ExtractorError> {
    let strategies: [(&str, fn(&Value) -> Option<String>); 5] = [
        ("text", top_level_text),
        ("document.text", document_text),
        ("pages", pages_text),
        ("blocks", blocks_text),
        ("content", content_text),
    ];

    for (name, strategy) in strategies {
        if let Some(text) = strategy(response).filter(|t| !t.is_empty()) {
            debug!(strategy = name, chars = text.len(), "Extracted OCR text");
            return Ok(text);
        }
    }

    Err(ExtractorError::NoTextFound)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn top_level_text(response: &Value) -> Option<String> {
    non_empty_str(response.get("text")).map(str::to_string)
}

fn document_text(response: &Value) -> Option<String> {
    non_empty_str(response.get("document").and_then(|d| d.get("text"))).map(str::to_string)
}

/// First non-zero of `page_number` and `index`, else 0
fn page_number(page: &Map<String, Value>) -> u64 {
    ["page_number", "index"]
        .iter()
        .filter_map(|key| page.get(*key).and_then(Value::as_u64))
        .find(|n| *n != 0)
        .unwrap_or(0)
}

fn pages_text(response: &Value) -> Option<String> {
    let pages = response.get("pages")?.as_array()?;

    let mut fragments = Vec::new();
    for page in pages.iter().filter_map(Value::as_object) {
        let number = page_number(page);

        let body = non_empty_str(page.get("text")).or_else(|| non_empty_str(page.get("markdown")));
        if let Some(body) = body {
            fragments.push(format!("=== Page {} ===\n{}", number, body));
        }

        if let Some(tables) = page.get("tables").and_then(Value::as_array) {
            if !tables.is_empty() {
                let serialized = serde_json::to_string_pretty(tables).unwrap_or_default();
                fragments.push(format!("--- Tables on page {} ---\n{}", number, serialized));
            }
        }
    }

    debug!(pages = pages.len(), fragments = fragments.len(), "Collected OCR pages");
    Some(fragments.join("\n\n"))
}

fn blocks_text(response: &Value) -> Option<String> {
    let blocks = response.get("blocks")?.as_array()?;

    let rendered: Vec<String> = blocks
        .iter()
        .filter_map(|block| {
            let text = non_empty_str(block.get("text"))?;
            let page = block.get("page_index").and_then(Value::as_u64).unwrap_or(0);
            Some(format!("[Block on page {}]: {}", page, text))
        })
        .collect();

    Some(rendered.join("\n\n"))
}

fn content_text(response: &Value) -> Option<String> {
    match response.get("content")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_top_level_text_wins_over_pages() {
        let response = json!({
            "text": "flat text",
            "pages": [{"index": 1, "text": "page text"}]
        });
        assert_eq!(extract_text(&response).unwrap(), "flat text");
    }

    #[test]
    fn test_empty_top_level_text_falls_through() {
        let response = json!({"text": "", "document": {"text": "nested"}});
        assert_eq!(extract_text(&response).unwrap(), "nested");
    }

    #[test]
    fn test_page_prefers_text_over_markdown() {
        let response = json!({"pages": [{"page_number": 2, "text": "plain", "markdown": "# md"}]});
        assert_eq!(extract_text(&response).unwrap(), "=== Page 2 ===\nplain");
    }

    #[test]
    fn test_tables_banner_follows_page_text() {
        let response = json!({
            "pages": [
                {"index": 1, "markdown": "Header", "tables": [{"rows": [["Кирпич", "10"]]}]},
                {"index": 2, "markdown": "Footer"}
            ]
        });
        let text = extract_text(&response).unwrap();

        let page_one = text.find("=== Page 1 ===\nHeader").unwrap();
        let tables = text.find("--- Tables on page 1 ---\n").unwrap();
        let page_two = text.find("=== Page 2 ===\nFooter").unwrap();
        assert!(page_one < tables && tables < page_two);
        assert!(text.contains("\"Кирпич\""));
        assert!(text.contains("Header\n\n--- Tables on page 1 ---"));
    }

    #[test]
    fn test_page_number_falls_back_to_index_then_zero() {
        let response = json!({"pages": [
            {"page_number": 0, "index": 3, "text": "a"},
            {"text": "b"}
        ]});
        assert_eq!(
            extract_text(&response).unwrap(),
            "=== Page 3 ===\na\n\n=== Page 0 ===\nb"
        );
    }

    #[test]
    fn test_blocks_skip_empty_text() {
        let response = json!({"blocks": [
            {"page_index": 1, "text": "first"},
            {"page_index": 1, "text": ""},
            {"page_index": 2, "text": "second"}
        ]});
        assert_eq!(
            extract_text(&response).unwrap(),
            "[Block on page 1]: first\n\n[Block on page 2]: second"
        );
    }

    #[test]
    fn test_pages_without_text_fall_through_to_blocks() {
        let response = json!({
            "pages": [{"index": 1}],
            "blocks": [{"page_index": 1, "text": "block"}]
        });
        assert_eq!(extract_text(&response).unwrap(), "[Block on page 1]: block");
    }

    #[test]
    fn test_content_string_and_object() {
        assert_eq!(extract_text(&json!({"content": "raw"})).unwrap(), "raw");
        assert_eq!(
            extract_text(&json!({"content": {"a": 1}})).unwrap(),
            r#"{"a":1}"#
        );
    }

    #[test]
    fn test_nothing_found() {
        assert_eq!(extract_text(&json!({})), Err(ExtractorError::NoTextFound));
        assert_eq!(
            extract_text(&json!({"pages": [], "blocks": [], "content": null})),
            Err(ExtractorError::NoTextFound)
        );
    }
}
