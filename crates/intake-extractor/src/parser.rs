//! Parse LLM output into a ParsedDocument
//!
//! The model reply is untrusted free-form text. Parsing locates the JSON
//! object inside it, checks the shape of every field the schema cares about,
//! and coerces values into the fixed document schema. Parsing never panics and
//! always yields a document; failures carry an error next to an all-default
//! document so callers cannot mistake zeroed fields for a genuine empty
//! invoice.

use crate::error::ExtractorError;
use intake_domain::{DocumentItem, ParsedDocument};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Sentinels some models emit instead of `null` for missing numbers
const NOT_FOUND_SENTINELS: [&str; 2] = ["данные не найдены", "data not found"];

const TEXT_FIELDS: [&str; 5] = ["invoice_number", "invoice_date", "edrpou", "ipn", "supplier"];
const TOTAL_FIELDS: [&str; 3] = ["total_no_pdv", "total_pdv", "total_with_pdv"];
const ITEM_TEXT_FIELDS: [&str; 3] = ["name", "article", "unit"];
const ITEM_NUMBER_FIELDS: [&str; 5] = [
    "quantity",
    "price_no_pdv",
    "price_with_pdv",
    "total_no_pdv",
    "total_with_pdv",
];

/// Outcome of parsing one model reply
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutput {
    /// Extracted document; all defaults when `error` is set
    pub document: ParsedDocument,

    /// Why parsing failed, if it did
    pub error: Option<ExtractorError>,
}

impl ParsedOutput {
    /// Success carries the document, failure carries the error
    pub fn into_result(self) -> Result<ParsedDocument, ExtractorError> {
        match self.error {
            None => Ok(self.document),
            Some(e) => Err(e),
        }
    }
}

/// Parse a raw model reply
///
/// # Examples
///
/// ```
/// use intake_extractor::parser::parse;
///
/// let output = parse(r#"Here you go: {"invoice_number": "Л-25/46", "total_pdv": "100"} Thanks!"#);
/// let doc = output.into_result().unwrap();
/// assert_eq!(doc.invoice_number, "Л-25/46");
/// assert_eq!(doc.total_pdv, 100.0);
/// ```
pub fn parse(raw: &str) -> ParsedOutput {
    match try_parse(raw) {
        Ok(document) => {
            debug!(items = document.items.len(), "Parsed model reply");
            ParsedOutput {
                document,
                error: None,
            }
        }
        Err(e) => {
            warn!(error = %e, reply_chars = raw.len(), "Could not parse model reply");
            ParsedOutput {
                document: ParsedDocument::default(),
                error: Some(e),
            }
        }
    }
}

fn try_parse(raw: &str) -> Result<ParsedDocument, ExtractorError> {
    let json_str = extract_json(raw)?;
    let json: Value = serde_json::from_str(json_str)?;
    let obj = validate_shape(&json)?;

    let items = match obj.get("items") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .map(parse_item)
            .collect(),
        _ => Vec::new(),
    };

    Ok(ParsedDocument {
        invoice_number: coerce_text(obj.get("invoice_number")),
        invoice_date: coerce_text(obj.get("invoice_date")),
        edrpou: coerce_text(obj.get("edrpou")),
        ipn: coerce_text(obj.get("ipn")),
        supplier: coerce_text(obj.get("supplier")),
        is_price_with_pdv: obj.get("isPriceWithPdv").map(coerce_bool).unwrap_or(false),
        items,
        total_no_pdv: field_number(obj, "total_no_pdv"),
        total_pdv: field_number(obj, "total_pdv"),
        total_with_pdv: field_number(obj, "total_with_pdv"),
    })
}

fn parse_item(obj: &Map<String, Value>) -> DocumentItem {
    let article = coerce_text(obj.get("article"));
    DocumentItem {
        name: coerce_text(obj.get("name")),
        article: (!article.is_empty()).then_some(article),
        quantity: field_number(obj, "quantity"),
        unit: coerce_text(obj.get("unit")),
        price_no_pdv: field_number(obj, "price_no_pdv"),
        price_with_pdv: field_number(obj, "price_with_pdv"),
        total_no_pdv: field_number(obj, "total_no_pdv"),
        total_with_pdv: field_number(obj, "total_with_pdv"),
    }
}

/// Slice from the first `{` through the last `}`
///
/// An object that opens right after a `[` is an array element; the reply as
/// a whole is then an array and is rejected.
fn extract_json(raw: &str) -> Result<&str, ExtractorError> {
    if raw.trim().is_empty() {
        return Err(ExtractorError::MalformedOutput("model reply is empty".to_string()));
    }

    let (start, end) = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => {
            return Err(ExtractorError::MalformedOutput(
                "no JSON object found in model reply".to_string(),
            ))
        }
    };

    if raw[..start].trim_end().ends_with('[') {
        return Err(ExtractorError::InvalidShape(
            "expected a JSON object, got an array".to_string(),
        ));
    }

    Ok(&raw[start..=end])
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_text(obj: &Map<String, Value>, field: &str, context: &str) -> Result<(), ExtractorError> {
    match obj.get(field) {
        None | Some(Value::Null) | Some(Value::String(_)) | Some(Value::Number(_)) => Ok(()),
        Some(other) => Err(ExtractorError::InvalidShape(format!(
            "{}{} must be text, got {}",
            context,
            field,
            kind_of(other)
        ))),
    }
}

fn check_scalar(obj: &Map<String, Value>, field: &str, context: &str) -> Result<(), ExtractorError> {
    match obj.get(field) {
        Some(other @ (Value::Array(_) | Value::Object(_))) => Err(ExtractorError::InvalidShape(format!(
            "{}{} must be a scalar, got {}",
            context,
            field,
            kind_of(other)
        ))),
        _ => Ok(()),
    }
}

/// Reject clearly invalid shapes before coercion
fn validate_shape(json: &Value) -> Result<&Map<String, Value>, ExtractorError> {
    let obj = json.as_object().ok_or_else(|| {
        ExtractorError::InvalidShape(format!("expected a JSON object, got {}", kind_of(json)))
    })?;

    for field in TEXT_FIELDS {
        check_text(obj, field, "")?;
    }
    for field in TOTAL_FIELDS {
        check_scalar(obj, field, "")?;
    }
    check_scalar(obj, "isPriceWithPdv", "")?;

    match obj.get("items") {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            for (idx, item) in items.iter().enumerate() {
                let context = format!("items[{}].", idx);
                let item = item.as_object().ok_or_else(|| {
                    ExtractorError::InvalidShape(format!(
                        "items[{}] must be an object, got {}",
                        idx,
                        kind_of(item)
                    ))
                })?;
                for field in ITEM_TEXT_FIELDS {
                    check_text(item, field, &context)?;
                }
                for field in ITEM_NUMBER_FIELDS {
                    check_scalar(item, field, &context)?;
                }
            }
        }
        Some(other) => {
            return Err(ExtractorError::InvalidShape(format!(
                "items must be a list, got {}",
                kind_of(other)
            )))
        }
    }

    Ok(obj)
}

fn field_number(obj: &Map<String, Value>, field: &str) -> f64 {
    obj.get(field).map(coerce_number).unwrap_or(0.0)
}

/// Text fields: strings as-is, numbers in their JSON form, anything else empty
fn coerce_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Boolean flag coercion
///
/// JSON booleans as-is, the string `"true"` (any case) as true, non-zero
/// numbers as true, everything else false.
pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

/// Coerce any JSON value into a finite number
///
/// Numbers pass through; `null`, the not-found sentinels and anything
/// unparseable become 0. Strings are parsed from their longest numeric prefix,
/// locale-naively, so `"12.5 грн"` is 12.5 and `"1,5"` is 1.
///
/// Total and idempotent: the result is always finite, and coercing a result
/// again returns it unchanged.
///
/// # Examples
///
/// ```
/// use intake_extractor::parser::coerce_number;
/// use serde_json::json;
///
/// assert_eq!(coerce_number(&json!(7)), 7.0);
/// assert_eq!(coerce_number(&json!("12.5")), 12.5);
/// assert_eq!(coerce_number(&json!(null)), 0.0);
/// assert_eq!(coerce_number(&json!("abc")), 0.0);
/// ```
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let trimmed = s.trim();
            if NOT_FOUND_SENTINELS.iter().any(|x| trimmed.eq_ignore_ascii_case(x)) {
                0.0
            } else {
                parse_float_prefix(trimmed).unwrap_or(0.0)
            }
        }
        _ => 0.0,
    };

    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Parse the longest prefix of `s` shaped like `[+-]?(d+[.d*]|.d+)([eE][+-]?d+)?`
fn parse_float_prefix(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - frac_start;
        if digits > 0 {
            i = j;
        }
    }

    if digits == 0 {
        return None;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    s[..i].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    const WORKED_EXAMPLE: &str = r#"{
        "invoice_number": "Л-25/46",
        "invoice_date": "01.01.2025",
        "edrpou": "35601501",
        "ipn": "356015004822",
        "supplier": "ТОВ 'Будматеріали'",
        "isPriceWithPdv": true,
        "items": [
            {
                "name": "Кирпич",
                "article": null,
                "quantity": 10,
                "unit": "100шт",
                "price_no_pdv": 100,
                "price_with_pdv": 110,
                "total_no_pdv": 1000,
                "total_with_pdv": 1100
            }
        ],
        "total_no_pdv": 1000,
        "total_pdv": 100,
        "total_with_pdv": 1100
    }"#;

    fn assert_default_failure(output: &ParsedOutput) {
        assert!(output.error.is_some());
        assert_eq!(output.document, ParsedDocument::default());
        assert!(output.document.is_empty());
    }

    #[test]
    fn test_coerce_number_cases() {
        assert_eq!(coerce_number(&json!(null)), 0.0);
        assert_eq!(coerce_number(&json!("data not found")), 0.0);
        assert_eq!(coerce_number(&json!("данные не найдены")), 0.0);
        assert_eq!(coerce_number(&json!("12.5")), 12.5);
        assert_eq!(coerce_number(&json!("abc")), 0.0);
        assert_eq!(coerce_number(&json!(7)), 7.0);
        assert_eq!(coerce_number(&json!(-3.25)), -3.25);
        assert_eq!(coerce_number(&json!("12.5 грн")), 12.5);
        assert_eq!(coerce_number(&json!("  42  ")), 42.0);
        assert_eq!(coerce_number(&json!("1,5")), 1.0);
        assert_eq!(coerce_number(&json!(".5")), 0.5);
        assert_eq!(coerce_number(&json!("1e3")), 1000.0);
        assert_eq!(coerce_number(&json!("1e")), 1.0);
        assert_eq!(coerce_number(&json!("1e999")), 0.0);
        assert_eq!(coerce_number(&json!("Infinity")), 0.0);
        assert_eq!(coerce_number(&json!(true)), 0.0);
        assert_eq!(coerce_number(&json!([5])), 0.0);
    }

    #[test]
    fn test_coerce_bool_cases() {
        assert!(coerce_bool(&json!(true)));
        assert!(coerce_bool(&json!("TRUE")));
        assert!(coerce_bool(&json!(1)));
        assert!(!coerce_bool(&json!(0)));
        assert!(!coerce_bool(&json!("false")));
        assert!(!coerce_bool(&json!("yes")));
        assert!(!coerce_bool(&json!(null)));
    }

    #[test]
    fn test_parse_worked_example() {
        let doc = parse(WORKED_EXAMPLE).into_result().unwrap();
        assert_eq!(doc.invoice_number, "Л-25/46");
        assert_eq!(doc.edrpou, "35601501");
        assert_eq!(doc.ipn, "356015004822");
        assert!(doc.is_price_with_pdv);
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].article, None);
        assert_eq!(doc.items[0].quantity, 10.0);
        assert_eq!(doc.items[0].unit, "100шт");
        assert_eq!(doc.total_with_pdv, 1100.0);
    }

    #[test]
    fn test_parse_ignores_surrounding_prose() {
        let wrapped = format!("Sure! Here is the data:\n```json\n{}\n```\nLet me know.", WORKED_EXAMPLE);
        let bare = parse(WORKED_EXAMPLE).into_result().unwrap();
        let noisy = parse(&wrapped).into_result().unwrap();
        assert_eq!(bare, noisy);
    }

    #[test]
    fn test_missing_fields_default() {
        let doc = parse(r#"{"supplier": "ФОП Коваль"}"#).into_result().unwrap();
        assert_eq!(doc.supplier, "ФОП Коваль");
        assert_eq!(doc.invoice_number, "");
        assert!(!doc.is_price_with_pdv);
        assert!(doc.items.is_empty());
        assert_eq!(doc.total_pdv, 0.0);
    }

    #[test]
    fn test_numeric_identifiers_become_text() {
        let doc = parse(r#"{"edrpou": 35601501, "ipn": 356015004822}"#).into_result().unwrap();
        assert_eq!(doc.edrpou, "35601501");
        assert_eq!(doc.ipn, "356015004822");
    }

    #[test]
    fn test_item_values_are_coerced() {
        let doc = parse(
            r#"{"items": [{"name": null, "article": "", "quantity": "5", "unit": "м³", "price_no_pdv": "data not found"}]}"#,
        )
        .into_result()
        .unwrap();
        let item = &doc.items[0];
        assert_eq!(item.name, "");
        assert_eq!(item.article, None);
        assert_eq!(item.quantity, 5.0);
        assert_eq!(item.price_no_pdv, 0.0);
        assert_eq!(item.total_with_pdv, 0.0);
    }

    #[test]
    fn test_null_items_is_empty_list() {
        let doc = parse(r#"{"items": null}"#).into_result().unwrap();
        assert!(doc.items.is_empty());
    }

    #[test]
    fn test_non_list_items_rejected() {
        let output = parse(r#"{"invoice_number": "1", "items": {"name": "Кирпич"}}"#);
        assert!(matches!(output.error, Some(ExtractorError::InvalidShape(_))));
        assert_default_failure(&output);
    }

    #[test]
    fn test_non_object_item_rejected() {
        let output = parse(r#"{"items": [{"name": "a"}, "b"]}"#);
        assert!(matches!(output.error, Some(ExtractorError::InvalidShape(ref m)) if m.contains("items[1]")));
    }

    #[test]
    fn test_structured_text_field_rejected() {
        let output = parse(r#"{"supplier": {"name": "ТОВ"}}"#);
        assert!(matches!(output.error, Some(ExtractorError::InvalidShape(_))));
    }

    #[test]
    fn test_structured_number_field_rejected() {
        let output = parse(r#"{"items": [{"quantity": [1, 2]}]}"#);
        assert!(matches!(output.error, Some(ExtractorError::InvalidShape(_))));
    }

    #[test]
    fn test_malformed_inputs_never_panic() {
        for raw in ["", "   ", "no braces here", r#"{"invoice_number": "1""#, "[1, 2, 3]", "} {"] {
            let output = parse(raw);
            assert_default_failure(&output);
            assert!(matches!(output.error, Some(ExtractorError::MalformedOutput(_))), "input {:?}", raw);
        }
    }

    #[test]
    fn test_array_of_objects_rejected() {
        let output = parse(r#"[{"invoice_number": "1"}]"#);
        assert_default_failure(&output);
        assert!(matches!(output.error, Some(ExtractorError::InvalidShape(_))));
    }

    proptest! {
        #[test]
        fn prop_coerce_is_total_and_idempotent(s in "\\PC*") {
            let once = coerce_number(&json!(s));
            prop_assert!(once.is_finite());
            prop_assert_eq!(coerce_number(&json!(once)), once);
        }

        #[test]
        fn prop_coerce_numbers_pass_through(x in -1.0e12f64..1.0e12f64) {
            prop_assert_eq!(coerce_number(&json!(x)), x);
        }

        #[test]
        fn prop_parse_never_panics(s in "\\PC*") {
            let output = parse(&s);
            if output.error.is_some() {
                prop_assert!(output.document.is_empty());
            }
        }
    }
}
