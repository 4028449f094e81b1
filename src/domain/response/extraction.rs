//! JSON recovery from noisy model output

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// First fenced block, with or without a `json` language tag
static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```[ \t]*(?:json)?[ \t]*\r?\n?(.*?)```").unwrap());

/// Runs of three or more backslashes in front of r/n/t (double-escaping artifact)
static OVER_ESCAPED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\{3,}([rnt])").unwrap());

/// Which strategy recovered the JSON object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Direct,
    FencedBlock,
    BalancedBraces,
    EscapeRepair,
}

/// Recover a JSON object from raw model output.
///
/// Strategies are tried in order: direct parse, first fenced block, first
/// balanced `{...}` span, then the same three on an escape-repaired copy.
pub fn extract_json_object(raw: &str) -> Option<(Map<String, Value>, ExtractionMethod)> {
    if let Some((object, method)) = extract_plain(raw) {
        return Some((object, method));
    }

    let repaired = repair_escapes(raw);
    extract_plain(&repaired).map(|(object, _)| (object, ExtractionMethod::EscapeRepair))
}

fn extract_plain(text: &str) -> Option<(Map<String, Value>, ExtractionMethod)> {
    if let Some(object) = parse_object(text) {
        return Some((object, ExtractionMethod::Direct));
    }

    if let Some(object) = fenced_block(text).and_then(parse_object) {
        return Some((object, ExtractionMethod::FencedBlock));
    }

    balanced_object(text).map(|object| (object, ExtractionMethod::BalancedBraces))
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// Contents of the first fenced code block
pub fn fenced_block(text: &str) -> Option<&str> {
    FENCED_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// First balanced `{...}` span that parses as an object.
///
/// Every opening brace is a candidate, so prose placeholders such as
/// `{name}` before the payload never hide it.
fn balanced_object(text: &str) -> Option<Map<String, Value>> {
    text.match_indices('{')
        .filter_map(|(start, _)| balanced_span(&text[start..]))
        .find_map(parse_object)
}

/// Span from the opening brace at the start of `text` to its matching close.
///
/// Braces inside string literals are ignored.
pub fn balanced_span(text: &str) -> Option<&str> {
    if !text.starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Undo double-escaping and escape raw control characters inside strings
pub fn repair_escapes(text: &str) -> String {
    let collapsed = OVER_ESCAPED.replace_all(text, r"\${1}");
    escape_control_chars_in_strings(&collapsed)
}

fn escape_control_chars_in_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(ch);
                continue;
            }

            match ch {
                '\\' => {
                    escaped = true;
                    out.push(ch);
                }
                '"' => {
                    in_string = false;
                    out.push(ch);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                _ => out.push(ch),
            }
        } else {
            if ch == '"' {
                in_string = true;
            }
            out.push(ch);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(raw: &str) -> Option<(Value, ExtractionMethod)> {
        extract_json_object(raw).map(|(o, m)| (Value::Object(o), m))
    }

    #[test]
    fn test_direct_parse() {
        let (value, method) = extract(r#"  {"a": 1}  "#).unwrap();
        assert_eq!(value, json!({"a": 1}));
        assert_eq!(method, ExtractionMethod::Direct);
    }

    #[test]
    fn test_fenced_json_block() {
        let raw = "Here is the analysis you asked for:\n```json\n{\"score\": 8}\n```\nLet me know!";
        let (value, method) = extract(raw).unwrap();
        assert_eq!(value, json!({"score": 8}));
        assert_eq!(method, ExtractionMethod::FencedBlock);
    }

    #[test]
    fn test_fenced_block_without_language() {
        let raw = "```\n{\"ok\": true}\n```";
        let (value, _) = extract(raw).unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[test]
    fn test_balanced_span_in_prose() {
        let raw = r#"Sure! The result is {"title": "A {curly} title", "n": {"x": 1}} - hope it helps."#;
        let (value, method) = extract(raw).unwrap();
        assert_eq!(value, json!({"title": "A {curly} title", "n": {"x": 1}}));
        assert_eq!(method, ExtractionMethod::BalancedBraces);
    }

    #[test]
    fn test_balanced_span_skips_non_json_braces() {
        let raw = r#"Use {placeholders} carefully. {"real": "json"}"#;
        let (value, _) = extract(raw).unwrap();
        assert_eq!(value, json!({"real": "json"}));
    }

    #[test]
    fn test_payload_after_many_placeholder_braces() {
        let prose: Vec<String> = (0..70).map(|i| format!("{{slot{}}}", i)).collect();
        let raw = format!("{} and finally {{\"score\": 8}}", prose.join(" "));

        let (value, method) = extract(&raw).unwrap();
        assert_eq!(value, json!({"score": 8}));
        assert_eq!(method, ExtractionMethod::BalancedBraces);
    }

    #[test]
    fn test_escape_repair_of_raw_newlines() {
        let raw = "{\"content\": \"line one\nline two\"}";
        let (value, method) = extract(raw).unwrap();
        assert_eq!(value, json!({"content": "line one\nline two"}));
        assert_eq!(method, ExtractionMethod::EscapeRepair);
    }

    #[test]
    fn test_collapse_over_escaped_sequences() {
        let repaired = repair_escapes(r#"{"a": "x\\\\ny\\\tz"}"#);
        assert_eq!(repaired, r#"{"a": "x\ny\tz"}"#);
    }

    #[test]
    fn test_top_level_array_is_not_an_object() {
        assert!(extract("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_non_json() {
        assert!(extract("I could not produce an answer.").is_none());
        assert!(extract("").is_none());
    }

    #[test]
    fn test_unbalanced_span() {
        assert!(balanced_span("{\"a\": {\"b\": 1}").is_none());
        assert_eq!(balanced_span("{\"a\": \"}\"} tail"), Some("{\"a\": \"}\"}"));
    }
}
