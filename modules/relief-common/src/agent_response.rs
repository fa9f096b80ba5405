//! Best-effort parsing of free-form agent replies.
//!
//! Agents are asked for structured output but answer in whatever shape they
//! like: JSON, YAML, loose `key: value` lines, or prose. Strategies are tried
//! in order and the first one that yields a record wins. Parsing never fails;
//! the last resort wraps the raw text as the comment.

use std::fmt;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde_json::{json, Map, Number, Value};
use tracing::{debug, info};

use crate::amount::normalize_amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    Json,
    Yaml,
    KeyValue,
    Regex,
    Fallback,
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::KeyValue => "key_value",
            Self::Regex => "regex",
            Self::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// Structured view over an agent reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub value: Value,
    pub strategy: ParseStrategy,
}

impl ParsedResponse {
    fn field(&self, key: &str) -> Option<&Value> {
        self.value.as_object().and_then(|m| m.get(key))
    }

    /// Normalized amount, if the reply carried a usable one.
    pub fn amount(&self) -> Option<f64> {
        self.field("amount").and_then(normalize_amount)
    }

    pub fn comment(&self) -> String {
        ["comment", "reasoning", "response"]
            .iter()
            .filter_map(|key| self.field(key))
            .find(|v| !v.is_null())
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "No comment available".to_string())
    }

    pub fn sources(&self) -> Vec<String> {
        match self.field("sources") {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

type Strategy = fn(&str) -> Option<Value>;

const STRATEGIES: [(ParseStrategy, Strategy); 4] = [
    (ParseStrategy::Json, parse_json),
    (ParseStrategy::Yaml, parse_yaml),
    (ParseStrategy::KeyValue, parse_key_values),
    (ParseStrategy::Regex, parse_with_regex),
];

pub fn parse_agent_response(text: &str) -> ParsedResponse {
    for (strategy, parse) in STRATEGIES {
        if let Some(value) = parse(text) {
            debug!(%strategy, "Parsed agent response");
            return ParsedResponse { value, strategy };
        }
    }

    info!("Agent response has no recognizable structure, keeping raw text");
    ParsedResponse {
        value: json!({
            "amount": null,
            "comment": text,
            "sources": [],
            "raw_response": text,
        }),
        strategy: ParseStrategy::Fallback,
    }
}

// --- JSON ---

fn parse_json(text: &str) -> Option<Value> {
    serde_json::from_str(text)
        .ok()
        .or_else(|| strip_fence(text).and_then(|inner| serde_json::from_str(inner).ok()))
}

/// Inner text of a markdown code fence, if `text` is fenced.
fn strip_fence(text: &str) -> Option<&str> {
    let rest = text.trim().strip_prefix("```")?;
    let body = match rest.find('\n') {
        Some(idx) if rest[..idx].chars().all(|c| c.is_ascii_alphanumeric()) => &rest[idx + 1..],
        _ => rest,
    };
    Some(body.trim_end().trim_end_matches("```").trim())
}

// --- YAML ---

fn parse_yaml(text: &str) -> Option<Value> {
    let text = strip_fence(text).unwrap_or(text);
    match serde_yaml::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

// --- key: value lines ---

fn parse_key_values(text: &str) -> Option<Value> {
    let mut map = Map::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in text.trim().lines() {
        if line.trim().is_empty() {
            continue;
        }
        let starts_key = line.contains(':') && !line.starts_with(char::is_whitespace);
        if starts_key {
            if let Some((key, lines)) = current.take() {
                map.insert(key, coerce_scalar(&lines.join("\n")));
            }
            let (key, rest) = line.split_once(':').unwrap_or((line, ""));
            let rest = rest.trim();
            let lines = if rest.is_empty() { Vec::new() } else { vec![rest] };
            current = Some((key.trim().to_string(), lines));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line.trim());
        }
    }
    if let Some((key, lines)) = current {
        map.insert(key, coerce_scalar(&lines.join("\n")));
    }

    (!map.is_empty()).then_some(Value::Object(map))
}

/// Integer, then float, then boolean, then string.
fn coerce_scalar(raw: &str) -> Value {
    let value = raw.trim();
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = value.parse::<i64>() {
            return Value::from(n);
        }
    }
    let digits_and_dots = value.chars().all(|c| c.is_ascii_digit() || c == '.');
    if digits_and_dots && value.chars().any(|c| c.is_ascii_digit()) {
        if let Some(n) = value.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    }
    if value.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(value.to_string())
}

// --- regex extraction ---

fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("valid field regex")
}

static AMOUNT_FIELD: LazyLock<Regex> =
    LazyLock::new(|| case_insensitive(r"amount:\s*(\d+(?:\.\d+)?)"));
static REASONING_FIELD: LazyLock<Regex> = LazyLock::new(|| case_insensitive(r"reasoning:\s*"));
static COMMENT_FIELD: LazyLock<Regex> = LazyLock::new(|| case_insensitive(r"comment:\s*"));
static SOURCES_FIELD: LazyLock<Regex> = LazyLock::new(|| case_insensitive(r"sources?:\s*"));
static NEXT_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\w+:").expect("valid key regex"));
static SOURCE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;\n]").expect("valid separator regex"));

/// Text following `label` up to the next `\n<word>:` or end of input.
fn field_text<'a>(label: &Regex, text: &'a str) -> Option<&'a str> {
    let start = label.find(text)?.end();
    let rest = &text[start..];
    // The value must hold at least one character before a following key.
    let first_len = rest.chars().next()?.len_utf8();
    let end = NEXT_KEY
        .find_at(rest, first_len)
        .map(|m| m.start())
        .unwrap_or(rest.len());
    let value = rest[..end].trim();
    (!value.is_empty()).then_some(value)
}

fn parse_with_regex(text: &str) -> Option<Value> {
    let mut map = Map::new();

    if let Some(amount) = AMOUNT_FIELD
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok())
        .and_then(Number::from_f64)
    {
        map.insert("amount".into(), Value::Number(amount));
    }
    if let Some(reasoning) = field_text(&REASONING_FIELD, text) {
        map.insert("reasoning".into(), Value::from(reasoning));
    }
    if let Some(comment) = field_text(&COMMENT_FIELD, text) {
        map.insert("comment".into(), Value::from(comment));
    }
    if let Some(sources) = field_text(&SOURCES_FIELD, text) {
        let list: Vec<Value> = SOURCE_SEPARATOR
            .split(sources)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Value::from)
            .collect();
        map.insert("sources".into(), Value::Array(list));
    }

    (!map.is_empty()).then_some(Value::Object(map))
}

/// The fixtures served by the parser self-test route.
pub const SELF_TEST_FIXTURES: [&str; 3] = [
    r#"{"amount": 1000, "comment": "Test JSON", "sources": ["http://example.com"]}"#,
    "amount: 2000\ncomment: Test YAML\nsources: http://example.com",
    "amount: 3000\nreasoning: The New Life Foundation has provided essential services\nsources: https://newlifefoundation.in/",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_returned_exactly() {
        let text = r#"{"amount": 1000, "comment": "Test JSON", "sources": ["http://example.com"], "extra": {"n": [1, 2]}}"#;
        let parsed = parse_agent_response(text);
        assert_eq!(parsed.strategy, ParseStrategy::Json);
        assert_eq!(parsed.value, serde_json::from_str::<Value>(text).unwrap());
    }

    #[test]
    fn non_object_json_is_still_json() {
        let parsed = parse_agent_response("[1, 2, 3]");
        assert_eq!(parsed.strategy, ParseStrategy::Json);
        assert_eq!(parsed.value, json!([1, 2, 3]));
        assert_eq!(parsed.comment(), "No comment available");
        assert!(parsed.sources().is_empty());
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let parsed = parse_agent_response("```json\n{\"amount\": \"$500\"}\n```");
        assert_eq!(parsed.strategy, ParseStrategy::Json);
        assert_eq!(parsed.amount(), Some(500.0));
    }

    #[test]
    fn yaml_lines_become_a_record() {
        let parsed = parse_agent_response("amount: 2000\ncomment: Test YAML\nsources: http://example.com");
        assert_eq!(parsed.strategy, ParseStrategy::Yaml);
        assert_eq!(parsed.amount(), Some(2000.0));
        assert_eq!(parsed.comment(), "Test YAML");
        assert_eq!(parsed.sources(), vec!["http://example.com"]);
    }

    #[test]
    fn reasoning_stands_in_for_comment() {
        let parsed = parse_agent_response(SELF_TEST_FIXTURES[2]);
        assert_eq!(parsed.amount(), Some(3000.0));
        assert_eq!(
            parsed.comment(),
            "The New Life Foundation has provided essential services"
        );
        assert_eq!(parsed.sources(), vec!["https://newlifefoundation.in/"]);
    }

    #[test]
    fn prose_falls_back_to_raw_comment() {
        let text = "I could not verify this petition against any source";
        let parsed = parse_agent_response(text);
        assert_eq!(parsed.strategy, ParseStrategy::Fallback);
        assert_eq!(parsed.comment(), text);
        assert!(parsed.sources().is_empty());
        assert_eq!(parsed.amount(), None);
        assert_eq!(parsed.value["raw_response"], text);
    }

    #[test]
    fn key_value_scan_handles_invalid_yaml() {
        // A second colon on the line is invalid YAML.
        let text = "amount: 12.5\nnote: see: attached\n  more detail\nverified: TRUE";
        let parsed = parse_agent_response(text);
        assert_eq!(parsed.strategy, ParseStrategy::KeyValue);
        assert_eq!(parsed.value["amount"], json!(12.5));
        assert_eq!(parsed.value["note"], json!("see: attached\nmore detail"));
        assert_eq!(parsed.value["verified"], json!(true));
    }

    #[test]
    fn coercion_order() {
        assert_eq!(coerce_scalar("42"), json!(42));
        assert_eq!(coerce_scalar("4.5"), json!(4.5));
        assert_eq!(coerce_scalar("False"), json!(false));
        assert_eq!(coerce_scalar("1.2.3"), json!("1.2.3"));
        assert_eq!(coerce_scalar(""), json!(""));
    }

    #[test]
    fn regex_extraction_stops_at_next_key() {
        let text = "Amount: 750\nReasoning: roads are\nstill flooded\nSources: a.org; b.org,\nc.org";
        let value = parse_with_regex(text).unwrap();
        assert_eq!(value["amount"], json!(750.0));
        assert_eq!(value["reasoning"], json!("roads are\nstill flooded"));
        assert_eq!(value["sources"], json!(["a.org", "b.org", "c.org"]));
    }

    #[test]
    fn regex_without_fields_is_none() {
        assert!(parse_with_regex("nothing to see").is_none());
    }

    #[test]
    fn sources_string_becomes_list() {
        let parsed = ParsedResponse {
            value: json!({"sources": "http://a"}),
            strategy: ParseStrategy::Json,
        };
        assert_eq!(parsed.sources(), vec!["http://a"]);

        let parsed = ParsedResponse {
            value: json!({"sources": 7}),
            strategy: ParseStrategy::Json,
        };
        assert!(parsed.sources().is_empty());
    }

    #[test]
    fn self_test_fixtures_all_parse() {
        for fixture in SELF_TEST_FIXTURES {
            let parsed = parse_agent_response(fixture);
            assert_ne!(parsed.strategy, ParseStrategy::Fallback, "{fixture}");
            assert!(parsed.amount().is_some());
        }
    }
}
