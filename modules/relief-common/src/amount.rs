use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static NUMBER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").expect("valid number regex"));

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid digit regex"));

/// Normalize an agent-reported amount to a number.
///
/// Numbers pass through. Strings lose `$`, `,` and `USD` and the first
/// numeric token is parsed. Anything else yields `None`.
pub fn normalize_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned = s.replace(['$', ','], "").replace("USD", "");
            NUMBER_TOKEN
                .find(&cleaned)
                .and_then(|m| m.as_str().parse::<f64>().ok())
        }
        _ => None,
    }
}

/// First run of ASCII digits in `text`, if any.
///
/// Signs and decimal points are ignored: `-5` yields 5 and `12.9` yields 12.
/// A run too long for `u64` saturates.
pub fn first_digit_run(text: &str) -> Option<u64> {
    DIGIT_RUN
        .find(text)
        .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))
}
