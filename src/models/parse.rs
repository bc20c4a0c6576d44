//! Garbage-tolerant numeric coercion.
//!
//! Upstreams disagree wildly about number formatting: CoinCap sends every
//! numeric as a decimal string, Binance mixes numbers and strings inside
//! positional arrays, and display-oriented feeds format currency as
//! `"$12,345.67"`. The normalization contract is lenient: anything that
//! fails to parse becomes `0`, never an error.

use serde_json::Value;

/// Parse a float out of a string, tolerating currency formatting.
///
/// Strips dollar signs, thousands separators, percent signs, and
/// surrounding whitespace before parsing. Returns `0.0` when nothing
/// numeric remains.
pub fn lenient_f64(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%' | ' '))
        .collect();
    cleaned.parse::<f64>().unwrap_or(0.0)
}

/// Parse a provider-assigned rank out of a string.
///
/// Ranks are positive by contract, so `0`, negatives, and garbage all
/// map to `None` (rank absent) rather than `0`.
pub fn lenient_rank(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|rank| *rank > 0)
}

/// Pull a float out of a JSON value that may be a number, a numeric
/// string, or missing entirely.
pub fn json_f64(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => lenient_f64(s),
        _ => 0.0,
    }
}

/// Pull an integer out of a JSON value that may be a number, a numeric
/// string, or missing entirely.
pub fn json_i64(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}
