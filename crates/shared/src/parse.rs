//! Numeric coercion for values typed into table cells or received as loosely
//! typed JSON.
//!
//! Coercion follows the rules a browser scripting host applies when turning an
//! arbitrary value into a number: `null` and the empty string become `0`,
//! surrounding whitespace is ignored, and anything that is not a numeric
//! literal fails. Failures are reported as [`ParseError`] and are expected to
//! be recovered by the caller, usually by keeping the previous field value.

use serde_json::Value;
use thiserror::Error;

/// Largest integer magnitude that survives a round trip through an `f64`.
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("value is not a number")]
    NotNumber,
    #[error("value is not a safe integer")]
    NotInteger,
}

pub fn parse_number(raw: &Value) -> Result<f64, ParseError> {
    coerce_number(raw).ok_or(ParseError::NotNumber)
}

pub fn parse_int(raw: &Value) -> Result<i64, ParseError> {
    let parsed = parse_number(raw)?;
    if parsed.is_finite() && parsed.fract() == 0.0 && parsed.abs() <= MAX_SAFE_INTEGER {
        Ok(parsed as i64)
    } else {
        Err(ParseError::NotInteger)
    }
}

/// Coerces every element of an array, discarding the whole result if any
/// element fails. Non-arrays yield `None`.
pub fn vector_string_to_number(raw: &Value) -> Option<Vec<f64>> {
    raw.as_array()?.iter().map(coerce_number).collect()
}

/// Parsed value of `raw`, or `previous` when the key is missing or unparsable.
pub fn number_or(raw: Option<&Value>, previous: f64) -> f64 {
    raw.map_or(previous, |value| parse_number(value).unwrap_or(previous))
}

/// Three-element vector from `raw`, or `previous` when coercion fails or the
/// arity is wrong. Never merges element-wise.
pub fn vector_or(raw: Option<&Value>, previous: [f64; 3]) -> [f64; 3] {
    raw.and_then(vector_string_to_number)
        .and_then(|values| <[f64; 3]>::try_from(values).ok())
        .unwrap_or(previous)
}

/// Textual form of a truthy value. `null`, `false`, `0` and `""` are falsy.
pub fn truthy_text(raw: &Value) -> Option<String> {
    match raw {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) if number.as_f64() == Some(0.0) => None,
        Value::Number(number) => Some(number.to_string()),
        Value::Array(_) | Value::Object(_) => Some(raw.to_string()),
    }
}

pub fn truthy_text_or(raw: Option<&Value>, previous: &str) -> String {
    raw.and_then(truthy_text)
        .unwrap_or_else(|| previous.to_string())
}

/// Generic numeric coercion. `None` stands for "not a number".
pub fn coerce_number(raw: &Value) -> Option<f64> {
    match raw {
        Value::Null => Some(0.0),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Number(number) => number.as_f64(),
        Value::String(text) => coerce_str(text),
        // Arrays coerce through their joined text form.
        Value::Array(items) => match items.as_slice() {
            [] => Some(0.0),
            [Value::Null] => Some(0.0),
            [Value::Bool(_) | Value::Object(_)] => None,
            [single] => coerce_number(single),
            _ => None,
        },
        Value::Object(_) => None,
    }
}

fn coerce_str(text: &str) -> Option<f64> {
    let trimmed = text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    if trimmed.is_empty() {
        return Some(0.0);
    }

    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return parse_radix_digits(&trimmed[2..], radix);
    }

    if is_decimal_literal(trimmed) {
        trimmed.parse::<f64>().ok()
    } else {
        None
    }
}

fn parse_radix_digits(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix)
            .map(|digit| acc * f64::from(radix) + f64::from(digit))
    })
}

/// `[+-] digits [. digits] [(e|E) [+-] digits]` with at least one mantissa
/// digit. Rejects the `inf`/`nan` spellings `str::parse` would accept.
fn is_decimal_literal(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut pos = 0;
    let skip_digits = |mut pos: usize| {
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        pos
    };

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        pos += 1;
    }

    let int_end = skip_digits(pos);
    let mut mantissa_digits = int_end - pos;
    pos = int_end;

    if bytes.get(pos) == Some(&b'.') {
        let frac_end = skip_digits(pos + 1);
        mantissa_digits += frac_end - (pos + 1);
        pos = frac_end;
    }

    if mantissa_digits == 0 {
        return false;
    }

    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let exp_end = skip_digits(pos);
        if exp_end == pos {
            return false;
        }
        pos = exp_end;
    }

    pos == bytes.len()
}

#[cfg(test)]
#[path = "tests/parse_tests.rs"]
mod tests;
