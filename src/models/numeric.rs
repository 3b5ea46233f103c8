//! Lenient field coercion for loosely-typed shop backend payloads.
//!
//! The shop backend serializes decimals as strings, sometimes omits fields and
//! occasionally sends `null`. Every numeric field is read "parse or zero":
//! anything that is not a finite number becomes `None`, and callers read
//! `None` as zero (or a documented default).

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse the longest leading decimal literal of `raw`.
///
/// `"12.50"` → 12.5, `"  7 units"` → 7.0, `"abc"` → `None`. Non-finite
/// results are rejected.
pub fn parse_leading_f64(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let int_digits = end - int_start;

    let mut frac_digits = 0;
    if end < bytes.len() && bytes[end] == b'.' {
        let mut cursor = end + 1;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        frac_digits = cursor - end - 1;
        if int_digits > 0 || frac_digits > 0 {
            end = cursor;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    // Optional exponent, only consumed when it carries digits.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut cursor = end + 1;
        if cursor < bytes.len() && matches!(bytes[cursor], b'+' | b'-') {
            cursor += 1;
        }
        let exp_start = cursor;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        if cursor > exp_start {
            end = cursor;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce an arbitrary JSON value to a finite number.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_leading_f64(s),
        _ => None,
    }
}

/// Coerce an arbitrary JSON value to an integer identifier.
pub fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerce an arbitrary JSON value to a string label.
pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Serde adapter: any JSON value → `Option<f64>`, never failing.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_f64))
}

/// Serde adapter: any JSON value → `Option<i64>`, never failing.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_i64))
}

/// Serde adapter: any JSON value → `Option<String>`, never failing.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_plain_and_decimal_strings() {
        assert_eq!(parse_leading_f64("42"), Some(42.0));
        assert_eq!(parse_leading_f64("12.50"), Some(12.5));
        assert_eq!(parse_leading_f64("-3.25"), Some(-3.25));
        assert_eq!(parse_leading_f64(".5"), Some(0.5));
    }

    #[test]
    fn parses_leading_number_and_ignores_trailing_text() {
        assert_eq!(parse_leading_f64("  7 units"), Some(7.0));
        assert_eq!(parse_leading_f64("3.5kg"), Some(3.5));
        assert_eq!(parse_leading_f64("1e3x"), Some(1000.0));
        assert_eq!(parse_leading_f64("2e"), Some(2.0));
    }

    #[test]
    fn rejects_non_numeric_strings() {
        assert_eq!(parse_leading_f64(""), None);
        assert_eq!(parse_leading_f64("abc"), None);
        assert_eq!(parse_leading_f64("-"), None);
        assert_eq!(parse_leading_f64("."), None);
        assert_eq!(parse_leading_f64("NaN"), None);
        assert_eq!(parse_leading_f64("Infinity"), None);
    }

    #[test]
    fn rejects_overflowing_literals() {
        assert_eq!(parse_leading_f64("1e400"), None);
    }

    #[test]
    fn coerces_json_values() {
        assert_eq!(coerce_f64(&json!(3)), Some(3.0));
        assert_eq!(coerce_f64(&json!("9.99")), Some(9.99));
        assert_eq!(coerce_f64(&json!(null)), None);
        assert_eq!(coerce_f64(&json!(true)), None);
        assert_eq!(coerce_f64(&json!([1])), None);

        assert_eq!(coerce_i64(&json!(17)), Some(17));
        assert_eq!(coerce_i64(&json!(" 17 ")), Some(17));
        assert_eq!(coerce_i64(&json!(1.5)), None);

        assert_eq!(coerce_string(&json!("Dairy")), Some("Dairy".to_string()));
        assert_eq!(coerce_string(&json!(5)), Some("5".to_string()));
        assert_eq!(coerce_string(&json!({})), None);
    }
}
