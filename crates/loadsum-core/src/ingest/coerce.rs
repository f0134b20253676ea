//! Lenient conversions from loosely-typed document values.
//!
//! Result documents written by different tool versions disagree on whether
//! numbers are numbers, strings or missing. Every numeric read of such a
//! document goes through these helpers so a single odd field degrades to `0`
//! instead of failing the whole summary.

use serde_json::Value;

/// Interpret a value as `f64`, defaulting to `0.0`.
///
/// Accepts JSON numbers, numeric strings (surrounding whitespace ignored) and
/// booleans. Non-finite results also collapse to `0.0`.
pub fn to_f64(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Interpret a value as a non-negative count, truncating fractions.
pub fn to_count(value: Option<&Value>) -> u64 {
    let v = to_f64(value);
    if v <= 0.0 {
        0
    } else {
        v.trunc() as u64
    }
}

/// Text forms treated as a successful sample.
const TRUE_TOKENS: [&str; 5] = ["true", "1", "y", "yes", "t"];

/// Interpret free text as a boolean; anything unrecognized is `false`.
pub fn to_bool(text: &str) -> bool {
    let lowered = text.trim().to_ascii_lowercase();
    TRUE_TOKENS.contains(&lowered.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_pass_through() {
        assert_eq!(to_f64(Some(&json!(12.5))), 12.5);
        assert_eq!(to_f64(Some(&json!(7))), 7.0);
    }

    #[test]
    fn numeric_strings_are_parsed() {
        assert_eq!(to_f64(Some(&json!(" 42.25 "))), 42.25);
    }

    #[test]
    fn garbage_defaults_to_zero() {
        assert_eq!(to_f64(None), 0.0);
        assert_eq!(to_f64(Some(&json!(null))), 0.0);
        assert_eq!(to_f64(Some(&json!("n/a"))), 0.0);
        assert_eq!(to_f64(Some(&json!({"nested": 1}))), 0.0);
        assert_eq!(to_f64(Some(&json!("NaN"))), 0.0);
    }

    #[test]
    fn booleans_become_zero_or_one() {
        assert_eq!(to_f64(Some(&json!(true))), 1.0);
        assert_eq!(to_f64(Some(&json!(false))), 0.0);
    }

    #[test]
    fn counts_truncate_and_floor_at_zero() {
        assert_eq!(to_count(Some(&json!(9.9))), 9);
        assert_eq!(to_count(Some(&json!("12"))), 12);
        assert_eq!(to_count(Some(&json!(-3))), 0);
        assert_eq!(to_count(None), 0);
    }

    #[test]
    fn true_tokens_are_case_insensitive() {
        for token in ["true", "TRUE", " True ", "1", "y", "Yes", "t"] {
            assert!(to_bool(token), "{token:?} should be true");
        }
    }

    #[test]
    fn everything_else_is_false() {
        for token in ["false", "0", "no", "", "truthy", "None"] {
            assert!(!to_bool(token), "{token:?} should be false");
        }
    }
}
