//! Lenient coercion for loosely typed catalog fields.
//!
//! Form input and remote rows do not agree on types: ratings arrive as
//! `7.5`, `"7.5"` or `null`, list fields are sometimes missing entirely.
//! These helpers turn whatever arrived into the typed value the catalog
//! expects, and are usable both directly and through `deserialize_with`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce a number or numeric string to a finite `f64`; anything else is `0.0`.
pub fn score_from_value(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Coerce a number or numeric string to an integer, truncating fractions.
pub fn integer_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<i64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

/// Materialize a list of strings. Non-arrays become an empty list and
/// non-string entries (other than numbers) are skipped.
pub fn strings_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

pub fn score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(score_from_value).unwrap_or(0.0))
}

pub fn optional_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(score_from_value))
}

pub fn optional_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(integer_from_value)
        .and_then(|y| i32::try_from(y).ok()))
}

pub fn optional_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(integer_from_value)
        .and_then(|n| u32::try_from(n).ok()))
}

pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(strings_from_value).unwrap_or_default())
}

pub fn optional_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(strings_from_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_score_from_value() {
        assert_eq!(score_from_value(&json!(7.5)), 7.5);
        assert_eq!(score_from_value(&json!("8.2")), 8.2);
        assert_eq!(score_from_value(&json!(" 9 ")), 9.0);
        assert_eq!(score_from_value(&json!("great")), 0.0);
        assert_eq!(score_from_value(&json!(null)), 0.0);
        assert_eq!(score_from_value(&json!(["7"])), 0.0);
        assert_eq!(score_from_value(&json!("NaN")), 0.0);
    }

    #[test]
    fn test_integer_from_value() {
        assert_eq!(integer_from_value(&json!(2020)), Some(2020));
        assert_eq!(integer_from_value(&json!("1999")), Some(1999));
        assert_eq!(integer_from_value(&json!(3.9)), Some(3));
        assert_eq!(integer_from_value(&json!("soon")), None);
        assert_eq!(integer_from_value(&json!(false)), None);
    }

    #[test]
    fn test_strings_from_value() {
        assert_eq!(
            strings_from_value(&json!(["Drama", "Crime"])),
            vec!["Drama".to_string(), "Crime".to_string()]
        );
        assert!(strings_from_value(&json!("Drama")).is_empty());
        assert!(strings_from_value(&json!(null)).is_empty());
        assert_eq!(strings_from_value(&json!(["A", null, 2])), vec!["A".to_string(), "2".to_string()]);
    }
}
