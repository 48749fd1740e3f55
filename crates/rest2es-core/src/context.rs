use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Observed range of a single watched field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRange {
    pub min: Value,
    pub max: Value,
}

impl FieldRange {
    /// A range covering a single value.
    pub fn point(value: Value) -> Self {
        Self {
            min: value.clone(),
            max: value,
        }
    }

    /// Widen the range to include `value`.
    ///
    /// Returns `false` when `value` cannot be ordered against the stored bounds
    /// (for example a number arriving for a field first seen as a string).
    pub fn widen(&mut self, value: &Value) -> bool {
        let (Some(vs_min), Some(vs_max)) = (
            compare_values(value, &self.min),
            compare_values(value, &self.max),
        ) else {
            return false;
        };

        if vs_min == Ordering::Less {
            self.min = value.clone();
        }
        if vs_max == Ordering::Greater {
            self.max = value.clone();
        }
        true
    }
}

/// Checkpoint context: watched field path -> observed `{min, max}`.
///
/// Serializes as a plain JSON object, e.g.
/// `{"time": {"min": "2013-01-01T00:00:00Z", "max": "2013-01-01T05:00:00Z"}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    fields: BTreeMap<String, FieldRange>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&FieldRange> {
        self.fields.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, range: FieldRange) {
        self.fields.insert(field.into(), range);
    }

    pub(crate) fn get_mut(&mut self, field: &str) -> Option<&mut FieldRange> {
        self.fields.get_mut(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldRange)> {
        self.fields.iter()
    }

    /// Convenience accessor for the `min` bound of a string-valued field.
    pub fn min_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(|r| r.min.as_str())
    }

    /// Convenience accessor for the `max` bound of a string-valued field.
    pub fn max_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(|r| r.max.as_str())
    }
}

impl FromIterator<(String, FieldRange)> for Context {
    fn from_iter<I: IntoIterator<Item = (String, FieldRange)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Order two watermark values using their natural ordering.
///
/// Numbers compare numerically and booleans `false < true`. Strings that parse
/// as timestamps (RFC 3339, or `YYYY-MM-DDTHH:MM:SS` read as UTC) compare by
/// instant and sort before all other strings; the rest compare
/// lexicographically. Equal instants fall back to the raw text so the order
/// stays total. Values of different kinds (and null, arrays, objects) are
/// unordered.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                Some(x.cmp(&y))
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                Some(x.cmp(&y))
            } else {
                // 1 and 1.0 are the same number; integers sort first to keep the order total.
                let ord = x.as_f64()?.partial_cmp(&y.as_f64()?)?;
                Some(ord.then_with(|| x.is_f64().cmp(&y.is_f64())))
            }
        }
        (Value::String(x), Value::String(y)) => Some(compare_strings(x, y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn compare_strings(x: &str, y: &str) -> Ordering {
    match (parse_timestamp(x), parse_timestamp(y)) {
        (Some(tx), Some(ty)) => tx.cmp(&ty).then_with(|| x.cmp(y)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => x.cmp(y),
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|t| t.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compare_numbers() {
        assert_eq!(compare_values(&json!(1), &json!(2)), Some(Ordering::Less));
        assert_eq!(compare_values(&json!(2.5), &json!(2)), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!(-3), &json!(-3)), Some(Ordering::Equal));
    }

    #[test]
    fn test_compare_timestamps_by_instant() {
        // Lexicographically "+02:00" would sort after "Z", but it is the earlier instant.
        let a = json!("2013-01-01T05:00:00+02:00");
        let b = json!("2013-01-01T04:00:00Z");
        assert_eq!(compare_values(&a, &b), Some(Ordering::Less));
    }

    #[test]
    fn test_compare_timestamps_without_offset_as_utc() {
        let naive = json!("2013-01-01T04:30:00");
        assert_eq!(
            compare_values(&naive, &json!("2013-01-01T04:00:00Z")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare_values(&naive, &json!("2013-01-01T05:00:00+02:00")),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_compare_is_total_across_string_kinds() {
        // Timestamps sort before free text; the same instant in two spellings is still ordered.
        assert_eq!(
            compare_values(&json!("2099-01-01T00:00:00Z"), &json!("abc")),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare_values(&json!("abc"), &json!("2013-01-01T00:00:00Z")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare_values(&json!("2013-01-01T02:00:00+02:00"), &json!("2013-01-01T00:00:00Z")),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_compare_plain_strings() {
        assert_eq!(compare_values(&json!("abc"), &json!("abd")), Some(Ordering::Less));
    }

    #[test]
    fn test_compare_mismatched_types() {
        assert_eq!(compare_values(&json!("1"), &json!(1)), None);
        assert_eq!(compare_values(&json!(null), &json!(null)), None);
    }

    #[test]
    fn test_widen_rejects_mismatched_type() {
        let mut range = FieldRange::point(json!("b"));
        assert!(!range.widen(&json!(5)));
        assert_eq!(range, FieldRange::point(json!("b")));

        assert!(range.widen(&json!("a")));
        assert!(range.widen(&json!("c")));
        assert_eq!(range.min, json!("a"));
        assert_eq!(range.max, json!("c"));
    }

    #[test]
    fn test_context_serializes_as_plain_object() {
        let mut ctx = Context::new();
        ctx.insert(
            "time",
            FieldRange {
                min: json!("2013-01-01T00:00:00Z"),
                max: json!("2013-01-01T05:00:00Z"),
            },
        );

        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(
            value,
            json!({"time": {"min": "2013-01-01T00:00:00Z", "max": "2013-01-01T05:00:00Z"}})
        );
        assert_eq!(ctx.min_str("time"), Some("2013-01-01T00:00:00Z"));
        assert_eq!(ctx.max_str("time"), Some("2013-01-01T05:00:00Z"));
    }
}
