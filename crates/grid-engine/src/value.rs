//! Cell values and the loose-JSON record boundary.
//!
//! Records arrive from the REST backend as untyped JSON objects. All typing
//! happens here, once, when a record crosses the column boundary: each field
//! is converted to a [`CellValue`] according to the column's declared
//! [`DataType`]. Malformed or missing fields become [`CellValue::Null`]
//! rather than errors, so an irregular record can never poison the grid.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as JsonValue;

use crate::error::ValueParseError;

/// Declared type of a column's values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    String,
    Number,
    Boolean,
    Date,
}

impl DataType {
    pub fn label(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
        }
    }
}

/// A single typed cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    /// Missing, null, or unparseable for the column's type.
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(DateTime<Utc>),
}

/// Shared null for lookups of absent fields.
pub(crate) const NULL: CellValue = CellValue::Null;

impl CellValue {
    /// Convert a raw JSON field into a typed cell.
    ///
    /// Conversion is deliberately forgiving: numbers and booleans arriving
    /// as strings are accepted, anything that still does not fit becomes
    /// `Null`.
    pub fn from_json(value: &JsonValue, data_type: DataType) -> CellValue {
        match data_type {
            DataType::String => match value {
                JsonValue::Null => CellValue::Null,
                JsonValue::String(s) => CellValue::Text(s.clone()),
                JsonValue::Number(n) => CellValue::Text(n.to_string()),
                JsonValue::Bool(b) => CellValue::Text(b.to_string()),
                other => CellValue::Text(other.to_string()),
            },
            DataType::Number => match value {
                JsonValue::Number(n) => match n.as_f64() {
                    Some(f) if !f.is_nan() => CellValue::Number(f),
                    _ => CellValue::Null,
                },
                JsonValue::String(s) => match s.trim().parse::<f64>() {
                    Ok(f) if !f.is_nan() => CellValue::Number(f),
                    _ => CellValue::Null,
                },
                _ => CellValue::Null,
            },
            DataType::Boolean => match value {
                JsonValue::Bool(b) => CellValue::Bool(*b),
                JsonValue::String(s) => match s.trim().to_lowercase().as_str() {
                    "true" => CellValue::Bool(true),
                    "false" => CellValue::Bool(false),
                    _ => CellValue::Null,
                },
                _ => CellValue::Null,
            },
            DataType::Date => match value {
                JsonValue::String(s) => parse_date(s).map(CellValue::Date).unwrap_or(CellValue::Null),
                _ => CellValue::Null,
            },
        }
    }

    /// Parse user input (an edit draft) into a typed cell.
    ///
    /// Unlike [`CellValue::from_json`] this is strict: a draft that does not
    /// parse for the column's type is an error for the editor to surface,
    /// not a silent null.
    pub fn parse(input: &str, data_type: DataType) -> Result<CellValue, ValueParseError> {
        let trimmed = input.trim();
        match data_type {
            DataType::String => Ok(CellValue::Text(input.to_string())),
            DataType::Number => {
                if trimmed.is_empty() {
                    return Ok(CellValue::Null);
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| !f.is_nan())
                    .map(CellValue::Number)
                    .ok_or_else(|| ValueParseError {
                        input: input.to_string(),
                        expected: "number",
                    })
            }
            DataType::Boolean => {
                if trimmed.is_empty() {
                    return Ok(CellValue::Null);
                }
                match trimmed.to_lowercase().as_str() {
                    "true" => Ok(CellValue::Bool(true)),
                    "false" => Ok(CellValue::Bool(false)),
                    _ => Err(ValueParseError {
                        input: input.to_string(),
                        expected: "boolean (true/false)",
                    }),
                }
            }
            DataType::Date => {
                if trimmed.is_empty() {
                    return Ok(CellValue::Null);
                }
                parse_date(trimmed).map(CellValue::Date).ok_or_else(|| ValueParseError {
                    input: input.to_string(),
                    expected: "date (RFC 3339 or YYYY-MM-DD)",
                })
            }
        }
    }

    /// Serialize back into a JSON field for the REST backend.
    pub fn to_json(&self) -> JsonValue {
        match self {
            CellValue::Null => JsonValue::Null,
            CellValue::Text(s) => JsonValue::String(s.clone()),
            CellValue::Number(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            CellValue::Bool(b) => JsonValue::Bool(*b),
            CellValue::Date(d) => JsonValue::String(d.to_rfc3339()),
        }
    }

    /// The string form used by display, filtering, and search.
    ///
    /// `Null` renders as the empty string; null indicators are a rendering
    /// concern of the host.
    pub fn display(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(f) => f.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view. NaN is treated as absent so it can sort last.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Type-aware ordering used by the sort engine.
    ///
    /// Numbers compare numerically and dates temporally, with absent values
    /// ordered last (under ascending direction). Everything else compares as
    /// case-sensitive strings.
    pub fn compare(&self, other: &CellValue, data_type: DataType) -> Ordering {
        match data_type {
            DataType::Number => rank_optional(self.as_number(), other.as_number()),
            DataType::Date => rank_optional(self.as_date(), other.as_date()),
            _ => self.display().cmp(&other.display()),
        }
    }
}

fn rank_optional<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Parse a date string as RFC 3339, falling back to a bare `YYYY-MM-DD`
/// (interpreted as midnight UTC).
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_coerces_loose_types() {
        assert_eq!(
            CellValue::from_json(&json!("42.5"), DataType::Number),
            CellValue::Number(42.5)
        );
        assert_eq!(
            CellValue::from_json(&json!(7), DataType::String),
            CellValue::Text("7".to_string())
        );
        assert_eq!(
            CellValue::from_json(&json!("TRUE"), DataType::Boolean),
            CellValue::Bool(true)
        );
    }

    #[test]
    fn test_from_json_malformed_becomes_null() {
        assert_eq!(CellValue::from_json(&json!("n/a"), DataType::Number), CellValue::Null);
        assert_eq!(CellValue::from_json(&json!("maybe"), DataType::Boolean), CellValue::Null);
        assert_eq!(CellValue::from_json(&json!("not a date"), DataType::Date), CellValue::Null);
        assert_eq!(CellValue::from_json(&JsonValue::Null, DataType::String), CellValue::Null);
    }

    #[test]
    fn test_parse_rejects_bad_drafts() {
        assert!(CellValue::parse("12x", DataType::Number).is_err());
        assert!(CellValue::parse("yes", DataType::Boolean).is_err());
        assert!(CellValue::parse("tomorrow", DataType::Date).is_err());
    }

    #[test]
    fn test_parse_empty_draft_is_null() {
        assert_eq!(CellValue::parse("", DataType::Number).unwrap(), CellValue::Null);
        assert_eq!(CellValue::parse("  ", DataType::Date).unwrap(), CellValue::Null);
        // A string column keeps the empty string itself.
        assert_eq!(
            CellValue::parse("", DataType::String).unwrap(),
            CellValue::Text(String::new())
        );
    }

    #[test]
    fn test_date_parsing_formats() {
        assert!(parse_date("2024-03-01T10:30:00Z").is_some());
        assert!(parse_date("2024-03-01T10:30:00+02:00").is_some());
        assert!(parse_date("2024-03-01").is_some());
        assert!(parse_date("03/01/2024").is_none());
    }

    #[test]
    fn test_compare_numbers_nulls_last() {
        let a = CellValue::Number(1.0);
        let null = CellValue::Null;
        assert_eq!(a.compare(&null, DataType::Number), Ordering::Less);
        assert_eq!(null.compare(&a, DataType::Number), Ordering::Greater);
        assert_eq!(null.compare(&CellValue::Null, DataType::Number), Ordering::Equal);
    }

    #[test]
    fn test_compare_strings_case_sensitive() {
        let a = CellValue::Text("Alpha".to_string());
        let b = CellValue::Text("alpha".to_string());
        assert_ne!(a.compare(&b, DataType::String), Ordering::Equal);
    }

    #[test]
    fn test_number_display_trims_integral() {
        assert_eq!(CellValue::Number(15.0).display(), "15");
        assert_eq!(CellValue::Number(15.25).display(), "15.25");
    }
}
