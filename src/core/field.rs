//! Field value types and request-value casting

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Null,
}

impl FieldValue {
    /// Get the value as a number if it is numeric
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Compare two values of compatible types.
    ///
    /// Integers and floats compare numerically. Values of unrelated types
    /// are not comparable and yield `None`.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return Some(a.total_cmp(&b));
        }
        match (self, other) {
            (FieldValue::String(a), FieldValue::String(b)) => Some(a.cmp(b)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Some(a.cmp(b)),
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => Some(a.cmp(b)),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => Some(a.cmp(b)),
            (FieldValue::Null, FieldValue::Null) => Some(Ordering::Equal),
            _ => None,
        }
    }

    /// Total ordering used for sorting: comparable values by [`compare`](Self::compare),
    /// otherwise by type rank.
    pub fn sort_cmp(&self, other: &FieldValue) -> Ordering {
        self.compare(other)
            .unwrap_or_else(|| self.type_rank().cmp(&other.type_rank()))
    }

    fn type_rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Integer(_) | FieldValue::Float(_) => 1,
            FieldValue::String(_) => 2,
            FieldValue::Uuid(_) => 3,
            FieldValue::Boolean(_) => 4,
            FieldValue::DateTime(_) => 5,
        }
    }
}

/// The declared type of a document field, used to cast raw request values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Id,
    Text,
    Number,
    Boolean,
    Timestamp,
}

impl FieldKind {
    /// Cast a raw query string value to this kind
    pub fn cast(self, raw: &str) -> Result<FieldValue, String> {
        match self {
            FieldKind::Text => Ok(FieldValue::String(raw.to_string())),
            FieldKind::Number => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(FieldValue::Float)
                .ok_or_else(|| format!("Cast to Number failed for value \"{raw}\"")),
            FieldKind::Boolean => match raw.trim() {
                "true" | "1" => Ok(FieldValue::Boolean(true)),
                "false" | "0" => Ok(FieldValue::Boolean(false)),
                _ => Err(format!("Cast to Boolean failed for value \"{raw}\"")),
            },
            FieldKind::Timestamp => parse_timestamp(raw.trim())
                .map(FieldValue::DateTime)
                .ok_or_else(|| format!("Cast to Date failed for value \"{raw}\"")),
            FieldKind::Id => Uuid::parse_str(raw.trim())
                .map(FieldValue::Uuid)
                .map_err(|_| format!("Cast to Id failed for value \"{raw}\"")),
        }
    }
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
