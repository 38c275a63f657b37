//! Column values reported by data providers
//!
//! A column value is either null, a single scalar, or a homogeneous list of
//! scalars. Scalars are strings, numbers or UTC timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Column values of one row, keyed by item name
pub type ColumnValues = BTreeMap<String, ColumnValue>;

/// Runtime type of a scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Number,
    DateTime,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Number => "number",
            ScalarKind::DateTime => "datetime",
        }
    }

    /// Fixed rank used only when incompatible kinds meet with the type guard disabled
    pub(crate) fn rank(&self) -> u8 {
        match self {
            ScalarKind::Number => 0,
            ScalarKind::DateTime => 1,
            ScalarKind::String => 2,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Single scalar value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    String(String),
    Number(f64),
    DateTime(DateTime<Utc>),
}

impl ScalarValue {
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::String(_) => ScalarKind::String,
            ScalarValue::Number(_) => ScalarKind::Number,
            ScalarValue::DateTime(_) => ScalarKind::DateTime,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScalarValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            ScalarValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Empty strings count as null for sorting and categorization
    pub fn is_empty_string(&self) -> bool {
        matches!(self, ScalarValue::String(s) if s.is_empty())
    }

    /// Compare two scalars of the same kind
    ///
    /// Returns `None` when the kinds differ; callers decide whether that is an
    /// error or falls back to kind rank.
    pub fn compare(&self, other: &ScalarValue) -> Option<Ordering> {
        match (self, other) {
            (ScalarValue::String(a), ScalarValue::String(b)) => Some(compare_text(a, b)),
            (ScalarValue::Number(a), ScalarValue::Number(b)) => Some(a.total_cmp(b)),
            (ScalarValue::DateTime(a), ScalarValue::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Case-insensitive text order with a case-sensitive tie-break
fn compare_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| a.cmp(b))
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::String(s) => write!(f, "'{}'", s),
            ScalarValue::Number(n) => write!(f, "{}", n),
            ScalarValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::String(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::String(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Number(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Number(value as f64)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Number(f64::from(value))
    }
}

impl From<DateTime<Utc>> for ScalarValue {
    fn from(value: DateTime<Utc>) -> Self {
        ScalarValue::DateTime(value)
    }
}

/// Value of one column in one row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ColumnValue {
    #[default]
    Null,
    Scalar(ScalarValue),
    List(Vec<ScalarValue>),
}

impl ColumnValue {
    /// Build a multi-value column
    pub fn list<T: Into<ScalarValue>>(values: impl IntoIterator<Item = T>) -> Self {
        ColumnValue::List(values.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    /// All scalars of this value (empty for null)
    pub fn values(&self) -> &[ScalarValue] {
        match self {
            ColumnValue::Null => &[],
            ColumnValue::Scalar(v) => std::slice::from_ref(v),
            ColumnValue::List(values) => values,
        }
    }

    /// Value used for document sorting: first scalar, empty string as null
    pub fn sort_value(&self) -> Option<&ScalarValue> {
        self.values().first().filter(|v| !v.is_empty_string())
    }
}

impl From<ScalarValue> for ColumnValue {
    fn from(value: ScalarValue) -> Self {
        ColumnValue::Scalar(value)
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        ColumnValue::Scalar(value.into())
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        ColumnValue::Scalar(value.into())
    }
}

impl From<f64> for ColumnValue {
    fn from(value: f64) -> Self {
        ColumnValue::Scalar(value.into())
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        ColumnValue::Scalar(value.into())
    }
}

impl From<i32> for ColumnValue {
    fn from(value: i32) -> Self {
        ColumnValue::Scalar(value.into())
    }
}

impl From<DateTime<Utc>> for ColumnValue {
    fn from(value: DateTime<Utc>) -> Self {
        ColumnValue::Scalar(value.into())
    }
}

impl From<Vec<ScalarValue>> for ColumnValue {
    fn from(values: Vec<ScalarValue>) -> Self {
        ColumnValue::List(values)
    }
}

impl<T: Into<ColumnValue>> From<Option<T>> for ColumnValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ColumnValue::Null)
    }
}
