//! Cell values and column kinds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single cell of a [`crate::Dataset`].
///
/// Ingestion collaborators normalize raw input into one of these variants;
/// nothing downstream ever sees raw bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Number(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Missing,
}

impl Value {
    /// True for `Missing`, non-finite numbers and blank text.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Number(n) => !n.is_finite(),
            Value::Text(s) => s.trim().is_empty(),
            Value::Timestamp(_) => false,
        }
    }

    /// Numeric view of the cell.
    ///
    /// Text that parses as a finite float counts as numeric, so a column
    /// delivered as strings ("1200.50") is still analyzed as numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Missing)
    }
}

/// Semantic type of a column, derived once for the whole dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Every non-missing entry converts to a number.
    Numeric,
    /// Free text or mixed content.
    Categorical,
    /// Every non-missing entry is a timestamp.
    Temporal,
    /// No non-missing entries at all.
    Empty,
}

impl ColumnKind {
    /// Infer the kind of a column from its cells.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut seen = false;
        let mut numeric = true;
        let mut temporal = true;

        for value in values {
            if value.is_missing() {
                continue;
            }
            seen = true;
            numeric &= value.as_f64().is_some();
            temporal &= matches!(value, Value::Timestamp(_));
            if !numeric && !temporal {
                return ColumnKind::Categorical;
            }
        }

        match (seen, numeric, temporal) {
            (false, _, _) => ColumnKind::Empty,
            (true, true, _) => ColumnKind::Numeric,
            (true, false, true) => ColumnKind::Temporal,
            _ => ColumnKind::Categorical,
        }
    }
}
