//! Immutable tabular input.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::error::{DataError, DataResult};
use crate::value::{ColumnKind, Value};

/// Normalized rows × typed columns.
///
/// Invariants (checked at construction):
/// - column names are unique;
/// - every row carries exactly one value per column;
/// - the kind of each column is derived once and never changes.
///
/// Row order is preserved; growth computations without a temporal column
/// rely on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    kinds: Vec<ColumnKind>,
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum DistinctKey<'a> {
    Number(u64),
    Text(&'a str),
    Timestamp(i64, u32),
}

impl Dataset {
    /// Build a dataset from column names and row-major values.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> DataResult<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(DataError::DuplicateColumn(name.clone()));
            }
        }

        for (row, values) in rows.iter().enumerate() {
            if values.len() != columns.len() {
                return Err(DataError::RaggedRow {
                    row,
                    expected: columns.len(),
                    found: values.len(),
                });
            }
        }

        let kinds = (0..columns.len())
            .map(|col| ColumnKind::infer(rows.iter().map(|r| &r[col])))
            .collect();

        Ok(Self {
            columns,
            kinds,
            rows,
        })
    }

    /// Build a dataset from named columns (column-major).
    pub fn from_columns(columns: Vec<(String, Vec<Value>)>) -> DataResult<Self> {
        let height = columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0);

        if let Some(short) = columns.iter().map(|(_, v)| v.len()).min() {
            if short != height {
                return Err(DataError::RaggedRow {
                    row: short,
                    expected: columns.len(),
                    found: columns.iter().filter(|(_, v)| v.len() > short).count(),
                });
            }
        }

        let mut names = Vec::with_capacity(columns.len());
        let mut rows: Vec<Vec<Value>> = (0..height)
            .map(|_| Vec::with_capacity(columns.len()))
            .collect();

        for (name, values) in columns {
            names.push(name);
            for (row, value) in rows.iter_mut().zip(values) {
                row.push(value);
            }
        }

        Self::new(names, rows)
    }

    /// Reject datasets no analysis can run on.
    pub fn ensure_analyzable(&self) -> DataResult<()> {
        if self.columns.is_empty() {
            return Err(DataError::NoColumns);
        }
        if self.rows.is_empty() {
            return Err(DataError::NoRows);
        }
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_name(&self, col: usize) -> &str {
        &self.columns[col]
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column_kind(&self, col: usize) -> ColumnKind {
        self.kinds[col]
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn value(&self, row: usize, col: usize) -> &Value {
        &self.rows[row][col]
    }

    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |r| &r[col])
    }

    /// Indices of numeric columns, in column order.
    pub fn numeric_column_indices(&self) -> Vec<usize> {
        self.indices_of(ColumnKind::Numeric)
    }

    /// First temporal column, if any.
    pub fn temporal_column_index(&self) -> Option<usize> {
        self.indices_of(ColumnKind::Temporal).into_iter().next()
    }

    fn indices_of(&self, kind: ColumnKind) -> Vec<usize> {
        self.kinds
            .iter()
            .enumerate()
            .filter(|(_, k)| **k == kind)
            .map(|(i, _)| i)
            .collect()
    }

    /// Numeric view of a column aligned with rows (`None` = missing).
    pub fn numeric_series(&self, col: usize) -> Vec<Option<f64>> {
        self.column_values(col).map(Value::as_f64).collect()
    }

    /// Non-missing numeric values of a column, in row order.
    pub fn numeric_values(&self, col: usize) -> Vec<f64> {
        self.column_values(col).filter_map(Value::as_f64).collect()
    }

    /// Timestamp view of a column aligned with rows.
    pub fn timestamps(&self, col: usize) -> Vec<Option<DateTime<Utc>>> {
        self.column_values(col).map(Value::as_timestamp).collect()
    }

    pub fn missing_count(&self, col: usize) -> usize {
        self.column_values(col).filter(|v| v.is_missing()).count()
    }

    /// Missing cells across the whole dataset.
    pub fn total_missing(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| r.iter())
            .filter(|v| v.is_missing())
            .count()
    }

    /// Number of distinct non-missing values in a column.
    ///
    /// Numeric columns compare by value, so `1.0`, `"1"` and `"1.0"` are
    /// one value.
    pub fn distinct_count(&self, col: usize) -> usize {
        let numeric = self.kinds[col] == ColumnKind::Numeric;
        self.column_values(col)
            .filter(|v| !v.is_missing())
            .filter_map(|v| match v {
                _ if numeric => v
                    .as_f64()
                    .map(|n| DistinctKey::Number(normalize_zero(n).to_bits())),
                Value::Number(n) => Some(DistinctKey::Number(normalize_zero(*n).to_bits())),
                Value::Text(s) => Some(DistinctKey::Text(s.as_str())),
                Value::Timestamp(t) => {
                    Some(DistinctKey::Timestamp(t.timestamp(), t.timestamp_subsec_nanos()))
                }
                Value::Missing => None,
            })
            .collect::<HashSet<_>>()
            .len()
    }
}

fn normalize_zero(n: f64) -> f64 {
    if n == 0.0 { 0.0 } else { n }
}
