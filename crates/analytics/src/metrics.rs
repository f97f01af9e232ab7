//! Descriptive and financial metrics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use bizscope_core::{DataError, Dataset, ValueObject};

use crate::analyzer::DatasetAnalyzer;
use crate::error::{AnalysisError, ColumnComputationError};
use crate::keywords::{KeywordTable, MetricRole};
use crate::stats;

/// Metric name → value. `None` means "defined but not computable" (e.g. a
/// division by zero); a key that is absent was never computed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    values: BTreeMap<String, Option<f64>>,
    has_numeric_data: bool,
}

impl MetricSet {
    /// Value of a metric, flattening "absent" and "null".
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied().flatten()
    }

    /// `Some(None)` for a null metric, `None` for an absent one.
    pub fn lookup(&self, key: &str) -> Option<Option<f64>> {
        self.values.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// False when the dataset had no numeric column at all.
    pub fn has_numeric_data(&self) -> bool {
        self.has_numeric_data
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn insert(&mut self, key: impl Into<String>, value: Option<f64>) {
        self.values.insert(key.into(), value);
    }
}

impl ValueObject for MetricSet {}

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; needs two values.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
}

impl ColumnSummary {
    pub fn from_values(column: &str, values: &[f64]) -> Result<Self, ColumnComputationError> {
        let (Some(mean), Some(median)) = (stats::mean(values), stats::median(values)) else {
            return Err(ColumnComputationError::InsufficientData {
                column: column.to_string(),
                needed: 1,
                found: 0,
            });
        };

        let sum: f64 = values.iter().sum();
        if !sum.is_finite() {
            return Err(ColumnComputationError::NonFinite {
                column: column.to_string(),
            });
        }

        Ok(Self {
            count: values.len(),
            mean,
            median,
            std_dev: stats::std_dev_sample(values, mean).filter(|s| s.is_finite()),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            sum,
        })
    }

    /// Coefficient of variation (std / mean).
    pub fn coefficient_of_variation(&self, column: &str) -> Result<f64, ColumnComputationError> {
        let std = self
            .std_dev
            .ok_or_else(|| ColumnComputationError::InsufficientData {
                column: column.to_string(),
                needed: 2,
                found: self.count,
            })?;
        if self.mean == 0.0 {
            return Err(ColumnComputationError::ZeroMean {
                column: column.to_string(),
            });
        }
        Ok(std / self.mean)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Numeric columns summarized per call.
    pub max_columns: usize,
    pub keywords: KeywordTable,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            max_columns: 10,
            keywords: KeywordTable::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetricsCalculator {
    config: MetricsConfig,
}

impl MetricsCalculator {
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    /// Per-column statistics, financial aggregates and missingness.
    ///
    /// Fails only on a dataset without columns.
    pub fn compute(&self, dataset: &Dataset) -> Result<MetricSet, DataError> {
        if dataset.column_count() == 0 {
            return Err(DataError::NoColumns);
        }

        let mut metrics = MetricSet::default();
        let numeric = dataset.numeric_column_indices();

        metrics.insert("total_records", Some(dataset.row_count() as f64));
        metrics.insert("total_columns", Some(dataset.column_count() as f64));
        metrics.insert("numeric_columns", Some(numeric.len() as f64));
        metrics.has_numeric_data = !numeric.is_empty();

        for &col in numeric.iter().take(self.config.max_columns) {
            let name = dataset.column_name(col);
            match ColumnSummary::from_values(name, &dataset.numeric_values(col)) {
                Ok(summary) => write_summary(&mut metrics, name, &summary),
                Err(err) => debug!(error = %err, "column skipped in metrics"),
            }
        }

        self.financial_metrics(dataset, &numeric, &mut metrics);

        let cells = dataset.row_count() * dataset.column_count();
        let missing = dataset.total_missing();
        metrics.insert("missing_values", Some(missing as f64));
        metrics.insert(
            "missing_percentage",
            (cells > 0).then(|| missing as f64 * 100.0 / cells as f64),
        );

        Ok(metrics)
    }

    /// First numeric column per financial role.
    fn role_columns(&self, dataset: &Dataset, numeric: &[usize]) -> BTreeMap<MetricRole, usize> {
        let mut roles = BTreeMap::new();
        for &col in numeric {
            if let Some(role) = self.config.keywords.role_of(dataset.column_name(col)) {
                roles.entry(role).or_insert(col);
            }
        }
        roles
    }

    fn financial_metrics(&self, dataset: &Dataset, numeric: &[usize], metrics: &mut MetricSet) {
        let roles = self.role_columns(dataset, numeric);
        let mut totals: BTreeMap<MetricRole, f64> = BTreeMap::new();

        for (&role, &col) in &roles {
            let values = dataset.numeric_values(col);
            let Some(avg) = stats::mean(&values) else {
                debug!(column = dataset.column_name(col), role = role.key(), "no values for financial role");
                continue;
            };
            let total_key = format!("total_{}", role.key());
            let avg_key = format!("avg_{}", role.key());
            let checked = finite(&total_key, values.iter().sum())
                .and_then(|total| finite(&avg_key, avg).map(|avg| (total, avg)));
            match checked {
                Ok((total, avg)) => {
                    metrics.insert(total_key, Some(total));
                    metrics.insert(avg_key, Some(avg));
                    totals.insert(role, total);
                }
                Err(err) => debug!(error = %err, "financial metric skipped"),
            }
        }

        if let (Some(&revenue), Some(&cost)) =
            (totals.get(&MetricRole::Revenue), totals.get(&MetricRole::Cost))
        {
            match finite("gross_profit", revenue - cost) {
                Ok(gross_profit) => {
                    metrics.insert("gross_profit", Some(gross_profit));
                    let margin = (revenue != 0.0)
                        .then(|| finite("gross_margin_percent", gross_profit * 100.0 / revenue))
                        .transpose();
                    match margin {
                        Ok(margin) => metrics.insert("gross_margin_percent", margin),
                        Err(err) => debug!(error = %err, "financial metric skipped"),
                    }
                }
                Err(err) => debug!(error = %err, "financial metric skipped"),
            }
        }

        if let Some(&col) = roles.get(&MetricRole::Revenue) {
            let growth = revenue_growth(dataset, col)
                .map(|g| finite("revenue_growth_percent", g))
                .transpose();
            match growth {
                Ok(growth) => metrics.insert("revenue_growth_percent", growth),
                Err(err) => debug!(error = %err, "financial metric skipped"),
            }
        }
    }
}

impl DatasetAnalyzer for MetricsCalculator {
    type Output = MetricSet;

    fn name(&self) -> &'static str {
        "metrics"
    }

    fn run(&self, dataset: &Dataset) -> Result<MetricSet, AnalysisError> {
        Ok(self.compute(dataset)?)
    }
}

fn write_summary(metrics: &mut MetricSet, name: &str, s: &ColumnSummary) {
    metrics.insert(format!("{name}_count"), Some(s.count as f64));
    metrics.insert(format!("{name}_mean"), Some(s.mean));
    metrics.insert(format!("{name}_median"), Some(s.median));
    if let Some(std) = s.std_dev {
        metrics.insert(format!("{name}_std"), Some(std));
    }
    metrics.insert(format!("{name}_min"), Some(s.min));
    metrics.insert(format!("{name}_max"), Some(s.max));
    metrics.insert(format!("{name}_sum"), Some(s.sum));
}

/// Derived metrics that overflow are dropped rather than stored as inf/NaN.
fn finite(metric: &str, value: f64) -> Result<f64, ColumnComputationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ColumnComputationError::NonFinite {
            column: metric.to_string(),
        })
    }
}

/// First-to-last change in percent, ordered by the first temporal column
/// when there is one and by row order otherwise.
fn revenue_growth(dataset: &Dataset, col: usize) -> Option<f64> {
    let series = dataset.numeric_series(col);

    let points: Vec<f64> = match dataset.temporal_column_index() {
        Some(time_col) => {
            let mut pairs: Vec<_> = dataset
                .timestamps(time_col)
                .into_iter()
                .zip(series)
                .filter_map(|(at, v)| Some((at?, v?)))
                .collect();
            pairs.sort_by_key(|(at, _)| *at);
            pairs.into_iter().map(|(_, v)| v).collect()
        }
        None => series.into_iter().flatten().collect(),
    };

    let (first, last) = match points.as_slice() {
        [first, .., last] => (*first, *last),
        _ => return None,
    };
    if first == 0.0 {
        return None;
    }
    Some((last - first) * 100.0 / first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizscope_core::Value;
    use chrono::{Duration, TimeZone, Utc};

    fn numbers(xs: &[f64]) -> Vec<Value> {
        xs.iter().copied().map(Value::from).collect()
    }

    fn dataset(columns: Vec<(&str, Vec<Value>)>) -> Dataset {
        Dataset::from_columns(columns.into_iter().map(|(n, v)| (n.to_string(), v)).collect())
            .unwrap()
    }

    #[test]
    fn revenue_and_cost_yield_gross_metrics() {
        let ds = dataset(vec![
            ("revenue", numbers(&[100.0, 200.0, 300.0])),
            ("cost", numbers(&[70.0, 80.0, 90.0])),
        ]);

        let m = MetricsCalculator::default().compute(&ds).unwrap();

        assert_eq!(m.get("total_revenue"), Some(600.0));
        assert_eq!(m.get("avg_revenue"), Some(200.0));
        assert_eq!(m.get("total_cost"), Some(240.0));
        assert_eq!(m.get("gross_profit"), Some(360.0));
        assert_eq!(m.get("gross_margin_percent"), Some(60.0));
        assert_eq!(m.get("revenue_growth_percent"), Some(200.0));
        assert!(!m.contains("total_profit"));
    }

    #[test]
    fn column_statistics_are_reported() {
        let ds = dataset(vec![("units", numbers(&[4.0, 1.0, 3.0, 2.0]))]);
        let m = MetricsCalculator::default().compute(&ds).unwrap();

        assert_eq!(m.get("units_count"), Some(4.0));
        assert_eq!(m.get("units_mean"), Some(2.5));
        assert_eq!(m.get("units_median"), Some(2.5));
        assert_eq!(m.get("units_min"), Some(1.0));
        assert_eq!(m.get("units_max"), Some(4.0));
        assert_eq!(m.get("units_sum"), Some(10.0));
        assert!(m.get("units_std").is_some());
        assert!(m.has_numeric_data());
    }

    #[test]
    fn zero_revenue_makes_margin_null() {
        let ds = dataset(vec![
            ("Revenue", numbers(&[0.0, 0.0])),
            ("Cost", numbers(&[10.0, 5.0])),
        ]);
        let m = MetricsCalculator::default().compute(&ds).unwrap();

        assert_eq!(m.get("gross_profit"), Some(-15.0));
        assert_eq!(m.lookup("gross_margin_percent"), Some(None));
        assert_eq!(m.lookup("revenue_growth_percent"), Some(None));
    }

    #[test]
    fn growth_follows_temporal_order() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ds = dataset(vec![
            (
                "date",
                vec![
                    Value::from(t + Duration::days(2)),
                    Value::from(t),
                    Value::from(t + Duration::days(1)),
                ],
            ),
            ("sales", numbers(&[150.0, 100.0, 120.0])),
        ]);
        let m = MetricsCalculator::default().compute(&ds).unwrap();
        assert_eq!(m.get("revenue_growth_percent"), Some(50.0));
    }

    #[test]
    fn single_point_growth_is_null() {
        let ds = dataset(vec![("income", numbers(&[100.0]))]);
        let m = MetricsCalculator::default().compute(&ds).unwrap();
        assert_eq!(m.lookup("revenue_growth_percent"), Some(None));
        assert!(!m.contains("income_std"));
    }

    #[test]
    fn no_numeric_columns_is_marked_not_failed() {
        let ds = dataset(vec![("name", vec![Value::from("a"), Value::from("b")])]);
        let m = MetricsCalculator::default().compute(&ds).unwrap();

        assert!(!m.has_numeric_data());
        assert_eq!(m.get("numeric_columns"), Some(0.0));
        assert_eq!(m.get("missing_values"), Some(0.0));
        assert!(!m.contains("total_revenue"));
    }

    #[test]
    fn missing_cells_are_counted() {
        let ds = dataset(vec![
            ("a", vec![Value::from(1.0), Value::Missing]),
            ("b", vec![Value::Missing, Value::from("x")]),
        ]);
        let m = MetricsCalculator::default().compute(&ds).unwrap();
        assert_eq!(m.get("missing_values"), Some(2.0));
        assert_eq!(m.get("missing_percentage"), Some(50.0));
    }

    #[test]
    fn all_missing_column_is_skipped() {
        let ds = dataset(vec![
            ("revenue", vec![Value::Missing, Value::Missing]),
            ("units", numbers(&[1.0, 2.0])),
        ]);
        let m = MetricsCalculator::default().compute(&ds).unwrap();
        assert!(!m.contains("revenue_mean"));
        assert!(!m.contains("total_revenue"));
        assert_eq!(m.get("units_sum"), Some(3.0));
    }

    #[test]
    fn column_cap_is_respected() {
        let columns = (0..15)
            .map(|i| (format!("c{i}"), numbers(&[1.0, 2.0])))
            .collect();
        let ds = Dataset::from_columns(columns).unwrap();
        let m = MetricsCalculator::default().compute(&ds).unwrap();

        assert!(m.contains("c9_mean"));
        assert!(!m.contains("c10_mean"));
        assert_eq!(m.get("numeric_columns"), Some(15.0));
    }

    #[test]
    fn overflowing_totals_are_omitted() {
        let ds = dataset(vec![
            ("revenue", numbers(&[1e308, 1e308])),
            ("cost", numbers(&[1.0, 1.0])),
        ]);
        let m = MetricsCalculator::default().compute(&ds).unwrap();

        assert!(!m.contains("revenue_mean"));
        assert!(!m.contains("total_revenue"));
        assert!(!m.contains("avg_revenue"));
        assert!(!m.contains("gross_profit"));
        assert!(!m.contains("gross_margin_percent"));
        assert_eq!(m.get("total_cost"), Some(2.0));
        assert!(m.iter().all(|(_, v)| v.is_none_or(f64::is_finite)));
        assert_eq!(m, m.clone());
    }

    #[test]
    fn overflowing_growth_is_omitted() {
        let ds = dataset(vec![("sales", numbers(&[1e-310, 1e300]))]);
        let m = MetricsCalculator::default().compute(&ds).unwrap();

        assert!(m.contains("total_revenue"));
        assert!(!m.contains("revenue_growth_percent"));
        assert!(!m.contains("sales_std"));
        assert!(m.iter().all(|(_, v)| v.is_none_or(f64::is_finite)));
    }

    #[test]
    fn first_column_per_role_is_used() {
        let ds = dataset(vec![
            ("revenue", numbers(&[10.0, 20.0])),
            ("sales_income", numbers(&[1000.0, 2000.0])),
        ]);
        let m = MetricsCalculator::default().compute(&ds).unwrap();

        assert_eq!(m.get("total_revenue"), Some(30.0));
        assert_eq!(m.get("avg_revenue"), Some(15.0));
        assert_eq!(m.get("revenue_growth_percent"), Some(100.0));
        assert_eq!(m.get("sales_income_sum"), Some(3000.0));
    }

    #[test]
    fn no_columns_is_a_data_error() {
        let ds = Dataset::new(vec![], vec![]).unwrap();
        assert_eq!(
            MetricsCalculator::default().compute(&ds),
            Err(DataError::NoColumns)
        );
    }
}
