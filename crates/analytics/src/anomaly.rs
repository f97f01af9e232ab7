//! Dispersion-bound outlier detection per numeric column.

use serde::{Deserialize, Serialize};
use tracing::debug;

use bizscope_core::{Dataset, ValueObject};

use crate::analyzer::DatasetAnalyzer;
use crate::error::{AnalysisError, ColumnComputationError};
use crate::stats;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyMethod {
    /// Tukey fences: `[Q1 - k·IQR, Q3 + k·IQR]`.
    #[default]
    Iqr,
    /// `mean ± k·σ`.
    ThreeSigma,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deviation {
    Below,
    Above,
}

/// One flagged cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    pub row_index: usize,
    pub value: f64,
    pub direction: Deviation,
}

/// Outlier summary for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub column: String,
    pub method: AnomalyMethod,
    pub outlier_count: usize,
    pub outlier_percentage: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// First few outliers in row order.
    pub examples: Vec<Outlier>,
}

impl ValueObject for Outlier {}
impl ValueObject for AnomalyRecord {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub method: AnomalyMethod,
    pub max_columns: usize,
    /// Columns need strictly more non-missing values than this.
    pub min_values: usize,
    pub iqr_multiplier: f64,
    pub sigma_multiplier: f64,
    pub max_examples: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            method: AnomalyMethod::Iqr,
            max_columns: 5,
            min_values: 10,
            iqr_multiplier: 1.5,
            sigma_multiplier: 3.0,
            max_examples: 10,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Detect with the configured method.
    pub fn detect(&self, dataset: &Dataset) -> Vec<AnomalyRecord> {
        self.detect_with(dataset, self.config.method)
    }

    pub fn detect_with(&self, dataset: &Dataset, method: AnomalyMethod) -> Vec<AnomalyRecord> {
        dataset
            .numeric_column_indices()
            .into_iter()
            .take(self.config.max_columns)
            .filter_map(|col| match self.examine_column(dataset, col, method) {
                Ok(record) => Some(record),
                Err(err) => {
                    debug!(error = %err, "column skipped in anomaly detection");
                    None
                }
            })
            .collect()
    }

    fn examine_column(
        &self,
        dataset: &Dataset,
        col: usize,
        method: AnomalyMethod,
    ) -> Result<AnomalyRecord, ColumnComputationError> {
        let name = dataset.column_name(col);
        let cells: Vec<(usize, f64)> = dataset
            .numeric_series(col)
            .into_iter()
            .enumerate()
            .filter_map(|(row, v)| Some((row, v?)))
            .collect();

        if cells.len() <= self.config.min_values {
            return Err(ColumnComputationError::InsufficientData {
                column: name.to_string(),
                needed: self.config.min_values + 1,
                found: cells.len(),
            });
        }

        let values: Vec<f64> = cells.iter().map(|(_, v)| *v).collect();
        let sorted = stats::sorted(&values);
        let non_finite = || ColumnComputationError::NonFinite {
            column: name.to_string(),
        };

        let mean = stats::mean(&values).filter(|m| m.is_finite()).ok_or_else(non_finite)?;
        let std_dev = stats::std_dev_sample(&values, mean).unwrap_or(0.0);

        let sigma_bounds = || {
            let k = self.config.sigma_multiplier;
            (mean - k * std_dev, mean + k * std_dev)
        };
        let (method, (lower_bound, upper_bound)) = if sorted[0] == sorted[sorted.len() - 1] {
            // Constant column: the bounds collapse onto the value itself.
            (method, (sorted[0], sorted[0]))
        } else {
            match method {
                AnomalyMethod::Iqr => {
                    let q1 = stats::quantile_sorted(&sorted, 0.25).ok_or_else(non_finite)?;
                    let q3 = stats::quantile_sorted(&sorted, 0.75).ok_or_else(non_finite)?;
                    let iqr = q3 - q1;
                    if iqr == 0.0 {
                        // Over half the values are equal; IQR bounds would flag every other value.
                        debug!(column = name, "zero IQR, using three-sigma bounds");
                        (AnomalyMethod::ThreeSigma, sigma_bounds())
                    } else {
                        let k = self.config.iqr_multiplier;
                        (method, (q1 - k * iqr, q3 + k * iqr))
                    }
                }
                AnomalyMethod::ThreeSigma => (method, sigma_bounds()),
            }
        };
        if !(lower_bound.is_finite() && upper_bound.is_finite()) {
            return Err(non_finite());
        }

        let outliers: Vec<Outlier> = cells
            .iter()
            .filter_map(|&(row_index, value)| {
                let direction = if value < lower_bound {
                    Deviation::Below
                } else if value > upper_bound {
                    Deviation::Above
                } else {
                    return None;
                };
                Some(Outlier {
                    row_index,
                    value,
                    direction,
                })
            })
            .collect();

        let outlier_count = outliers.len();
        let mut examples = outliers;
        examples.truncate(self.config.max_examples);

        Ok(AnomalyRecord {
            column: name.to_string(),
            method,
            outlier_count,
            outlier_percentage: outlier_count as f64 * 100.0 / values.len() as f64,
            mean,
            std_dev,
            lower_bound,
            upper_bound,
            examples,
        })
    }
}

impl DatasetAnalyzer for AnomalyDetector {
    type Output = Vec<AnomalyRecord>;

    fn name(&self) -> &'static str {
        "anomalies"
    }

    fn run(&self, dataset: &Dataset) -> Result<Vec<AnomalyRecord>, AnalysisError> {
        Ok(self.detect(dataset))
    }
}
