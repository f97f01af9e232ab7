//! Linear trend detection per numeric column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use bizscope_core::{Dataset, ValueObject};

use crate::analyzer::DatasetAnalyzer;
use crate::error::{AnalysisError, ColumnComputationError};
use crate::stats::{self, SignificanceMode, Strength};

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Rising,
    Falling,
    Stable,
}

/// Fitted trend of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub metric: String,
    pub direction: Direction,
    pub strength: Strength,
    /// Change per row, or per day when a temporal column drives the axis.
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
    pub r_squared: f64,
    pub p_value: Option<f64>,
    pub significant: bool,
    /// True when `significant` is a convention rather than a test result.
    pub significance_estimated: bool,
    pub points: usize,
}

impl ValueObject for TrendRecord {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub max_columns: usize,
    pub min_points: usize,
    /// Dead zone around zero slope classified as stable.
    pub slope_epsilon: f64,
    pub significance: SignificanceMode,
    pub alpha: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            max_columns: 5,
            min_points: 3,
            slope_epsilon: 0.1,
            significance: SignificanceMode::default(),
            alpha: 0.05,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrendDetector {
    config: TrendConfig,
}

impl TrendDetector {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    /// One record per analyzable numeric column (capped); columns that
    /// cannot be fitted are left out.
    pub fn detect(&self, dataset: &Dataset) -> Vec<TrendRecord> {
        let axis = dataset
            .temporal_column_index()
            .map(|col| elapsed_days(&dataset.timestamps(col)));

        dataset
            .numeric_column_indices()
            .into_iter()
            .take(self.config.max_columns)
            .filter_map(|col| match self.fit_column(dataset, col, axis.as_deref()) {
                Ok(record) => Some(record),
                Err(err) => {
                    debug!(error = %err, "column skipped in trend detection");
                    None
                }
            })
            .collect()
    }

    fn fit_column(
        &self,
        dataset: &Dataset,
        col: usize,
        axis: Option<&[Option<f64>]>,
    ) -> Result<TrendRecord, ColumnComputationError> {
        let name = dataset.column_name(col);

        let (xs, ys): (Vec<f64>, Vec<f64>) = dataset
            .numeric_series(col)
            .into_iter()
            .enumerate()
            .filter_map(|(row, y)| {
                let x = match axis {
                    Some(axis) => axis[row]?,
                    None => row as f64,
                };
                Some((x, y?))
            })
            .unzip();

        if xs.len() < self.config.min_points {
            return Err(ColumnComputationError::InsufficientData {
                column: name.to_string(),
                needed: self.config.min_points,
                found: xs.len(),
            });
        }

        let fit = stats::linear_fit(&xs, &ys).ok_or_else(|| ColumnComputationError::ZeroVariance {
            column: name.to_string(),
        })?;
        if !(fit.slope.is_finite() && fit.intercept.is_finite()) {
            return Err(ColumnComputationError::NonFinite {
                column: name.to_string(),
            });
        }

        let significance = self.config.significance.assess(fit.r, fit.n, self.config.alpha);

        Ok(TrendRecord {
            metric: name.to_string(),
            direction: self.direction(fit.slope),
            strength: Strength::from_correlation(fit.r),
            slope: fit.slope,
            intercept: fit.intercept,
            r: fit.r,
            r_squared: fit.r_squared(),
            p_value: significance.p_value,
            significant: significance.significant,
            significance_estimated: significance.estimated,
            points: fit.n,
        })
    }

    fn direction(&self, slope: f64) -> Direction {
        if slope > self.config.slope_epsilon {
            Direction::Rising
        } else if slope < -self.config.slope_epsilon {
            Direction::Falling
        } else {
            Direction::Stable
        }
    }
}

impl DatasetAnalyzer for TrendDetector {
    type Output = Vec<TrendRecord>;

    fn name(&self) -> &'static str {
        "trends"
    }

    fn run(&self, dataset: &Dataset) -> Result<Vec<TrendRecord>, AnalysisError> {
        Ok(self.detect(dataset))
    }
}

/// Days since the earliest timestamp, aligned with rows.
fn elapsed_days(timestamps: &[Option<DateTime<Utc>>]) -> Vec<Option<f64>> {
    let Some(origin) = timestamps.iter().flatten().min().copied() else {
        return vec![None; timestamps.len()];
    };
    timestamps
        .iter()
        .map(|t| t.map(|t| (t - origin).num_seconds() as f64 / SECONDS_PER_DAY))
        .collect()
}
