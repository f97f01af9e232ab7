//! Pairwise correlations and temporal coverage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use bizscope_core::{Dataset, ValueObject};

use crate::analyzer::DatasetAnalyzer;
use crate::error::{AnalysisError, ColumnComputationError};
use crate::stats::{self, SignificanceMode, Strength};

/// Strong linear relationship between two numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub left: String,
    pub right: String,
    pub coefficient: f64,
    pub strength: Strength,
    pub p_value: Option<f64>,
    pub significant: bool,
}

/// Span covered by the first temporal column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub column: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_days: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternSet {
    pub correlations: Vec<Correlation>,
    pub date_range: Option<DateRange>,
}

impl ValueObject for Correlation {}
impl ValueObject for DateRange {}
impl ValueObject for PatternSet {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub max_columns: usize,
    /// Only pairs with |r| above this are reported.
    pub min_abs_correlation: f64,
    pub min_points: usize,
    pub significance: SignificanceMode,
    pub alpha: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            max_columns: 10,
            min_abs_correlation: 0.7,
            min_points: 3,
            significance: SignificanceMode::default(),
            alpha: 0.05,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatternFinder {
    config: PatternConfig,
}

impl PatternFinder {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }

    pub fn find(&self, dataset: &Dataset) -> PatternSet {
        PatternSet {
            correlations: self.correlations(dataset),
            date_range: date_range(dataset),
        }
    }

    fn correlations(&self, dataset: &Dataset) -> Vec<Correlation> {
        let columns: Vec<(usize, Vec<Option<f64>>)> = dataset
            .numeric_column_indices()
            .into_iter()
            .take(self.config.max_columns)
            .map(|col| (col, dataset.numeric_series(col)))
            .collect();

        let mut out = Vec::new();
        for (i, (left, xs)) in columns.iter().enumerate() {
            for (right, ys) in &columns[i + 1..] {
                match self.correlate(dataset, (*left, xs), (*right, ys)) {
                    Ok(Some(c)) => out.push(c),
                    Ok(None) => {}
                    Err(err) => debug!(error = %err, "pair skipped in correlation"),
                }
            }
        }
        out
    }

    fn correlate(
        &self,
        dataset: &Dataset,
        (left, xs): (usize, &[Option<f64>]),
        (right, ys): (usize, &[Option<f64>]),
    ) -> Result<Option<Correlation>, ColumnComputationError> {
        let (a, b): (Vec<f64>, Vec<f64>) = xs
            .iter()
            .zip(ys)
            .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
            .unzip();

        let pair = || format!("{}/{}", dataset.column_name(left), dataset.column_name(right));
        if a.len() < self.config.min_points {
            return Err(ColumnComputationError::InsufficientData {
                column: pair(),
                needed: self.config.min_points,
                found: a.len(),
            });
        }

        let r = stats::pearson(&a, &b).ok_or_else(|| ColumnComputationError::ZeroVariance {
            column: pair(),
        })?;
        if r.abs() <= self.config.min_abs_correlation {
            return Ok(None);
        }

        let significance = self.config.significance.assess(r, a.len(), self.config.alpha);
        Ok(Some(Correlation {
            left: dataset.column_name(left).to_string(),
            right: dataset.column_name(right).to_string(),
            coefficient: r,
            strength: Strength::from_correlation(r),
            p_value: significance.p_value,
            significant: significance.significant,
        }))
    }
}

impl DatasetAnalyzer for PatternFinder {
    type Output = PatternSet;

    fn name(&self) -> &'static str {
        "patterns"
    }

    fn run(&self, dataset: &Dataset) -> Result<PatternSet, AnalysisError> {
        Ok(self.find(dataset))
    }
}

fn date_range(dataset: &Dataset) -> Option<DateRange> {
    let col = dataset.temporal_column_index()?;
    let stamps = dataset.timestamps(col);
    let start = stamps.iter().flatten().min().copied()?;
    let end = stamps.iter().flatten().max().copied()?;
    Some(DateRange {
        column: dataset.column_name(col).to_string(),
        start,
        end,
        duration_days: (end - start).num_days(),
    })
}
