//! Overview of categorical columns.

use serde::{Deserialize, Serialize};

use bizscope_core::{ColumnKind, Dataset, Value, ValueObject};

use crate::analyzer::DatasetAnalyzer;
use crate::error::AnalysisError;

/// Leading non-missing values of one categorical column, in row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSample {
    pub column: String,
    pub values: Vec<String>,
}

/// Every categorical column by name, with samples from the first few.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextSummary {
    pub columns: Vec<String>,
    pub samples: Vec<TextSample>,
}

impl TextSummary {
    pub fn sample(&self, column: &str) -> Option<&TextSample> {
        self.samples.iter().find(|s| s.column == column)
    }
}

impl ValueObject for TextSample {}
impl ValueObject for TextSummary {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSummaryConfig {
    /// Categorical columns that get samples.
    pub max_sampled_columns: usize,
    /// Values kept per sampled column.
    pub max_samples: usize,
}

impl Default for TextSummaryConfig {
    fn default() -> Self {
        Self {
            max_sampled_columns: 3,
            max_samples: 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextSummarizer {
    config: TextSummaryConfig,
}

impl TextSummarizer {
    pub fn new(config: TextSummaryConfig) -> Self {
        Self { config }
    }

    pub fn summarize(&self, dataset: &Dataset) -> TextSummary {
        let categorical: Vec<usize> = (0..dataset.column_count())
            .filter(|&col| dataset.column_kind(col) == ColumnKind::Categorical)
            .collect();

        let samples = categorical
            .iter()
            .take(self.config.max_sampled_columns)
            .map(|&col| TextSample {
                column: dataset.column_name(col).to_string(),
                values: dataset
                    .column_values(col)
                    .filter(|v| !v.is_missing())
                    .take(self.config.max_samples)
                    .map(render)
                    .collect(),
            })
            .collect();

        TextSummary {
            columns: categorical
                .iter()
                .map(|&col| dataset.column_name(col).to_string())
                .collect(),
            samples,
        }
    }
}

impl DatasetAnalyzer for TextSummarizer {
    type Output = TextSummary;

    fn name(&self) -> &'static str {
        "text"
    }

    fn run(&self, dataset: &Dataset) -> Result<TextSummary, AnalysisError> {
        Ok(self.summarize(dataset))
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Timestamp(t) => t.to_rfc3339(),
        Value::Missing => String::new(),
    }
}
