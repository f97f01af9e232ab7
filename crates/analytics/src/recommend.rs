//! Rule-based advisories derived from a dataset, its metrics and trends.
//!
//! Rules run in a fixed order and never short-circuit: every rule that
//! fires contributes, so the output is a deterministic function of the
//! inputs.

use serde::{Deserialize, Serialize};
use tracing::debug;

use bizscope_core::{Dataset, ValueObject};

use crate::metrics::{ColumnSummary, MetricSet};
use crate::stats::Strength;
use crate::trend::{Direction, TrendRecord};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    DataQuality,
    Variability,
    Performance,
    Redundancy,
    Trend,
    Profitability,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub priority: Priority,
    pub text: String,
}

impl Recommendation {
    fn new(category: RecommendationCategory, priority: Priority, text: impl Into<String>) -> Self {
        Self {
            category,
            priority,
            text: text.into(),
        }
    }
}

impl ValueObject for Recommendation {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Share of missing cells (0..1) above which a column is flagged.
    pub missing_ratio_threshold: f64,
    /// Coefficient of variation above which a column is called volatile.
    pub cv_threshold: f64,
    pub max_cv_columns: usize,
    /// Row count above which performance advice is given.
    pub large_dataset_rows: usize,
    /// Column names listed in a single advisory.
    pub max_named_columns: usize,
    pub max_trend_recommendations: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            missing_ratio_threshold: 0.2,
            cv_threshold: 0.5,
            max_cv_columns: 3,
            large_dataset_rows: 1000,
            max_named_columns: 3,
            max_trend_recommendations: 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    config: RecommendationConfig,
}

impl RecommendationEngine {
    pub fn new(config: RecommendationConfig) -> Self {
        Self { config }
    }

    pub fn recommend(
        &self,
        dataset: &Dataset,
        metrics: &MetricSet,
        trends: Option<&[TrendRecord]>,
    ) -> Vec<Recommendation> {
        let mut out = Vec::new();
        self.missing_values(dataset, &mut out);
        self.variability(dataset, &mut out);
        self.dataset_size(dataset, &mut out);
        self.constant_columns(dataset, &mut out);
        if let Some(trends) = trends {
            self.declining_trends(trends, &mut out);
        }
        Self::profitability(metrics, &mut out);
        out
    }

    fn missing_values(&self, dataset: &Dataset, out: &mut Vec<Recommendation>) {
        let rows = dataset.row_count();
        if rows == 0 {
            return;
        }
        let flagged: Vec<&str> = (0..dataset.column_count())
            .filter(|&col| {
                dataset.missing_count(col) as f64 / rows as f64 > self.config.missing_ratio_threshold
            })
            .map(|col| dataset.column_name(col))
            .collect();

        if !flagged.is_empty() {
            out.push(Recommendation::new(
                RecommendationCategory::DataQuality,
                Priority::High,
                format!(
                    "High share of missing values in columns: {}. Fill or drop them before drawing conclusions.",
                    self.name_list(&flagged)
                ),
            ));
        }
    }

    fn variability(&self, dataset: &Dataset, out: &mut Vec<Recommendation>) {
        for col in dataset
            .numeric_column_indices()
            .into_iter()
            .take(self.config.max_cv_columns)
        {
            let name = dataset.column_name(col);
            let cv = ColumnSummary::from_values(name, &dataset.numeric_values(col))
                .and_then(|s| s.coefficient_of_variation(name));
            match cv {
                Ok(cv) if cv > self.config.cv_threshold => out.push(Recommendation::new(
                    RecommendationCategory::Variability,
                    Priority::Medium,
                    format!(
                        "High volatility in {name} (coefficient of variation {cv:.2}). Consider normalizing or segmenting it."
                    ),
                )),
                Ok(_) => {}
                Err(err) => debug!(error = %err, "column skipped in variability check"),
            }
        }
    }

    fn dataset_size(&self, dataset: &Dataset, out: &mut Vec<Recommendation>) {
        if dataset.row_count() > self.config.large_dataset_rows {
            out.push(Recommendation::new(
                RecommendationCategory::Performance,
                Priority::Low,
                format!(
                    "Large dataset ({} rows). Consider indexing or sampling for faster analysis.",
                    dataset.row_count()
                ),
            ));
        }
    }

    fn constant_columns(&self, dataset: &Dataset, out: &mut Vec<Recommendation>) {
        let constant: Vec<&str> = (0..dataset.column_count())
            .filter(|&col| dataset.distinct_count(col) == 1)
            .map(|col| dataset.column_name(col))
            .collect();

        if !constant.is_empty() {
            out.push(Recommendation::new(
                RecommendationCategory::Redundancy,
                Priority::Low,
                format!(
                    "Columns with a single value carry no information: {}. Consider removing them.",
                    self.name_list(&constant)
                ),
            ));
        }
    }

    fn declining_trends(&self, trends: &[TrendRecord], out: &mut Vec<Recommendation>) {
        let declining = trends
            .iter()
            .filter(|t| {
                t.direction == Direction::Falling && t.strength == Strength::Strong && t.significant
            })
            .take(self.config.max_trend_recommendations);

        for t in declining {
            out.push(Recommendation::new(
                RecommendationCategory::Trend,
                Priority::Medium,
                format!(
                    "{} shows a strong downward trend (slope {:.2}, r² {:.2}). Investigate the cause.",
                    t.metric, t.slope, t.r_squared
                ),
            ));
        }
    }

    fn profitability(metrics: &MetricSet, out: &mut Vec<Recommendation>) {
        if let Some(gross_profit) = metrics.get("gross_profit").filter(|gp| *gp < 0.0) {
            out.push(Recommendation::new(
                RecommendationCategory::Profitability,
                Priority::High,
                format!("Costs exceed revenue (gross profit {gross_profit:.2}). Review pricing and expenses."),
            ));
        }
    }

    fn name_list(&self, names: &[&str]) -> String {
        names
            .iter()
            .take(self.config.max_named_columns)
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsCalculator;
    use crate::trend::TrendDetector;
    use bizscope_core::Value;

    fn numbers(xs: &[f64]) -> Vec<Value> {
        xs.iter().copied().map(Value::from).collect()
    }

    fn recommend(ds: &Dataset) -> Vec<Recommendation> {
        let metrics = MetricsCalculator::default().compute(ds).unwrap();
        let trends = TrendDetector::default().detect(ds);
        RecommendationEngine::default().recommend(ds, &metrics, Some(trends.as_slice()))
    }

    fn of(recs: &[Recommendation], category: RecommendationCategory) -> Vec<&Recommendation> {
        recs.iter().filter(|r| r.category == category).collect()
    }

    #[test]
    fn thirty_percent_missing_yields_one_data_quality_advisory() {
        let mut region: Vec<Value> = (0..7).map(|i| Value::from(format!("r{}", i % 2))).collect();
        region.extend([Value::Missing, Value::Missing, Value::Missing]);
        let ds = Dataset::from_columns(vec![
            ("region".into(), region),
            ("units".into(), numbers(&[5.0, 6.0, 5.0, 7.0, 6.0, 5.0, 6.0, 7.0, 5.0, 6.0])),
        ])
        .unwrap();

        let recs = recommend(&ds);
        let quality = of(&recs, RecommendationCategory::DataQuality);
        assert_eq!(quality.len(), 1);
        assert_eq!(quality[0].priority, Priority::High);
        assert!(quality[0].text.contains("region"));
        assert!(!quality[0].text.contains("units"));
    }

    #[test]
    fn volatile_columns_get_one_advisory_each() {
        let ds = Dataset::from_columns(vec![
            ("a".into(), numbers(&[1.0, 100.0, 2.0, 90.0])),
            ("b".into(), numbers(&[10.0, 11.0, 10.0, 11.0])),
            ("c".into(), numbers(&[5.0, 500.0, 1.0, 300.0])),
            ("d".into(), numbers(&[-1.0, 1.0, -1.0, 1.0])),
        ])
        .unwrap();

        let recs = recommend(&ds);
        let volatile = of(&recs, RecommendationCategory::Variability);
        assert_eq!(volatile.len(), 2);
        assert!(volatile[0].text.contains("High volatility in a"));
        assert!(volatile[1].text.contains("High volatility in c"));
        assert!(volatile.iter().all(|r| r.priority == Priority::Medium));
    }

    #[test]
    fn zero_mean_column_is_skipped_for_variability() {
        let ds = Dataset::from_columns(vec![("x".into(), numbers(&[-5.0, 5.0, -5.0, 5.0]))]).unwrap();
        assert!(of(&recommend(&ds), RecommendationCategory::Variability).is_empty());
    }

    #[test]
    fn large_dataset_gets_performance_advisory() {
        let values: Vec<f64> = (0..1001).map(|i| f64::from(i % 7)).collect();
        let ds = Dataset::from_columns(vec![("x".into(), numbers(&values))]).unwrap();
        let perf = of(&recommend(&ds), RecommendationCategory::Performance).len();
        assert_eq!(perf, 1);

        let small = Dataset::from_columns(vec![("x".into(), numbers(&values[..1000]))]).unwrap();
        assert!(of(&recommend(&small), RecommendationCategory::Performance).is_empty());
    }

    #[test]
    fn single_valued_columns_are_redundant() {
        let ds = Dataset::from_columns(vec![
            ("currency".into(), vec![Value::from("EUR"), Value::from("EUR"), Value::Missing]),
            ("fee".into(), numbers(&[2.0, 2.0, 2.0])),
            ("amount".into(), numbers(&[1.0, 2.0, 3.0])),
        ])
        .unwrap();

        let recs = recommend(&ds);
        let redundant = of(&recs, RecommendationCategory::Redundancy);
        assert_eq!(redundant.len(), 1);
        assert_eq!(redundant[0].priority, Priority::Low);
        assert!(redundant[0].text.contains("currency, fee"));
        assert!(!redundant[0].text.contains("amount"));
    }

    #[test]
    fn constant_number_delivered_as_text_is_redundant() {
        let ds = Dataset::from_columns(vec![
            (
                "fee".into(),
                vec![Value::from(1.0), Value::from("1"), Value::from("1.0"), Value::from(1.0)],
            ),
            ("amount".into(), numbers(&[1.0, 2.0, 3.0, 4.0])),
        ])
        .unwrap();

        let recs = recommend(&ds);
        let redundant = of(&recs, RecommendationCategory::Redundancy);
        assert_eq!(redundant.len(), 1);
        assert!(redundant[0].text.contains("fee"));
        assert!(!redundant[0].text.contains("amount"));
    }

    #[test]
    fn strong_decline_and_losses_are_flagged() {
        let revenue: Vec<f64> = (0..12).map(|i| 1_000.0 - 50.0 * f64::from(i)).collect();
        let cost: Vec<f64> = vec![900.0; 12];
        let ds = Dataset::from_columns(vec![
            ("revenue".into(), numbers(&revenue)),
            ("cost".into(), numbers(&cost)),
        ])
        .unwrap();

        let recs = recommend(&ds);
        let trend = of(&recs, RecommendationCategory::Trend);
        assert_eq!(trend.len(), 1);
        assert!(trend[0].text.starts_with("revenue"));

        let loss = of(&recs, RecommendationCategory::Profitability);
        assert_eq!(loss.len(), 1);
        assert_eq!(loss[0].priority, Priority::High);
    }

    #[test]
    fn without_trends_no_trend_advisories() {
        let revenue: Vec<f64> = (0..12).map(|i| 1_000.0 - 50.0 * f64::from(i)).collect();
        let ds = Dataset::from_columns(vec![("revenue".into(), numbers(&revenue))]).unwrap();
        let metrics = MetricsCalculator::default().compute(&ds).unwrap();
        let recs = RecommendationEngine::default().recommend(&ds, &metrics, None);
        assert!(of(&recs, RecommendationCategory::Trend).is_empty());
    }

    #[test]
    fn rules_keep_their_order() {
        let mut sparse = numbers(&[1.0, 1.0]);
        sparse.extend([Value::Missing, Value::Missing]);
        let ds = Dataset::from_columns(vec![("s".into(), sparse)]).unwrap();

        let categories: Vec<_> = recommend(&ds).iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec![RecommendationCategory::DataQuality, RecommendationCategory::Redundancy]
        );
    }
}
