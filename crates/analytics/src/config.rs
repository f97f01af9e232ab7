use std::path::Path;

use serde::{Deserialize, Serialize};

use bizscope_funnel::FunnelConfig;

use crate::anomaly::AnomalyConfig;
use crate::error::ConfigError;
use crate::metrics::MetricsConfig;
use crate::patterns::PatternConfig;
use crate::recommend::RecommendationConfig;
use crate::text::TextSummaryConfig;
use crate::trend::TrendConfig;

/// Configuration of every analyzer the engine runs.
///
/// Every section and field falls back to its default, so `{}` is a valid
/// configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub metrics: MetricsConfig,
    pub trends: TrendConfig,
    pub anomalies: AnomalyConfig,
    pub patterns: PatternConfig,
    pub text: TextSummaryConfig,
    pub recommendations: RecommendationConfig,
    pub funnel: FunnelConfig,
}

impl AnalysisConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive_count("metrics.max_columns", self.metrics.max_columns)?;
        if self.metrics.keywords.is_empty() {
            return Err(ConfigError::Invalid(
                "metrics.keywords must list at least one keyword".to_string(),
            ));
        }

        positive_count("trends.max_columns", self.trends.max_columns)?;
        if self.trends.min_points < 3 {
            return Err(ConfigError::Invalid(
                "trends.min_points must be >= 3".to_string(),
            ));
        }
        non_negative("trends.slope_epsilon", self.trends.slope_epsilon)?;
        probability("trends.alpha", self.trends.alpha)?;

        positive_count("anomalies.max_columns", self.anomalies.max_columns)?;
        positive("anomalies.iqr_multiplier", self.anomalies.iqr_multiplier)?;
        positive("anomalies.sigma_multiplier", self.anomalies.sigma_multiplier)?;

        positive_count("patterns.max_columns", self.patterns.max_columns)?;
        if self.patterns.min_points < 3 {
            return Err(ConfigError::Invalid(
                "patterns.min_points must be >= 3".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.patterns.min_abs_correlation) {
            return Err(ConfigError::Invalid(
                "patterns.min_abs_correlation must be in [0, 1)".to_string(),
            ));
        }
        probability("patterns.alpha", self.patterns.alpha)?;

        let rec = &self.recommendations;
        if !(rec.missing_ratio_threshold.is_finite() && (0.0..1.0).contains(&rec.missing_ratio_threshold)) {
            return Err(ConfigError::Invalid(
                "recommendations.missing_ratio_threshold must be in [0, 1)".to_string(),
            ));
        }
        positive("recommendations.cv_threshold", rec.cv_threshold)?;
        positive_count("recommendations.max_named_columns", rec.max_named_columns)?;

        self.funnel.validate()?;
        Ok(())
    }
}

fn positive_count(field: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid(format!("{field} must be >= 1")));
    }
    Ok(())
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ConfigError::Invalid(format!(
            "{field} must be finite and positive"
        )));
    }
    Ok(())
}

fn non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(ConfigError::Invalid(format!(
            "{field} must be finite and non-negative"
        )));
    }
    Ok(())
}

fn probability(field: &str, value: f64) -> Result<(), ConfigError> {
    if !(value > 0.0 && value < 1.0) {
        return Err(ConfigError::Invalid(format!("{field} must be in (0, 1)")));
    }
    Ok(())
}
