use serde::{Deserialize, Serialize};

use bizscope_core::ValueObject;
use bizscope_funnel::FunnelAnalysisResult;

use crate::anomaly::AnomalyRecord;
use crate::metrics::MetricSet;
use crate::patterns::PatternSet;
use crate::recommend::Recommendation;
use crate::text::TextSummary;
use crate::trend::TrendRecord;

/// Everything one `analyze` call produced.
///
/// This is a report, not state: it is built once and handed to whatever
/// renders it (dashboard, chat reply, report file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub metrics: MetricSet,
    pub trends: Vec<TrendRecord>,
    pub anomalies: Vec<AnomalyRecord>,
    pub patterns: PatternSet,
    /// Categorical columns and a few of their values.
    #[serde(default)]
    pub text_summary: TextSummary,
    pub recommendations: Vec<Recommendation>,
    /// One-line description of the dataset's shape.
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funnel: Option<FunnelAnalysisResult>,
}

impl AnalysisResult {
    pub fn with_funnel(mut self, funnel: FunnelAnalysisResult) -> Self {
        self.funnel = Some(funnel);
        self
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

impl ValueObject for AnalysisResult {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::Outlier;
    use crate::patterns::{Correlation, DateRange};
    use crate::text::TextSample;

    fn assert_value_object<T: ValueObject>() {}

    #[test]
    fn every_result_part_is_a_value_object() {
        assert_value_object::<MetricSet>();
        assert_value_object::<TrendRecord>();
        assert_value_object::<AnomalyRecord>();
        assert_value_object::<Outlier>();
        assert_value_object::<PatternSet>();
        assert_value_object::<Correlation>();
        assert_value_object::<DateRange>();
        assert_value_object::<TextSummary>();
        assert_value_object::<TextSample>();
        assert_value_object::<Recommendation>();
        assert_value_object::<AnalysisResult>();
    }
}
