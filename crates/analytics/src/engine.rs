use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug_span, error, info, info_span};

use bizscope_core::Dataset;
use bizscope_funnel::{FunnelAnalysisResult, FunnelAnalyzer, OutcomeClassifier, PipelineRecord, TimeWindow};

use crate::analyzer::DatasetAnalyzer;
use crate::anomaly::AnomalyDetector;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::metrics::MetricsCalculator;
use crate::patterns::PatternFinder;
use crate::recommend::RecommendationEngine;
use crate::result::AnalysisResult;
use crate::text::TextSummarizer;
use crate::trend::TrendDetector;

/// Runs every dataset analyzer and assembles an [`AnalysisResult`].
///
/// Holds configuration only; `analyze` takes `&self`, so one engine can be
/// shared across threads.
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    config: AnalysisConfig,
    metrics: MetricsCalculator,
    trends: TrendDetector,
    anomalies: AnomalyDetector,
    patterns: PatternFinder,
    text: TextSummarizer,
    recommendations: RecommendationEngine,
    funnel: FunnelAnalyzer,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl AnalysisEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            metrics: MetricsCalculator::new(config.metrics.clone()),
            trends: TrendDetector::new(config.trends.clone()),
            anomalies: AnomalyDetector::new(config.anomalies.clone()),
            patterns: PatternFinder::new(config.patterns.clone()),
            text: TextSummarizer::new(config.text.clone()),
            recommendations: RecommendationEngine::new(config.recommendations.clone()),
            funnel: FunnelAnalyzer::new(config.funnel.clone()),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Full dataset analysis.
    ///
    /// Fails only when the dataset has no columns or no rows, or when an
    /// analyzer panics (reported as [`AnalysisError::Internal`]).
    pub fn analyze(&self, dataset: &Dataset) -> Result<AnalysisResult, AnalysisError> {
        let span = info_span!(
            "analyze",
            rows = dataset.row_count(),
            columns = dataset.column_count()
        );
        let _enter = span.enter();

        dataset.ensure_analyzable()?;

        let metrics = run_stage(&self.metrics, dataset)?;
        let trends = run_stage(&self.trends, dataset)?;
        let anomalies = run_stage(&self.anomalies, dataset)?;
        let patterns = run_stage(&self.patterns, dataset)?;
        let text_summary = run_stage(&self.text, dataset)?;
        let recommendations = guarded("recommendations", || {
            Ok(self.recommendations.recommend(dataset, &metrics, Some(trends.as_slice())))
        })?;

        info!(
            metrics = metrics.len(),
            trends = trends.len(),
            anomalies = anomalies.len(),
            correlations = patterns.correlations.len(),
            text_columns = text_summary.columns.len(),
            recommendations = recommendations.len(),
            "analysis complete"
        );

        Ok(AnalysisResult {
            summary: summarize(dataset),
            metrics,
            trends,
            anomalies,
            patterns,
            text_summary,
            recommendations,
            funnel: None,
        })
    }

    /// Funnel analysis over pipeline records; attach the outcome to a
    /// dataset result with [`AnalysisResult::with_funnel`].
    pub fn analyze_funnel(
        &self,
        records: &[PipelineRecord],
        classifier: &dyn OutcomeClassifier,
        window: Option<&TimeWindow>,
    ) -> FunnelAnalysisResult {
        let span = info_span!("analyze_funnel", records = records.len());
        let _enter = span.enter();
        self.funnel.analyze(records, classifier, window)
    }
}

fn run_stage<A: DatasetAnalyzer>(analyzer: &A, dataset: &Dataset) -> Result<A::Output, AnalysisError> {
    let _span = debug_span!("stage", component = analyzer.name()).entered();
    guarded(analyzer.name(), || analyzer.run(dataset))
}

/// Turns a panic inside `f` into [`AnalysisError::Internal`].
fn guarded<T>(
    component: &'static str,
    f: impl FnOnce() -> Result<T, AnalysisError>,
) -> Result<T, AnalysisError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(component, %message, "analyzer panicked");
            Err(AnalysisError::Internal { component, message })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn summarize(dataset: &Dataset) -> String {
    let mut parts = vec![format!(
        "{} rows and {} columns.",
        dataset.row_count(),
        dataset.column_count()
    )];

    let numeric = dataset.numeric_column_indices().len();
    if numeric > 0 {
        parts.push(format!("{numeric} numeric columns."));
    }
    if let Some(col) = dataset.temporal_column_index() {
        parts.push(format!("Time series over {}.", dataset.column_name(col)));
    }
    let missing = dataset.total_missing();
    if missing > 0 {
        parts.push(format!("{missing} missing cells."));
    }
    parts.join(" ")
}
