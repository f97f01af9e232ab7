//! `bizscope-analytics`
//!
//! **Responsibility:** quantitative diagnostics over a [`Dataset`]: metrics,
//! trends, anomalies, correlations, categorical-column samples and rule-based
//! recommendations, plus the
//! [`AnalysisEngine`] that runs them and attaches funnel results.
//!
//! - Analyzers never call each other; the engine wires outputs into the
//!   recommendation rules.
//! - Per-column problems are logged and skipped. Only a structurally empty
//!   dataset (or an analyzer bug) fails a call.
//! - Nothing here reads files other than configuration, and nothing renders
//!   reports: results are serde value objects.
//!
//! [`Dataset`]: bizscope_core::Dataset

pub mod analyzer;
pub mod anomaly;
pub mod config;
pub mod engine;
pub mod error;
pub mod keywords;
pub mod metrics;
pub mod patterns;
pub mod recommend;
pub mod result;
pub mod stats;
pub mod text;
pub mod trend;

pub use analyzer::DatasetAnalyzer;
pub use anomaly::{AnomalyConfig, AnomalyDetector, AnomalyMethod, AnomalyRecord, Deviation, Outlier};
pub use config::AnalysisConfig;
pub use engine::AnalysisEngine;
pub use error::{AnalysisError, ColumnComputationError, ConfigError};
pub use keywords::{KeywordTable, MetricRole};
pub use metrics::{ColumnSummary, MetricSet, MetricsCalculator, MetricsConfig};
pub use patterns::{Correlation, DateRange, PatternConfig, PatternFinder, PatternSet};
pub use recommend::{
    Priority, Recommendation, RecommendationCategory, RecommendationConfig, RecommendationEngine,
};
pub use result::AnalysisResult;
pub use stats::{Significance, SignificanceMode, Strength};
pub use text::{TextSample, TextSummarizer, TextSummary, TextSummaryConfig};
pub use trend::{Direction, TrendConfig, TrendDetector, TrendRecord};
