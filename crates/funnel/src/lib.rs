//! `bizscope-funnel`
//!
//! **Responsibility:** pipeline (sales funnel) analysis over stage-tagged
//! records supplied by a CRM client.
//!
//! - It does not talk to any CRM: records arrive already normalized.
//! - Success/failure is decided by a caller-supplied [`OutcomeClassifier`],
//!   never by hardcoded status identifiers.

pub mod analyzer;
pub mod classifier;
pub mod error;
pub mod record;
pub mod result;

pub use analyzer::{FunnelAnalyzer, FunnelConfig};
pub use classifier::{Outcome, OutcomeClassifier, StatusClassifier};
pub use error::{ClassificationError, FunnelError};
pub use record::{PipelineRecord, TimeWindow};
pub use result::{
    AssigneePerformance, Bottleneck, ExcludedRecords, FunnelAnalysisResult, FunnelStage,
    FunnelSummary, Period, Severity, StageTransition,
};
