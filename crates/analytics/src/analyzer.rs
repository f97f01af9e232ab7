use bizscope_core::Dataset;

use crate::error::AnalysisError;

/// A dataset-level analysis unit.
///
/// Analyzers hold only immutable configuration, take their input as an
/// argument and return a fresh result, so one instance can serve concurrent
/// callers. They never call each other; the engine wires their outputs.
pub trait DatasetAnalyzer: Send + Sync {
    type Output;

    /// Short component name used in logs and internal errors.
    fn name(&self) -> &'static str;

    /// Run the analysis. Per-column problems are absorbed; only structural
    /// dataset problems surface as errors.
    fn run(&self, dataset: &Dataset) -> Result<Self::Output, AnalysisError>;
}
