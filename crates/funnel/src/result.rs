use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bizscope_core::ValueObject;

use crate::error::ClassificationError;

/// Records grouped under one pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStage {
    pub stage_id: String,
    pub name: String,
    pub record_count: u64,
    pub total_value: f64,
}

/// Conversion between two adjacent stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    pub from_stage: String,
    pub to_stage: String,
    pub conversion_rate: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

/// A stage transition that loses too many records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub from_stage: String,
    pub to_stage: String,
    pub conversion_rate: f64,
    pub lost_count: i64,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssigneePerformance {
    pub assignee_id: String,
    pub total_count: u64,
    pub successful_count: u64,
    pub failed_count: u64,
    pub total_value: f64,
    /// Mean days from creation to close; `None` without any closed record.
    pub average_cycle_time: Option<f64>,
    pub conversion_rate: f64,
    pub average_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelSummary {
    pub total_count: u64,
    pub successful_count: u64,
    pub failed_count: u64,
    pub conversion_rate: f64,
    pub total_value: f64,
    pub average_value: f64,
}

/// Creation-date span of the analyzed records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// How many records each sub-computation had to leave out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedRecords {
    pub outside_window: u64,
    pub over_cap: u64,
    pub missing_stage: u64,
    pub missing_assignee: u64,
    pub missing_dates: u64,
    pub negative_cycle_time: u64,
}

impl ExcludedRecords {
    pub(crate) fn note(&mut self, err: &ClassificationError) {
        tracing::debug!(error = %err, "record excluded from funnel sub-computation");
        match err {
            ClassificationError::MissingStage(_) => self.missing_stage += 1,
            ClassificationError::MissingAssignee(_) => self.missing_assignee += 1,
            ClassificationError::MissingDates(_) => self.missing_dates += 1,
            ClassificationError::NegativeCycleTime(_) => self.negative_cycle_time += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelAnalysisResult {
    pub period: Option<Period>,
    pub summary: FunnelSummary,
    pub stages: Vec<FunnelStage>,
    pub transitions: Vec<StageTransition>,
    pub bottlenecks: Vec<Bottleneck>,
    pub assignees: Vec<AssigneePerformance>,
    /// Record count per raw status; records without a status are under
    /// [`FunnelAnalysisResult::UNKNOWN_STATUS`].
    pub status_counts: BTreeMap<String, u64>,
    pub successful_ids: Vec<String>,
    pub failed_ids: Vec<String>,
    pub excluded: ExcludedRecords,
}

impl FunnelAnalysisResult {
    pub const UNKNOWN_STATUS: &'static str = "unknown";

    pub fn stage(&self, stage_id: &str) -> Option<&FunnelStage> {
        self.stages.iter().find(|s| s.stage_id == stage_id)
    }

    pub fn assignee(&self, assignee_id: &str) -> Option<&AssigneePerformance> {
        self.assignees.iter().find(|a| a.assignee_id == assignee_id)
    }
}

impl ValueObject for FunnelStage {}
impl ValueObject for StageTransition {}
impl ValueObject for Bottleneck {}
impl ValueObject for AssigneePerformance {}
impl ValueObject for FunnelSummary {}
impl ValueObject for Period {}
impl ValueObject for ExcludedRecords {}
impl ValueObject for FunnelAnalysisResult {}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_value_object<T: ValueObject>() {}

    #[test]
    fn every_result_part_is_a_value_object() {
        assert_value_object::<FunnelStage>();
        assert_value_object::<StageTransition>();
        assert_value_object::<Bottleneck>();
        assert_value_object::<AssigneePerformance>();
        assert_value_object::<FunnelSummary>();
        assert_value_object::<Period>();
        assert_value_object::<ExcludedRecords>();
        assert_value_object::<FunnelAnalysisResult>();
    }

    #[test]
    fn exclusions_are_tallied_by_reason() {
        let mut excluded = ExcludedRecords::default();
        excluded.note(&ClassificationError::MissingStage("r1".into()));
        excluded.note(&ClassificationError::MissingStage("r2".into()));
        excluded.note(&ClassificationError::NegativeCycleTime("r3".into()));

        assert_eq!(excluded.missing_stage, 2);
        assert_eq!(excluded.negative_cycle_time, 1);
        assert_eq!(excluded.missing_dates, 0);
    }
}
