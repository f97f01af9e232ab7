use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classifier::{Outcome, OutcomeClassifier};
use crate::error::{ClassificationError, FunnelError};
use crate::record::{PipelineRecord, TimeWindow};
use crate::result::{
    AssigneePerformance, Bottleneck, ExcludedRecords, FunnelAnalysisResult, FunnelStage,
    FunnelSummary, Period, Severity, StageTransition,
};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Funnel analysis thresholds and caps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelConfig {
    /// Transitions converting below this percentage are bottlenecks.
    pub bottleneck_threshold: f64,
    /// Bottlenecks at or below this percentage are high severity.
    pub high_severity_threshold: f64,
    /// Maximum number of records examined per call.
    pub max_records: usize,
    /// Explicit stage order; stages not listed follow in order of appearance.
    pub stage_order: Vec<String>,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            bottleneck_threshold: 30.0,
            high_severity_threshold: 20.0,
            max_records: 50_000,
            stage_order: Vec::new(),
        }
    }
}

impl FunnelConfig {
    pub fn validate(&self) -> Result<(), FunnelError> {
        if !(self.bottleneck_threshold.is_finite() && self.bottleneck_threshold > 0.0) {
            return Err(FunnelError::InvalidConfig(
                "bottleneck_threshold must be a finite positive percentage".to_string(),
            ));
        }
        if !(self.high_severity_threshold.is_finite()
            && self.high_severity_threshold > 0.0
            && self.high_severity_threshold <= self.bottleneck_threshold)
        {
            return Err(FunnelError::InvalidConfig(
                "high_severity_threshold must be positive and not exceed bottleneck_threshold"
                    .to_string(),
            ));
        }
        if self.max_records == 0 {
            return Err(FunnelError::InvalidConfig(
                "max_records must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Stage aggregation, conversion, bottleneck and assignee rollups.
///
/// Stateless apart from its configuration: the same analyzer may serve
/// concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct FunnelAnalyzer {
    config: FunnelConfig,
}

#[derive(Debug)]
struct StageAcc {
    stage_id: String,
    name: String,
    first_seen: usize,
    count: u64,
    value: f64,
}

#[derive(Debug, Default)]
struct AssigneeAcc {
    total: u64,
    successful: u64,
    failed: u64,
    value: f64,
    cycle_days_sum: f64,
    cycle_samples: u64,
}

impl FunnelAnalyzer {
    pub fn new(config: FunnelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FunnelConfig {
        &self.config
    }

    pub fn analyze(
        &self,
        records: &[PipelineRecord],
        classifier: &dyn OutcomeClassifier,
        window: Option<&TimeWindow>,
    ) -> FunnelAnalysisResult {
        let mut excluded = ExcludedRecords::default();

        let capped = if records.len() > self.config.max_records {
            warn!(
                records = records.len(),
                max_records = self.config.max_records,
                "funnel input truncated to record cap"
            );
            excluded.over_cap = (records.len() - self.config.max_records) as u64;
            &records[..self.config.max_records]
        } else {
            records
        };

        let in_window: Vec<&PipelineRecord> = capped
            .iter()
            .filter(|r| match window {
                Some(w) => r.created_at.is_some_and(|at| w.contains(at)),
                None => true,
            })
            .collect();
        excluded.outside_window = (capped.len() - in_window.len()) as u64;

        info!(records = in_window.len(), "analyzing funnel");

        let mut stages: Vec<StageAcc> = Vec::new();
        let mut stage_index: HashMap<&str, usize> = HashMap::new();
        let mut assignees: BTreeMap<&str, AssigneeAcc> = BTreeMap::new();
        let mut status_counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut successful_ids = Vec::new();
        let mut failed_ids = Vec::new();
        let mut total_value = 0.0;

        for record in &in_window {
            let outcome = classifier.classify(record);
            match outcome {
                Outcome::Successful => successful_ids.push(record.id.clone()),
                Outcome::Failed => failed_ids.push(record.id.clone()),
                Outcome::Open => {}
            }
            total_value += record.amount();

            let status = record
                .status
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(FunnelAnalysisResult::UNKNOWN_STATUS);
            *status_counts.entry(status.to_string()).or_default() += 1;

            match group_stage(record) {
                Ok(stage_id) => {
                    let idx = *stage_index.entry(stage_id).or_insert_with(|| {
                        stages.push(StageAcc {
                            stage_id: stage_id.to_string(),
                            name: record
                                .stage_name
                                .clone()
                                .unwrap_or_else(|| format!("Stage {stage_id}")),
                            first_seen: stages.len(),
                            count: 0,
                            value: 0.0,
                        });
                        stages.len() - 1
                    });
                    stages[idx].count += 1;
                    stages[idx].value += record.amount();
                }
                Err(err) => excluded.note(&err),
            }

            match record.assignee_id.as_deref() {
                Some(assignee) => {
                    let acc = assignees.entry(assignee).or_default();
                    acc.total += 1;
                    acc.value += record.amount();
                    match outcome {
                        Outcome::Successful => acc.successful += 1,
                        Outcome::Failed => acc.failed += 1,
                        Outcome::Open => {}
                    }
                    match cycle_time_days(record) {
                        Ok(days) => {
                            acc.cycle_days_sum += days;
                            acc.cycle_samples += 1;
                        }
                        Err(err) => excluded.note(&err),
                    }
                }
                None => excluded.note(&ClassificationError::MissingAssignee(record.id.clone())),
            }
        }

        self.order_stages(&mut stages);
        let stages: Vec<FunnelStage> = stages
            .into_iter()
            .map(|s| FunnelStage {
                stage_id: s.stage_id,
                name: s.name,
                record_count: s.count,
                total_value: s.value,
            })
            .collect();

        let (transitions, bottlenecks) = self.find_bottlenecks(&stages);

        let total_count = in_window.len() as u64;
        let summary = FunnelSummary {
            total_count,
            successful_count: successful_ids.len() as u64,
            failed_count: failed_ids.len() as u64,
            conversion_rate: percentage(successful_ids.len() as u64, total_count),
            total_value,
            average_value: if total_count > 0 {
                total_value / total_count as f64
            } else {
                0.0
            },
        };

        let assignees = assignees
            .into_iter()
            .map(|(id, acc)| AssigneePerformance {
                assignee_id: id.to_string(),
                total_count: acc.total,
                successful_count: acc.successful,
                failed_count: acc.failed,
                total_value: acc.value,
                average_cycle_time: (acc.cycle_samples > 0)
                    .then(|| acc.cycle_days_sum / acc.cycle_samples as f64),
                conversion_rate: percentage(acc.successful, acc.total),
                average_value: acc.value / acc.total as f64,
            })
            .collect();

        let created = in_window.iter().filter_map(|r| r.created_at);
        let period = created
            .clone()
            .min()
            .zip(created.max())
            .map(|(start, end)| Period { start, end });

        FunnelAnalysisResult {
            period,
            summary,
            stages,
            transitions,
            bottlenecks,
            assignees,
            status_counts,
            successful_ids,
            failed_ids,
            excluded,
        }
    }

    fn order_stages(&self, stages: &mut [StageAcc]) {
        if self.config.stage_order.is_empty() {
            return;
        }
        stages.sort_by_key(|s| {
            let configured = self
                .config
                .stage_order
                .iter()
                .position(|id| *id == s.stage_id)
                .unwrap_or(usize::MAX);
            (configured, s.first_seen)
        });
    }

    fn find_bottlenecks(&self, stages: &[FunnelStage]) -> (Vec<StageTransition>, Vec<Bottleneck>) {
        let mut transitions = Vec::new();
        let mut bottlenecks = Vec::new();

        for pair in stages.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            if current.record_count == 0 {
                continue;
            }

            let conversion = percentage(next.record_count, current.record_count);
            transitions.push(StageTransition {
                from_stage: current.name.clone(),
                to_stage: next.name.clone(),
                conversion_rate: conversion,
            });

            if conversion < self.config.bottleneck_threshold {
                let severity = if conversion <= self.config.high_severity_threshold {
                    Severity::High
                } else {
                    Severity::Medium
                };
                bottlenecks.push(Bottleneck {
                    from_stage: current.name.clone(),
                    to_stage: next.name.clone(),
                    conversion_rate: conversion,
                    lost_count: current.record_count as i64 - next.record_count as i64,
                    severity,
                });
            }
        }

        (transitions, bottlenecks)
    }
}

fn group_stage(record: &PipelineRecord) -> Result<&str, ClassificationError> {
    record
        .stage_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ClassificationError::MissingStage(record.id.clone()))
}

fn cycle_time_days(record: &PipelineRecord) -> Result<f64, ClassificationError> {
    let (Some(created), Some(closed)) = (record.created_at, record.closed_at) else {
        return Err(ClassificationError::MissingDates(record.id.clone()));
    };
    let days = (closed - created).num_seconds() as f64 / SECONDS_PER_DAY;
    if days < 0.0 {
        return Err(ClassificationError::NegativeCycleTime(record.id.clone()));
    }
    Ok(days)
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / whole as f64
}
