use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One deal/lead/opportunity as delivered by the CRM collaborator.
///
/// Only `id` is required; every analysis step documents which optional
/// fields it needs and skips records that lack them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRecord {
    pub id: String,
    pub stage_id: Option<String>,
    pub stage_name: Option<String>,
    /// CRM status identifier, interpreted only by an [`crate::OutcomeClassifier`].
    pub status: Option<String>,
    pub value: Option<f64>,
    pub assignee_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl PipelineRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stage_id: None,
            stage_name: None,
            status: None,
            value: None,
            assignee_id: None,
            created_at: None,
            closed_at: None,
        }
    }

    pub fn with_stage(mut self, stage_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.stage_id = Some(stage_id.into());
        self.stage_name = Some(name.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_assignee(mut self, assignee_id: impl Into<String>) -> Self {
        self.assignee_id = Some(assignee_id.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_closed_at(mut self, closed_at: DateTime<Utc>) -> Self {
        self.closed_at = Some(closed_at);
        self
    }

    /// Monetary value, with non-finite amounts treated as absent.
    pub fn amount(&self) -> f64 {
        self.value.filter(|v| v.is_finite()).unwrap_or(0.0)
    }
}

/// Inclusive creation-date window for a funnel analysis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window covering the `days` days before `end`.
    pub fn last_days(end: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: end - chrono::Duration::days(days),
            end,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}
