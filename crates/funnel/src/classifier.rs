use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::record::PipelineRecord;

/// Final state of a pipeline record, as far as conversion is concerned.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Successful,
    Failed,
    /// Still in progress (or unknown).
    Open,
}

/// Decides whether a record counts as won, lost or open.
///
/// CRMs encode this with account-specific status identifiers, so the rule is
/// always injected by the caller.
pub trait OutcomeClassifier: Send + Sync {
    fn classify(&self, record: &PipelineRecord) -> Outcome;
}

impl<F> OutcomeClassifier for F
where
    F: Fn(&PipelineRecord) -> Outcome + Send + Sync,
{
    fn classify(&self, record: &PipelineRecord) -> Outcome {
        self(record)
    }
}

/// Configuration-driven classifier: explicit sets of status identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusClassifier {
    pub successful: BTreeSet<String>,
    pub failed: BTreeSet<String>,
}

impl StatusClassifier {
    pub fn new<S, F>(successful: S, failed: F) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            successful: successful.into_iter().map(Into::into).collect(),
            failed: failed.into_iter().map(Into::into).collect(),
        }
    }
}

impl OutcomeClassifier for StatusClassifier {
    fn classify(&self, record: &PipelineRecord) -> Outcome {
        match record.status.as_deref() {
            Some(s) if self.successful.contains(s) => Outcome::Successful,
            Some(s) if self.failed.contains(s) => Outcome::Failed,
            _ => Outcome::Open,
        }
    }
}
