use thiserror::Error;

/// Why a record was left out of one funnel sub-computation.
///
/// Never fatal: the record still counts everywhere else.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("record {0} has no stage identifier")]
    MissingStage(String),

    #[error("record {0} has no assignee")]
    MissingAssignee(String),

    #[error("record {0} lacks a create or close date")]
    MissingDates(String),

    #[error("record {0} closes before it was created")]
    NegativeCycleTime(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FunnelError {
    #[error("invalid funnel configuration: {0}")]
    InvalidConfig(String),
}
