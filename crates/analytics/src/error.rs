use thiserror::Error;

use bizscope_core::DataError;
use bizscope_funnel::FunnelError;

/// Fatal failure of a whole analysis call.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The dataset itself cannot be analyzed.
    #[error(transparent)]
    Data(#[from] DataError),

    /// A bug inside an analyzer (caught panic, broken invariant).
    #[error("internal error in {component}: {message}")]
    Internal {
        component: &'static str,
        message: String,
    },
}

/// A single column could not contribute to a result.
///
/// Always handled locally: the column's entry is omitted and the event is
/// logged, nothing is propagated to callers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ColumnComputationError {
    #[error("column {column}: need at least {needed} values, found {found}")]
    InsufficientData {
        column: String,
        needed: usize,
        found: usize,
    },

    #[error("column {column}: no variance along the regression axis")]
    ZeroVariance { column: String },

    #[error("column {column}: mean is zero")]
    ZeroMean { column: String },

    #[error("column {column}: statistic is not finite")]
    NonFinite { column: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Funnel(#[from] FunnelError),
}
