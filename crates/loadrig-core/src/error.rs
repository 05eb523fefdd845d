use thiserror::Error;

/// Configuration problems that must stop a run before it begins.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("request list is empty")]
    NoRequests,

    #[error("request {index} has an empty endpoint")]
    EmptyEndpoint { index: usize },

    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    #[error("report interval must be positive")]
    ZeroReportInterval,
}

/// Why `ContinuousRunner::start` refused to begin a run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    /// A previous run is still active or has not finished winding down.
    #[error("a run is already in progress")]
    AlreadyRunning,

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}
