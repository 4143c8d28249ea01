//! Error types for system-under-test interactions.

use thiserror::Error;

use crate::RuleId;

/// Errors raised while installing or removing interception rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InterceptError {
    /// The system cannot intercept at the requested point.
    #[error("unsupported interception point: {0}")]
    UnsupportedInterceptionPoint(String),

    /// Too many rules are installed.
    #[error("rule limit reached ({0} rules)")]
    RuleLimit(usize),

    /// The rule was never registered or was already removed.
    #[error("unknown rule: {0}")]
    UnknownRule(RuleId),
}

/// Errors returned by a system under test.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SutError {
    /// A session could not be opened.
    #[error("session allocation failed: {0}")]
    SessionAllocation(String),

    /// Suite preparation failed for an organization.
    #[error("suite setup failed: {0}")]
    SuiteSetup(String),

    /// The pipeline failed to run the scenario.
    #[error("scenario failed: {0}")]
    ScenarioFailed(String),

    /// An outbound request was aborted.
    #[error("request aborted: {0}")]
    RequestAborted(String),

    /// An outbound request was answered with an error status.
    #[error("request rejected with status {status}: {body}")]
    RequestRejected {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The health endpoint could not be reached.
    #[error("health check failed: {0}")]
    HealthCheck(String),

    /// Resource pressure could not be applied or released.
    #[error("resource pressure failed: {0}")]
    Pressure(String),

    /// Interception error.
    #[error(transparent)]
    Intercept(#[from] InterceptError),
}
