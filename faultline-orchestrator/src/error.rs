//! Error types for faultline-orchestrator.
//!
//! Only [`OrchestrationError::Configuration`], [`OrchestrationError::AlreadyRunning`]
//! and [`OrchestrationError::Fatal`] escape a run. The other variants describe failures that are folded into
//! the result (failed executions, organization errors, failed checks).

use faultline_types::OrchestrationResult;

use crate::config::ConfigError;

/// Main error type for orchestration runs.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    /// The configuration was rejected before anything ran.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Another run is in progress on the same orchestrator.
    #[error("an orchestration run is already in progress")]
    AlreadyRunning,

    /// Shared setup failed; carries the failed result with its reports.
    #[error("fatal orchestration error: {reason}")]
    Fatal {
        /// What failed.
        reason: String,
        /// Result assembled before teardown.
        result: Box<OrchestrationResult>,
    },

    /// One organization could not complete a suite.
    #[error("organization {organization} failed: {reason}")]
    OrganizationExecution {
        /// Organization name.
        organization: String,
        /// What failed.
        reason: String,
    },

    /// One scenario errored or timed out.
    #[error("scenario {scenario} failed: {reason}")]
    ScenarioExecution {
        /// Scenario name.
        scenario: String,
        /// What failed.
        reason: String,
    },

    /// A post-execution check could not run.
    #[error("validation {check} failed: {reason}")]
    Validation {
        /// Check name.
        check: String,
        /// What failed.
        reason: String,
    },
}

impl OrchestrationError {
    /// The failed result carried by a fatal error.
    pub fn result(&self) -> Option<&OrchestrationResult> {
        match self {
            OrchestrationError::Fatal { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Test coordinator errors.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// A session is already open.
    #[error("session already initialized: {0}")]
    SessionActive(String),

    /// No session is open.
    #[error("no active session")]
    NoSession,

    /// The orchestration category could not run.
    #[error(transparent)]
    Orchestration(#[from] OrchestrationError),
}

/// Result type alias for orchestration operations.
pub type Result<T> = std::result::Result<T, OrchestrationError>;

/// Result type alias for coordinator operations.
pub type CoordinatorResult<T> = std::result::Result<T, CoordinatorError>;
