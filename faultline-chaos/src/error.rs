//! Error types for the simulator and the injector.

use faultline_sut::{InterceptError, SutError};
use faultline_types::{ChaosScenarioType, NetworkScenarioKind};
use thiserror::Error;

/// Network simulator errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SimulatorError {
    /// No condition is registered under this name.
    #[error("unknown network condition: {0}")]
    UnknownCondition(String),

    /// The active condition does not list this scenario kind.
    #[error("scenario {kind} is not part of condition {condition}")]
    ScenarioNotInProfile {
        /// Requested kind.
        kind: NetworkScenarioKind,
        /// Active condition name.
        condition: String,
    },

    /// A condition must list at least one scenario.
    #[error("network condition {0} has no scenarios")]
    EmptyCondition(String),
}

/// Fault injector errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChaosError {
    /// The fault type is already installed.
    #[error("{0} is already installed")]
    AlreadyInstalled(ChaosScenarioType),

    /// A rate outside `[0, 1]` was requested.
    #[error("failure rate {0} outside [0, 1]")]
    InvalidRate(f64),

    /// The operation needs an idle injector.
    #[error("injector is active")]
    Active,

    /// A rule could not be installed or removed.
    #[error(transparent)]
    Intercept(#[from] InterceptError),

    /// The system under test refused an operation.
    #[error(transparent)]
    Sut(#[from] SutError),
}
