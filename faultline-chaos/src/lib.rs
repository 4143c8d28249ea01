//! # faultline-chaos
//!
//! Degraded-network simulation and fault injection.
//!
//! - [`NetworkConditionSimulator`] - probabilistic model of network quality
//!   with weighted scenario transitions and simulated requests
//! - [`profiles`] - predefined network conditions (`fiber`, `wifi`,
//!   `mobile-4g`, `mobile-3g`, `satellite`, `unstable`)
//! - [`FailureInjector`] - installs intensity-gated faults into a system's
//!   request interceptor and resource-pressure capability
//!
//! The two engines are independent; the orchestrator composes them.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod injector;
pub mod profiles;
mod simulator;

pub use error::{ChaosError, SimulatorError};
pub use injector::{FailureInjector, InjectorStatus};
pub use simulator::{NetworkConditionSimulator, SimulatorConfig};
