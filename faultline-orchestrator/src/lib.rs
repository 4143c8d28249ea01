//! # faultline-orchestrator
//!
//! Resilience-testing orchestration for multi-tenant deployment pipelines.
//!
//! The [`ExecutionOrchestrator`] drives deployment scenarios against a
//! [`SystemUnderTest`](faultline_sut::SystemUnderTest) across organizations,
//! environments and suites, optionally under a degraded simulated network and
//! active fault injection, then aggregates, grades and reports the outcome.
//! The [`TestCoordinator`] runs the orchestrator next to other test
//! categories and folds everything into one unified verdict.
//!
//! ## Modules
//!
//! - [`config`] - Run configuration and TOML settings files
//! - [`error`] - Error taxonomy
//! - [`validation`] - Post-execution checks
//! - [`orchestrator`] - Session fan-out, scenario execution, aggregation
//! - [`coordinator`] - Hybrid test categories and unified reporting
//! - [`telemetry`] - Tracing subscriber bootstrap

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod coordinator;
pub mod error;
pub mod orchestrator;
pub mod telemetry;
pub mod validation;

pub use config::{ChaosSettings, ConfigError, NetworkSettings, OrchestrationConfig};
pub use coordinator::{
    generate_recommendations, unified_report, CategoryResult, CategoryRunner, CategorySummary,
    HybridTestRequest, TestCoordinator, TestSession, UnifiedResult,
};
pub use error::{CoordinatorError, OrchestrationError, Result};
pub use orchestrator::{ExecutionOrchestrator, ScenarioSetOptions};
