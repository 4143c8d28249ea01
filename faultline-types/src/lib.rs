//! # faultline-types
//!
//! Data model shared by every faultline crate.
//!
//! - [`ExecutionId`], [`SessionId`] - Run and session identity
//! - [`NetworkCondition`], [`NetworkScenario`], [`NetworkMetrics`] - Network simulation model
//! - [`ChaosConfig`], [`ChaosScenarioType`], [`ChaosMetrics`] - Fault-injection model
//! - [`ScenarioDefinition`], [`PipelineExecution`] - Scenario catalog and run outcomes
//! - [`OrganizationTestResult`], [`OrchestrationResult`] - Aggregated, graded results
//! - [`TypesError`] - Parsing errors for the enumerations above

#![warn(missing_docs)]
#![warn(clippy::all)]

mod chaos;
mod error;
mod ids;
mod network;
mod pipeline;
mod results;

pub use chaos::{
    ChaosConfig, ChaosIntensity, ChaosMetrics, ChaosScenarioResult, ChaosScenarioType, Impact,
    SeverityOverrides,
};
pub use error::TypesError;
pub use ids::{ExecutionId, SessionId};
pub use network::{
    BandwidthProfile, BatchOutcome, ConnectionStatus, ImpactMultipliers, LatencyProfile,
    NetworkCondition, NetworkMetrics, NetworkScenario, NetworkScenarioKind, NetworkSummary,
    RequestOutcome,
};
pub use pipeline::{
    Complexity, ExpectedBehavior, PipelineExecution, PipelineMetrics, PipelineSummary,
    ScenarioDefinition, ScenarioRecord, Scorecard, TestSuite, ValidationCheck, ValidationResult,
};
pub use results::{
    ComplianceResult, ExecutionSummary, Grade, OrchestrationReports, OrchestrationResult,
    OrchestrationStatus, OrganizationMetrics, OrganizationStatus, OrganizationTestResult,
    OverallMetrics, ReportingLevel, RequirementStatus,
};
