//! Scenario catalog entries and the outcomes of running them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::{BatchOutcome, TypesError};

/// Complexity tag of a catalog scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    /// Single-service, fast deployments
    Simple,
    /// Multi-service deployments
    Medium,
    /// Large, multi-region deployments
    Complex,
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Complexity::Simple => write!(f, "simple"),
            Complexity::Medium => write!(f, "medium"),
            Complexity::Complex => write!(f, "complex"),
        }
    }
}

/// Test suite requested in an orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestSuite {
    /// Simple scenarios
    Smoke,
    /// Medium scenarios
    Integration,
    /// Complex scenarios
    Performance,
    /// Medium scenarios under degraded network and active fault injection
    Chaos,
    /// Compliance checks only
    Compliance,
    /// All of the above, in sequence
    Full,
}

impl TestSuite {
    /// Every suite, in declaration order.
    pub const ALL: [TestSuite; 6] = [
        TestSuite::Smoke,
        TestSuite::Integration,
        TestSuite::Performance,
        TestSuite::Chaos,
        TestSuite::Compliance,
        TestSuite::Full,
    ];

    /// Stable wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TestSuite::Smoke => "smoke",
            TestSuite::Integration => "integration",
            TestSuite::Performance => "performance",
            TestSuite::Chaos => "chaos",
            TestSuite::Compliance => "compliance",
            TestSuite::Full => "full",
        }
    }
}

impl fmt::Display for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestSuite {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|suite| suite.as_str() == s)
            .ok_or_else(|| TypesError::UnknownTestSuite(s.to_string()))
    }
}

/// Envelope a scenario's execution is expected to stay within.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedBehavior {
    /// Lower bound of the estimated monthly cost.
    pub min_cost: f64,
    /// Upper bound of the estimated monthly cost.
    pub max_cost: f64,
    /// Upper bound on deployment time in milliseconds.
    pub max_deployment_ms: u64,
    /// Upper bound on rollback time in milliseconds.
    pub max_rollback_ms: u64,
}

impl ExpectedBehavior {
    /// Whether a cost estimate falls inside the envelope (inclusive).
    pub fn cost_within(&self, cost: f64) -> bool {
        cost >= self.min_cost && cost <= self.max_cost
    }

    /// Midpoint of the cost envelope.
    pub fn cost_midpoint(&self) -> f64 {
        (self.min_cost + self.max_cost) / 2.0
    }
}

/// A read-only catalog entry describing one deployment test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    /// Unique scenario name.
    pub name: String,
    /// Organization the scenario belongs to.
    pub organization: String,
    /// Complexity tag.
    pub complexity: Complexity,
    /// Deployment configuration handed to the pipeline.
    pub configuration: BTreeMap<String, String>,
    /// Expected-behaviour envelope.
    pub expected: ExpectedBehavior,
}

/// Timing and resource figures of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineMetrics {
    /// Time to deploy, in milliseconds.
    pub deployment_time_ms: u64,
    /// Time to roll back, if a rollback ran.
    pub rollback_time_ms: Option<u64>,
    /// Number of resources the deployment created.
    pub resources_created: u32,
}

/// Quality score of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    /// Overall score (0–100).
    pub overall: f64,
}

/// Human-facing verdict of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Whether the deploy/monitor/rollback cycle succeeded.
    pub overall_success: bool,
    /// Issues that block a release.
    pub critical_issues: Vec<String>,
    /// Follow-up suggestions from the pipeline.
    pub recommendations: Vec<String>,
}

/// Result of running one scenario against the system under test.
///
/// Created once per scenario run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineExecution {
    /// Name of the scenario that ran.
    pub scenario: String,
    /// Timing and resource figures.
    pub metrics: PipelineMetrics,
    /// Quality score.
    pub scorecard: Scorecard,
    /// Verdict.
    pub summary: PipelineSummary,
}

impl PipelineExecution {
    /// Record for a scenario that errored or timed out before producing a result.
    pub fn failed(scenario: &str, reason: &str) -> Self {
        Self {
            scenario: scenario.to_string(),
            metrics: PipelineMetrics::default(),
            scorecard: Scorecard { overall: 0.0 },
            summary: PipelineSummary {
                overall_success: false,
                critical_issues: vec![reason.to_string()],
                recommendations: Vec::new(),
            },
        }
    }
}

/// Kind of post-execution check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCheck {
    /// Deployment and rollback timing thresholds
    Sla,
    /// Post-deployment health check
    Health,
    /// Organization-specific compliance requirements
    Compliance,
    /// Cost estimate inside the scenario envelope
    Cost,
    /// Probe traffic under the simulated network
    Network,
}

impl fmt::Display for ValidationCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationCheck::Sla => write!(f, "sla"),
            ValidationCheck::Health => write!(f, "health"),
            ValidationCheck::Compliance => write!(f, "compliance"),
            ValidationCheck::Cost => write!(f, "cost"),
            ValidationCheck::Network => write!(f, "network"),
        }
    }
}

/// Result of one validation check. Failures are recorded, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Which check ran.
    pub check: ValidationCheck,
    /// Whether the check passed.
    pub passed: bool,
    /// What was checked.
    pub description: String,
    /// Details on failure.
    pub failure_details: Option<String>,
}

impl ValidationResult {
    /// Create a passing result.
    pub fn pass(check: ValidationCheck, description: &str) -> Self {
        Self {
            check,
            passed: true,
            description: description.into(),
            failure_details: None,
        }
    }

    /// Create a failing result.
    pub fn fail(check: ValidationCheck, description: &str, details: &str) -> Self {
        Self {
            check,
            passed: false,
            description: description.into(),
            failure_details: Some(details.into()),
        }
    }
}

/// Everything recorded about one scenario run inside a suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// Environment the scenario ran in.
    pub environment: String,
    /// Suite that selected the scenario.
    pub suite: TestSuite,
    /// Index of the session the scenario was assigned to.
    pub session_index: usize,
    /// Pipeline outcome.
    pub execution: PipelineExecution,
    /// Post-execution checks.
    pub validations: Vec<ValidationResult>,
    /// Cost estimate from the cost collaborator.
    pub estimated_cost: f64,
    /// Wall-clock time spent, when performance monitoring is on.
    pub observed_duration_ms: Option<u64>,
    /// Probe traffic outcome, when network simulation is on.
    pub network: Option<BatchOutcome>,
}

impl ScenarioRecord {
    /// Whether the pipeline reported success.
    pub fn succeeded(&self) -> bool {
        self.execution.summary.overall_success
    }

    /// Whether every validation check passed.
    pub fn all_validations_passed(&self) -> bool {
        self.validations.iter().all(|v| v.passed)
    }
}
