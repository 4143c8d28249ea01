//! Aggregated, graded results of an orchestration run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{ChaosMetrics, ExecutionId, ScenarioRecord, ValidationResult};

/// Letter grade derived from a 0–100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    /// 90 and above
    A,
    /// 80 to 89.99
    B,
    /// 70 to 79.99
    C,
    /// 60 to 69.99
    D,
    /// Below 60
    F,
}

impl Grade {
    /// Whether this grade is D or F.
    pub fn is_poor(&self) -> bool {
        matches!(self, Grade::D | Grade::F)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(s)
    }
}

/// Terminal status of an orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationStatus {
    /// Every organization finished
    Completed,
    /// Shared setup failed
    Failed,
    /// The run exceeded its time budget
    Timeout,
    /// The run was cancelled
    Cancelled,
}

impl fmt::Display for OrchestrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestrationStatus::Completed => write!(f, "completed"),
            OrchestrationStatus::Failed => write!(f, "failed"),
            OrchestrationStatus::Timeout => write!(f, "timeout"),
            OrchestrationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Verdict for one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationStatus {
    /// High success rate and every validation passed
    Passed,
    /// Some scenarios succeeded
    Partial,
    /// Nothing succeeded, or the suite errored
    Failed,
}

impl fmt::Display for OrganizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrganizationStatus::Passed => write!(f, "passed"),
            OrganizationStatus::Partial => write!(f, "partial"),
            OrganizationStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Status of one compliance requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementStatus {
    /// Requirement name.
    pub requirement: String,
    /// Whether it is satisfied.
    pub satisfied: bool,
    /// Evidence or reason.
    pub detail: String,
}

/// Compliance outcome for one organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceResult {
    /// Every requirement checked.
    pub requirements: Vec<RequirementStatus>,
    /// Human-readable violations.
    pub violations: Vec<String>,
}

impl ComplianceResult {
    /// Share of satisfied requirements as a percentage; 0 when none were checked.
    pub fn score(&self) -> f64 {
        if self.requirements.is_empty() {
            return 0.0;
        }
        let satisfied = self.requirements.iter().filter(|r| r.satisfied).count();
        satisfied as f64 / self.requirements.len() as f64 * 100.0
    }
}

/// Derived metrics of one organization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationMetrics {
    /// Scenarios executed.
    pub total_scenarios: usize,
    /// Scenarios whose pipeline reported success.
    pub successful_scenarios: usize,
    /// Success percentage.
    pub success_rate: f64,
    /// Mean scorecard score.
    pub average_score: f64,
    /// Mean deployment time in milliseconds.
    pub average_deployment_ms: f64,
    /// Mean rollback time over executions that rolled back.
    pub average_rollback_ms: f64,
    /// Percentage of executions meeting both SLA thresholds.
    pub sla_compliance: f64,
    /// Sum of cost estimates.
    pub cost_total: f64,
}

/// Aggregation over all scenario runs of one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationTestResult {
    /// Organization name.
    pub organization: String,
    /// Scenario runs keyed by `environment/suite/scenario`.
    pub scenarios: BTreeMap<String, ScenarioRecord>,
    /// Validation results keyed like `scenarios`.
    pub validation_results: BTreeMap<String, Vec<ValidationResult>>,
    /// Compliance outcome, when a compliance suite or validation ran.
    pub compliance_results: Option<ComplianceResult>,
    /// Chaos counters, when a chaos suite ran with fault injection.
    pub chaos_metrics: Option<ChaosMetrics>,
    /// Derived metrics.
    pub metrics: OrganizationMetrics,
    /// Verdict.
    pub status: OrganizationStatus,
    /// Suite-level errors.
    pub errors: Vec<String>,
}

impl OrganizationTestResult {
    /// Empty result for an organization that has not run anything yet.
    pub fn new(organization: &str) -> Self {
        Self {
            organization: organization.to_string(),
            scenarios: BTreeMap::new(),
            validation_results: BTreeMap::new(),
            compliance_results: None,
            chaos_metrics: None,
            metrics: OrganizationMetrics::default(),
            status: OrganizationStatus::Failed,
            errors: Vec::new(),
        }
    }
}

/// Cross-organization aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallMetrics {
    /// Organizations in the run.
    pub total_organizations: usize,
    /// Organizations with status `passed`.
    pub passed_organizations: usize,
    /// Scenarios executed across organizations.
    pub total_scenarios: usize,
    /// Successful scenarios across organizations.
    pub successful_scenarios: usize,
    /// Success percentage across organizations.
    pub success_rate: f64,
    /// Mean scorecard score.
    pub performance_score: f64,
    /// Mean compliance score.
    pub compliance_score: f64,
    /// SLA compliance across all executions.
    pub sla_compliance: f64,
    /// Mean deployment time in milliseconds.
    pub average_deployment_ms: f64,
    /// Mean rollback time in milliseconds.
    pub average_rollback_ms: f64,
    /// Sum of cost estimates.
    pub total_cost: f64,
    /// Critical issues reported by pipelines.
    pub critical_issues: usize,
}

/// Graded verdict of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    /// Whether the run as a whole succeeded.
    pub overall_success: bool,
    /// Grade of the performance score.
    pub performance_grade: Grade,
    /// Grade of the compliance score.
    pub compliance_grade: Grade,
    /// Grade of SLA compliance.
    pub reliability_grade: Grade,
    /// Issues blocking a release.
    pub critical_blockers: Vec<String>,
    /// Whether the system is fit for production.
    pub ready_for_production: bool,
    /// Recommended next steps.
    pub next_steps: Vec<String>,
}

/// How much detail the reports carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportingLevel {
    /// Headline figures only
    Minimal,
    /// Headline figures and per-scenario tables
    #[default]
    Standard,
    /// Everything, including individual validation failures
    Detailed,
}

/// The three Markdown reports of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationReports {
    /// Grades, blockers, next steps, per-organization verdicts.
    pub executive: String,
    /// Per-scenario detail, resource and cost figures.
    pub technical: String,
    /// Per-organization violations and requirement status.
    pub compliance: String,
}

/// Top-level result of one orchestration run; immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    /// Run identifier.
    pub execution_id: ExecutionId,
    /// Unix timestamp (ms) at start.
    pub started_at_ms: u64,
    /// Unix timestamp (ms) at completion.
    pub completed_at_ms: u64,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Terminal status.
    pub status: OrchestrationStatus,
    /// Per-organization results.
    pub organization_results: BTreeMap<String, OrganizationTestResult>,
    /// Cross-organization aggregates.
    pub overall: OverallMetrics,
    /// Graded verdict.
    pub summary: ExecutionSummary,
    /// Markdown reports.
    pub reports: OrchestrationReports,
}
