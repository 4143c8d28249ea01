//! Zero-guarded aggregation of scenario outcomes.
//!
//! Every average and percentage here returns 0 for an empty input rather than
//! NaN, so an organization that executed nothing still produces a clean,
//! serializable result.

use faultline_types::{
    ExecutionSummary, OrganizationMetrics, OrganizationStatus, OrganizationTestResult,
    OverallMetrics, ScenarioRecord, ValidationCheck,
};
use std::collections::BTreeMap;

use crate::grading::{grade_for_score, SlaThresholds};

/// Success rate an organization needs to pass.
pub const PASSING_SUCCESS_RATE: f64 = 90.0;
/// SLA compliance required for production readiness.
pub const PRODUCTION_SLA_COMPLIANCE: f64 = 95.0;

/// Mean of `values`; 0 for an empty slice.
pub fn safe_average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `part / total` as a percentage; 0 when `total` is 0.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

/// Whether a scenario run met the SLA.
///
/// The recorded `sla` validation wins when present; otherwise the thresholds
/// are applied to the raw metrics.
fn meets_sla(record: &ScenarioRecord, sla: &SlaThresholds) -> bool {
    record
        .validations
        .iter()
        .find(|v| v.check == ValidationCheck::Sla)
        .map_or_else(|| sla.meets(&record.execution.metrics), |v| v.passed)
}

/// Derived metrics over one organization's scenario runs.
pub fn organization_metrics<'a, I>(records: I, sla: &SlaThresholds) -> OrganizationMetrics
where
    I: IntoIterator<Item = &'a ScenarioRecord>,
{
    let records: Vec<&ScenarioRecord> = records.into_iter().collect();
    let total = records.len();
    let successful = records.iter().filter(|r| r.succeeded()).count();
    let within_sla = records.iter().filter(|r| meets_sla(r, sla)).count();

    let scores: Vec<f64> = records.iter().map(|r| r.execution.scorecard.overall).collect();
    let deployments: Vec<f64> = records
        .iter()
        .map(|r| r.execution.metrics.deployment_time_ms as f64)
        .collect();
    let rollbacks: Vec<f64> = records
        .iter()
        .filter_map(|r| r.execution.metrics.rollback_time_ms)
        .map(|ms| ms as f64)
        .collect();

    OrganizationMetrics {
        total_scenarios: total,
        successful_scenarios: successful,
        success_rate: percentage(successful, total),
        average_score: safe_average(&scores),
        average_deployment_ms: safe_average(&deployments),
        average_rollback_ms: safe_average(&rollbacks),
        sla_compliance: percentage(within_sla, total),
        cost_total: records.iter().map(|r| r.estimated_cost).sum(),
    }
}

/// Verdict for one organization from its metrics, validations and errors.
pub fn organization_status(result: &OrganizationTestResult) -> OrganizationStatus {
    if !result.errors.is_empty() {
        return OrganizationStatus::Failed;
    }

    let validations_passed = result
        .scenarios
        .values()
        .all(|record| record.all_validations_passed())
        && result
            .compliance_results
            .as_ref()
            .map_or(true, |c| c.violations.is_empty());

    if result.metrics.total_scenarios > 0
        && result.metrics.success_rate >= PASSING_SUCCESS_RATE
        && validations_passed
    {
        OrganizationStatus::Passed
    } else if result.metrics.successful_scenarios > 0 {
        OrganizationStatus::Partial
    } else {
        OrganizationStatus::Failed
    }
}

/// Compliance score of one organization.
///
/// Uses the compliance result when one was computed, otherwise the share of
/// passed validations, otherwise 0.
pub fn organization_compliance_score(result: &OrganizationTestResult) -> f64 {
    if let Some(compliance) = &result.compliance_results {
        return compliance.score();
    }
    let validations: Vec<bool> = result
        .scenarios
        .values()
        .flat_map(|record| record.validations.iter().map(|v| v.passed))
        .collect();
    percentage(validations.iter().filter(|p| **p).count(), validations.len())
}

/// Cross-organization aggregates.
pub fn overall_metrics(
    organizations: &BTreeMap<String, OrganizationTestResult>,
    sla: &SlaThresholds,
) -> OverallMetrics {
    let records: Vec<&ScenarioRecord> = organizations
        .values()
        .flat_map(|org| org.scenarios.values())
        .collect();
    let combined = organization_metrics(records.iter().copied(), sla);

    let compliance_scores: Vec<f64> = organizations
        .values()
        .map(organization_compliance_score)
        .collect();

    OverallMetrics {
        total_organizations: organizations.len(),
        passed_organizations: organizations
            .values()
            .filter(|org| org.status == OrganizationStatus::Passed)
            .count(),
        total_scenarios: combined.total_scenarios,
        successful_scenarios: combined.successful_scenarios,
        success_rate: combined.success_rate,
        performance_score: combined.average_score,
        compliance_score: safe_average(&compliance_scores),
        sla_compliance: combined.sla_compliance,
        average_deployment_ms: combined.average_deployment_ms,
        average_rollback_ms: combined.average_rollback_ms,
        total_cost: combined.cost_total,
        critical_issues: records
            .iter()
            .map(|r| r.execution.summary.critical_issues.len())
            .sum(),
    }
}

/// Grade the run and collect blockers and next steps.
///
/// `run_blockers` carries run-level problems (cancellation, timeout, setup
/// failure). Any blocker, run-level or per organization, and any failed
/// organization prevents overall success.
pub fn summarize(
    overall: &OverallMetrics,
    organizations: &BTreeMap<String, OrganizationTestResult>,
    run_blockers: &[String],
) -> ExecutionSummary {
    let performance_grade = grade_for_score(overall.performance_score);
    let compliance_grade = grade_for_score(overall.compliance_score);
    let reliability_grade = grade_for_score(overall.sla_compliance);

    let no_failing_grade = [performance_grade, compliance_grade, reliability_grade]
        .iter()
        .all(|g| *g != faultline_types::Grade::F);

    let mut critical_blockers: Vec<String> = run_blockers.to_vec();
    for (name, org) in organizations {
        for error in &org.errors {
            critical_blockers.push(format!("{}: {}", name, error));
        }
        for (key, record) in &org.scenarios {
            for issue in &record.execution.summary.critical_issues {
                critical_blockers.push(format!("{}/{}: {}", name, key, issue));
            }
        }
    }
    let failed_organizations: Vec<&str> = organizations
        .iter()
        .filter(|(_, org)| org.status == OrganizationStatus::Failed)
        .map(|(name, _)| name.as_str())
        .collect();

    let overall_success = overall.success_rate >= PASSING_SUCCESS_RATE
        && no_failing_grade
        && overall.critical_issues == 0
        && critical_blockers.is_empty()
        && failed_organizations.is_empty();

    let ready_for_production = overall_success
        && overall.sla_compliance >= PRODUCTION_SLA_COMPLIANCE
        && !performance_grade.is_poor()
        && !compliance_grade.is_poor();

    let mut next_steps = Vec::new();
    if overall.total_scenarios == 0 {
        next_steps.push("No scenarios executed; check the requested suites and catalog".to_string());
    }
    if overall.success_rate < PASSING_SUCCESS_RATE && overall.total_scenarios > 0 {
        next_steps.push(format!(
            "Investigate failing scenarios ({:.1}% success, {:.0}% required)",
            overall.success_rate, PASSING_SUCCESS_RATE
        ));
    }
    if overall.sla_compliance < PRODUCTION_SLA_COMPLIANCE {
        next_steps.push(format!(
            "Reduce deployment and rollback times ({:.1}% SLA compliance, {:.0}% required)",
            overall.sla_compliance, PRODUCTION_SLA_COMPLIANCE
        ));
    }
    if compliance_grade.is_poor() {
        next_steps.push("Resolve outstanding compliance violations".to_string());
    }
    if performance_grade.is_poor() {
        next_steps.push("Improve pipeline scorecard results before release".to_string());
    }
    if overall.critical_issues > 0 {
        next_steps.push(format!(
            "Resolve {} critical pipeline issue(s)",
            overall.critical_issues
        ));
    }
    if !failed_organizations.is_empty() {
        next_steps.push(format!(
            "Fix failing organizations: {}",
            failed_organizations.join(", ")
        ));
    }
    if ready_for_production {
        next_steps.push("Proceed with production rollout".to_string());
    }

    ExecutionSummary {
        overall_success,
        performance_grade,
        compliance_grade,
        reliability_grade,
        critical_blockers,
        ready_for_production,
        next_steps,
    }
}
