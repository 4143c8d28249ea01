//! Post-execution checks.
//!
//! Every check produces a [`ValidationResult`]; failures are recorded in the
//! scenario record and never raised.

use faultline_core::{ComplianceProfile, SlaThresholds};
use faultline_sut::SutError;
use faultline_types::{
    BatchOutcome, ExpectedBehavior, PipelineExecution, PipelineMetrics, ScenarioDefinition,
    ValidationCheck, ValidationResult,
};

use crate::error::OrchestrationError;

/// Deployment and rollback times against the SLA thresholds.
pub fn check_sla(metrics: &PipelineMetrics, sla: &SlaThresholds) -> ValidationResult {
    let description = "deployment and rollback within SLA";
    let mut problems = Vec::new();
    if !sla.deployment_ok(metrics) {
        problems.push(format!(
            "deployment took {}ms (limit {}ms)",
            metrics.deployment_time_ms, sla.max_deployment_ms
        ));
    }
    if !sla.rollback_ok(metrics) {
        problems.push(format!(
            "rollback took {}ms (limit {}ms)",
            metrics.rollback_time_ms.unwrap_or_default(),
            sla.max_rollback_ms
        ));
    }

    if problems.is_empty() {
        ValidationResult::pass(ValidationCheck::Sla, description)
    } else {
        ValidationResult::fail(ValidationCheck::Sla, description, &problems.join("; "))
    }
}

/// Outcome of the post-deployment health check.
pub fn check_health(outcome: Result<bool, SutError>) -> ValidationResult {
    let description = "deployment healthy after scenario";
    match outcome {
        Ok(true) => ValidationResult::pass(ValidationCheck::Health, description),
        Ok(false) => ValidationResult::fail(
            ValidationCheck::Health,
            description,
            "deployment reported unhealthy",
        ),
        Err(e) => {
            let err = OrchestrationError::Validation {
                check: ValidationCheck::Health.to_string(),
                reason: e.to_string(),
            };
            tracing::warn!(error = %err, "Health check could not run");
            ValidationResult::fail(ValidationCheck::Health, description, &err.to_string())
        }
    }
}

/// Organization compliance requirements for one scenario run.
pub fn check_compliance(
    profile: &ComplianceProfile,
    scenario: &ScenarioDefinition,
    execution: &PipelineExecution,
    estimated_cost: f64,
) -> Vec<ValidationResult> {
    profile.validate(scenario, execution, estimated_cost)
}

/// Cost estimate against the scenario's envelope.
pub fn check_cost(expected: &ExpectedBehavior, estimated_cost: f64) -> ValidationResult {
    let description = "cost estimate within envelope";
    if expected.cost_within(estimated_cost) {
        ValidationResult::pass(ValidationCheck::Cost, description)
    } else {
        ValidationResult::fail(
            ValidationCheck::Cost,
            description,
            &format!(
                "estimated {:.2}, expected {:.2}..={:.2}",
                estimated_cost, expected.min_cost, expected.max_cost
            ),
        )
    }
}

/// Probe traffic under the simulated network.
pub fn check_network(outcome: &BatchOutcome, min_success_rate: f64) -> ValidationResult {
    let description = "probe traffic under simulated network";
    if outcome.total == 0 {
        return ValidationResult::fail(ValidationCheck::Network, description, "no probe requests sent");
    }
    let rate = outcome.success_rate();
    if rate >= min_success_rate {
        ValidationResult::pass(ValidationCheck::Network, description)
    } else {
        ValidationResult::fail(
            ValidationCheck::Network,
            description,
            &format!(
                "{}/{} probes succeeded ({:.1}%, {:.1}% required)",
                outcome.successful, outcome.total, rate, min_success_rate
            ),
        )
    }
}
