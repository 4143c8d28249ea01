//! Organization compliance profiles.
//!
//! A profile lists requirements. Each scenario run is checked against them
//! (one `compliance` validation per requirement), and the organization-level
//! [`ComplianceResult`] is derived from those per-scenario validations.

use faultline_types::{
    ComplianceResult, PipelineExecution, RequirementStatus, ScenarioDefinition, ScenarioRecord,
    ValidationCheck, ValidationResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single compliance requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceRequirement {
    /// A rollback ran and finished inside the scenario's rollback bound.
    RollbackVerified,
    /// Deployment finished inside the scenario's deployment bound.
    DeploymentWithinEnvelope,
    /// The pipeline reported no critical issues.
    NoCriticalIssues,
    /// The cost estimate is inside the scenario's cost envelope.
    CostWithinBudget,
}

impl ComplianceRequirement {
    /// Stable name, used as the validation description.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceRequirement::RollbackVerified => "rollback_verified",
            ComplianceRequirement::DeploymentWithinEnvelope => "deployment_within_envelope",
            ComplianceRequirement::NoCriticalIssues => "no_critical_issues",
            ComplianceRequirement::CostWithinBudget => "cost_within_budget",
        }
    }

    fn check(
        &self,
        definition: &ScenarioDefinition,
        execution: &PipelineExecution,
        estimated_cost: f64,
    ) -> Result<(), String> {
        let expected = &definition.expected;
        match self {
            ComplianceRequirement::RollbackVerified => match execution.metrics.rollback_time_ms {
                Some(ms) if ms <= expected.max_rollback_ms => Ok(()),
                Some(ms) => Err(format!(
                    "rollback took {}ms (bound {}ms)",
                    ms, expected.max_rollback_ms
                )),
                None => Err("no rollback was performed".to_string()),
            },
            ComplianceRequirement::DeploymentWithinEnvelope => {
                let ms = execution.metrics.deployment_time_ms;
                if ms <= expected.max_deployment_ms {
                    Ok(())
                } else {
                    Err(format!(
                        "deployment took {}ms (bound {}ms)",
                        ms, expected.max_deployment_ms
                    ))
                }
            }
            ComplianceRequirement::NoCriticalIssues => {
                if execution.summary.critical_issues.is_empty() {
                    Ok(())
                } else {
                    Err(execution.summary.critical_issues.join("; "))
                }
            }
            ComplianceRequirement::CostWithinBudget => {
                if expected.cost_within(estimated_cost) {
                    Ok(())
                } else {
                    Err(format!(
                        "cost {:.2} outside {:.2}..={:.2}",
                        estimated_cost, expected.min_cost, expected.max_cost
                    ))
                }
            }
        }
    }
}

impl fmt::Display for ComplianceRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requirements one organization is held to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceProfile {
    /// Requirements, checked in order.
    #[serde(default = "default_requirements")]
    pub requirements: Vec<ComplianceRequirement>,
}

fn default_requirements() -> Vec<ComplianceRequirement> {
    vec![
        ComplianceRequirement::RollbackVerified,
        ComplianceRequirement::NoCriticalIssues,
        ComplianceRequirement::DeploymentWithinEnvelope,
    ]
}

impl Default for ComplianceProfile {
    fn default() -> Self {
        Self {
            requirements: default_requirements(),
        }
    }
}

impl ComplianceProfile {
    /// Profile with an explicit requirement list.
    pub fn new(requirements: Vec<ComplianceRequirement>) -> Self {
        Self { requirements }
    }

    /// One `compliance` validation per requirement for a single scenario run.
    pub fn validate(
        &self,
        definition: &ScenarioDefinition,
        execution: &PipelineExecution,
        estimated_cost: f64,
    ) -> Vec<ValidationResult> {
        self.requirements
            .iter()
            .map(
                |requirement| match requirement.check(definition, execution, estimated_cost) {
                    Ok(()) => ValidationResult::pass(ValidationCheck::Compliance, requirement.as_str()),
                    Err(details) => ValidationResult::fail(
                        ValidationCheck::Compliance,
                        requirement.as_str(),
                        &details,
                    ),
                },
            )
            .collect()
    }

    /// Fold per-scenario compliance validations into an organization verdict.
    ///
    /// A requirement is satisfied when at least one scenario was checked and
    /// every check passed.
    pub fn evaluate<'a, I>(&self, records: I) -> ComplianceResult
    where
        I: IntoIterator<Item = (&'a String, &'a ScenarioRecord)>,
    {
        let records: Vec<(&String, &ScenarioRecord)> = records.into_iter().collect();
        let mut result = ComplianceResult::default();

        for requirement in &self.requirements {
            let name = requirement.as_str();
            let mut checked = 0usize;
            let mut failures = Vec::new();

            for (key, record) in &records {
                for validation in record.validations.iter().filter(|v| {
                    v.check == ValidationCheck::Compliance && v.description == name
                }) {
                    checked += 1;
                    if !validation.passed {
                        let details = validation.failure_details.as_deref().unwrap_or("failed");
                        failures.push(format!("{}: {}: {}", name, key, details));
                    }
                }
            }

            let (satisfied, detail) = if checked == 0 {
                (false, "no scenario executions to evaluate".to_string())
            } else if failures.is_empty() {
                (true, format!("{} of {} checks passed", checked, checked))
            } else {
                (
                    false,
                    format!("{} of {} checks failed", failures.len(), checked),
                )
            };

            if checked == 0 {
                result.violations.push(format!("{}: {}", name, detail));
            }
            result.violations.extend(failures);
            result.requirements.push(RequirementStatus {
                requirement: name.to_string(),
                satisfied,
                detail,
            });
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_types::{ExpectedBehavior, PipelineMetrics, PipelineSummary, Scorecard, TestSuite};
    use std::collections::BTreeMap;

    fn definition() -> ScenarioDefinition {
        ScenarioDefinition {
            name: "static-site".into(),
            organization: "acme".into(),
            complexity: faultline_types::Complexity::Simple,
            configuration: BTreeMap::new(),
            expected: ExpectedBehavior {
                min_cost: 5.0,
                max_cost: 50.0,
                max_deployment_ms: 30_000,
                max_rollback_ms: 15_000,
            },
        }
    }

    fn execution(deploy: u64, rollback: Option<u64>) -> PipelineExecution {
        PipelineExecution {
            scenario: "static-site".into(),
            metrics: PipelineMetrics {
                deployment_time_ms: deploy,
                rollback_time_ms: rollback,
                resources_created: 2,
            },
            scorecard: Scorecard { overall: 90.0 },
            summary: PipelineSummary {
                overall_success: true,
                ..Default::default()
            },
        }
    }

    fn record(validations: Vec<ValidationResult>) -> ScenarioRecord {
        ScenarioRecord {
            environment: "staging".into(),
            suite: TestSuite::Smoke,
            session_index: 0,
            execution: execution(10_000, Some(5_000)),
            validations,
            estimated_cost: 10.0,
            observed_duration_ms: None,
            network: None,
        }
    }

    #[test]
    fn default_profile_requirements() {
        let profile = ComplianceProfile::default();
        assert_eq!(profile.requirements.len(), 3);
        assert!(profile
            .requirements
            .contains(&ComplianceRequirement::RollbackVerified));
    }

    #[test]
    fn validate_passes_within_envelope() {
        let profile = ComplianceProfile::default();
        let results = profile.validate(&definition(), &execution(10_000, Some(5_000)), 10.0);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.passed));
        assert!(results.iter().all(|r| r.check == ValidationCheck::Compliance));
    }

    #[test]
    fn missing_rollback_violates() {
        let profile = ComplianceProfile::new(vec![ComplianceRequirement::RollbackVerified]);
        let results = profile.validate(&definition(), &execution(10_000, None), 10.0);
        assert!(!results[0].passed);
        assert_eq!(
            results[0].failure_details.as_deref(),
            Some("no rollback was performed")
        );
    }

    #[test]
    fn cost_outside_budget_violates() {
        let profile = ComplianceProfile::new(vec![ComplianceRequirement::CostWithinBudget]);
        let results = profile.validate(&definition(), &execution(10_000, Some(5_000)), 75.0);
        assert!(!results[0].passed);
    }

    #[test]
    fn evaluate_folds_scenario_checks() {
        let profile = ComplianceProfile::new(vec![
            ComplianceRequirement::RollbackVerified,
            ComplianceRequirement::NoCriticalIssues,
        ]);
        let mut records = BTreeMap::new();
        records.insert(
            "staging/smoke/a".to_string(),
            record(vec![
                ValidationResult::pass(ValidationCheck::Compliance, "rollback_verified"),
                ValidationResult::pass(ValidationCheck::Compliance, "no_critical_issues"),
            ]),
        );
        records.insert(
            "staging/smoke/b".to_string(),
            record(vec![
                ValidationResult::fail(
                    ValidationCheck::Compliance,
                    "rollback_verified",
                    "no rollback was performed",
                ),
                ValidationResult::pass(ValidationCheck::Compliance, "no_critical_issues"),
            ]),
        );

        let result = profile.evaluate(&records);
        assert_eq!(result.requirements.len(), 2);
        assert!(!result.requirements[0].satisfied);
        assert!(result.requirements[1].satisfied);
        assert_eq!(result.score(), 50.0);
        assert_eq!(result.violations.len(), 1);
        assert!(result.violations[0].contains("staging/smoke/b"));
    }

    #[test]
    fn evaluate_without_records_is_unsatisfied() {
        let profile = ComplianceProfile::default();
        let records: BTreeMap<String, ScenarioRecord> = BTreeMap::new();
        let result = profile.evaluate(&records);
        assert!(result.requirements.iter().all(|r| !r.satisfied));
        assert_eq!(result.score(), 0.0);
    }

    #[test]
    fn profile_deserializes_with_default_requirements() {
        let profile: ComplianceProfile = serde_json::from_str("{}").unwrap();
        assert_eq!(profile, ComplianceProfile::default());
    }
}
