//! Markdown reports built from an aggregated result.
//!
//! Rendering is a pure function of the [`OrchestrationResult`]: the same
//! result always yields byte-identical reports. Section headers are fixed.

use faultline_types::{OrchestrationReports, OrchestrationResult, ReportingLevel};
use std::fmt::Write;

/// Render all three reports.
pub fn render_reports(result: &OrchestrationResult, level: ReportingLevel) -> OrchestrationReports {
    OrchestrationReports {
        executive: executive_report(result),
        technical: technical_report(result, level),
        compliance: compliance_report(result, level),
    }
}

fn bullet_list(out: &mut String, items: &[String], empty: &str) {
    if items.is_empty() {
        let _ = writeln!(out, "- {}", empty);
    } else {
        for item in items {
            let _ = writeln!(out, "- {}", item);
        }
    }
}

/// Grades, blockers, next steps, per-organization verdicts.
pub fn executive_report(result: &OrchestrationResult) -> String {
    let summary = &result.summary;
    let overall = &result.overall;
    let mut out = String::new();

    let _ = writeln!(out, "# Executive Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Execution: {}", result.execution_id);
    let _ = writeln!(out, "- Status: {}", result.status);
    let _ = writeln!(out, "- Duration: {}ms", result.duration_ms);
    let _ = writeln!(out, "- Overall success: {}", summary.overall_success);
    let _ = writeln!(out, "- Ready for production: {}", summary.ready_for_production);
    let _ = writeln!(out);

    let _ = writeln!(out, "## Grades");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Area | Score | Grade |");
    let _ = writeln!(out, "|------|-------|-------|");
    let _ = writeln!(
        out,
        "| Performance | {:.1} | {} |",
        overall.performance_score, summary.performance_grade
    );
    let _ = writeln!(
        out,
        "| Compliance | {:.1} | {} |",
        overall.compliance_score, summary.compliance_grade
    );
    let _ = writeln!(
        out,
        "| Reliability | {:.1} | {} |",
        overall.sla_compliance, summary.reliability_grade
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## Critical Blockers");
    let _ = writeln!(out);
    bullet_list(&mut out, &summary.critical_blockers, "None");
    let _ = writeln!(out);

    let _ = writeln!(out, "## Next Steps");
    let _ = writeln!(out);
    bullet_list(&mut out, &summary.next_steps, "None");
    let _ = writeln!(out);

    let _ = writeln!(out, "## Organizations");
    let _ = writeln!(out);
    if result.organization_results.is_empty() {
        let _ = writeln!(out, "- None");
    }
    for (name, org) in &result.organization_results {
        let _ = writeln!(
            out,
            "- {}: {} ({}/{} scenarios, {:.1}% success)",
            name,
            org.status,
            org.metrics.successful_scenarios,
            org.metrics.total_scenarios,
            org.metrics.success_rate
        );
    }

    out
}

/// Per-scenario detail, resource and cost figures.
pub fn technical_report(result: &OrchestrationResult, level: ReportingLevel) -> String {
    let overall = &result.overall;
    let mut out = String::new();

    let _ = writeln!(out, "# Technical Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Scenarios: {}", overall.total_scenarios);
    let _ = writeln!(out, "- Successful: {}", overall.successful_scenarios);
    let _ = writeln!(out, "- Success rate: {:.1}%", overall.success_rate);
    let _ = writeln!(out, "- SLA compliance: {:.1}%", overall.sla_compliance);
    let _ = writeln!(out, "- Average deployment: {:.0}ms", overall.average_deployment_ms);
    let _ = writeln!(out, "- Average rollback: {:.0}ms", overall.average_rollback_ms);
    let _ = writeln!(out, "- Total cost: {:.2}", overall.total_cost);

    if level == ReportingLevel::Minimal {
        return out;
    }

    for (name, org) in &result.organization_results {
        let _ = writeln!(out);
        let _ = writeln!(out, "## {}", name);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "| Scenario | Success | Deploy (ms) | Rollback (ms) | Resources | Score | Cost |"
        );
        let _ = writeln!(
            out,
            "|----------|---------|-------------|---------------|-----------|-------|------|"
        );
        for (key, record) in &org.scenarios {
            let metrics = &record.execution.metrics;
            let rollback = metrics
                .rollback_time_ms
                .map_or_else(|| "-".to_string(), |ms| ms.to_string());
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {:.1} | {:.2} |",
                key,
                record.succeeded(),
                metrics.deployment_time_ms,
                rollback,
                metrics.resources_created,
                record.execution.scorecard.overall,
                record.estimated_cost
            );
        }

        if let Some(chaos) = &org.chaos_metrics {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "Chaos: {} scenarios, {} failures injected, {} recoveries, {} degradations, {} critical",
                chaos.scenarios_executed,
                chaos.failures_injected,
                chaos.system_recoveries,
                chaos.degradation_events,
                chaos.critical_failures
            );
        }

        if level == ReportingLevel::Detailed {
            let failures: Vec<String> = org
                .scenarios
                .iter()
                .flat_map(|(key, record)| {
                    record.validations.iter().filter(|v| !v.passed).map(move |v| {
                        format!(
                            "{} [{}] {}: {}",
                            key,
                            v.check,
                            v.description,
                            v.failure_details.as_deref().unwrap_or("failed")
                        )
                    })
                })
                .collect();
            let _ = writeln!(out);
            let _ = writeln!(out, "### Validation Failures");
            let _ = writeln!(out);
            bullet_list(&mut out, &failures, "None");
        }
    }

    out
}

/// Per-organization violations and requirement status.
pub fn compliance_report(result: &OrchestrationResult, level: ReportingLevel) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Compliance Report");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "- Compliance score: {:.1} ({})",
        result.overall.compliance_score, result.summary.compliance_grade
    );

    for (name, org) in &result.organization_results {
        let _ = writeln!(out);
        let _ = writeln!(out, "## {}", name);
        let _ = writeln!(out);
        match &org.compliance_results {
            None => {
                let _ = writeln!(out, "- Not evaluated");
            }
            Some(compliance) => {
                let _ = writeln!(out, "### Violations");
                let _ = writeln!(out);
                bullet_list(&mut out, &compliance.violations, "None");

                if level != ReportingLevel::Minimal {
                    let _ = writeln!(out);
                    let _ = writeln!(out, "### Requirements");
                    let _ = writeln!(out);
                    let _ = writeln!(out, "| Requirement | Satisfied | Detail |");
                    let _ = writeln!(out, "|-------------|-----------|--------|");
                    for req in &compliance.requirements {
                        let _ = writeln!(
                            out,
                            "| {} | {} | {} |",
                            req.requirement, req.satisfied, req.detail
                        );
                    }
                }
            }
        }
    }

    out
}
