//! Hybrid test coordination.
//!
//! The [`TestCoordinator`] runs up to four test categories side by side and
//! folds them into one [`UnifiedResult`]:
//!
//! | Category | Runs through |
//! |----------|--------------|
//! | `infrastructure` | the [`ExecutionOrchestrator`] |
//! | `api_validation` | an injected [`CategoryRunner`] |
//! | `scenario_coordination` | an injected [`CategoryRunner`] |
//! | `chaos` | the coordinator's own [`FailureInjector`] probing the system's interceptor |
//!
//! Categories that were not requested are left out of the summary and the
//! grade.

use async_trait::async_trait;
use faultline_chaos::FailureInjector;
use faultline_core::{grade_for_score, percentage, safe_average, DynRng};
use faultline_sut::OutboundRequest;
use faultline_types::{
    ChaosConfig, ChaosMetrics, Grade, OrchestrationResult, SessionId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::Instant;

use crate::config::OrchestrationConfig;
use crate::error::{CoordinatorError, CoordinatorResult, OrchestrationError};
use crate::orchestrator::ExecutionOrchestrator;

/// Category name of orchestrated infrastructure tests.
pub const INFRASTRUCTURE: &str = "infrastructure";
/// Category name of API validation tests.
pub const API_VALIDATION: &str = "api_validation";
/// Category name of scenario coordination tests.
pub const SCENARIO_COORDINATION: &str = "scenario_coordination";
/// Category name of chaos probes.
pub const CHAOS: &str = "chaos";

/// Fewer tests than this triggers a coverage recommendation.
const MIN_TOTAL_TESTS: usize = 10;
/// Failure share (percent) above which failures need investigating.
const MAX_FAILURE_RATE: f64 = 10.0;
/// Total duration above which a speed-up is recommended.
const MAX_DURATION_MS: u64 = 30 * 60 * 1000;
/// Probe requests sent through the interceptor while chaos is active.
const DEFAULT_CHAOS_PROBES: usize = 100;

/// An open coordinator session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSession {
    /// Session identity.
    pub id: SessionId,
    /// Human-readable name.
    pub name: String,
    /// Environment under test.
    pub environment: String,
    /// Unix timestamp (ms) when the session was opened.
    pub started_at_ms: u64,
}

/// Outcome of one test category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    /// Tests run.
    pub total: usize,
    /// Tests that passed.
    pub passed: usize,
    /// Tests that failed.
    pub failed: usize,
    /// Tests skipped.
    pub skipped: usize,
    /// Time spent, in milliseconds.
    pub duration_ms: u64,
    /// Errors worth surfacing.
    pub errors: Vec<String>,
}

impl CategoryResult {
    /// Pass rate as a percentage; 0 when nothing ran.
    pub fn score(&self) -> f64 {
        percentage(self.passed, self.total)
    }

    /// Grade of the pass rate.
    pub fn grade(&self) -> Grade {
        grade_for_score(self.score())
    }

    /// Result for a category that could not run at all.
    pub fn skipped(reason: &str) -> Self {
        Self {
            skipped: 1,
            errors: vec![reason.to_string()],
            ..Default::default()
        }
    }
}

/// Runs one category of tests for a session.
#[async_trait]
pub trait CategoryRunner: Send + Sync {
    /// Run the category.
    async fn run(&self, session: &TestSession) -> CategoryResult;
}

/// Which categories to run.
#[derive(Debug, Clone, Default)]
pub struct HybridTestRequest {
    /// Orchestrated infrastructure tests.
    pub infrastructure: Option<OrchestrationConfig>,
    /// API validation through the configured runner.
    pub api_validation: bool,
    /// Scenario coordination through the configured runner.
    pub scenario_coordination: bool,
    /// Fault injection probed through the system's interceptor.
    pub chaos: Option<ChaosConfig>,
    /// Probe requests while chaos is active (default: 100).
    pub chaos_probes: Option<usize>,
}

/// Totals across categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// Tests run.
    pub total: usize,
    /// Tests that passed.
    pub passed: usize,
    /// Tests that failed.
    pub failed: usize,
    /// Tests skipped.
    pub skipped: usize,
}

/// Unified outcome of a hybrid run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedResult {
    /// Session the run belonged to.
    pub session: TestSession,
    /// Per-category outcomes of the categories that ran.
    pub categories: BTreeMap<String, CategoryResult>,
    /// Full orchestration result, when infrastructure tests ran.
    pub orchestration: Option<OrchestrationResult>,
    /// Chaos counters, when chaos probes ran.
    pub chaos_metrics: Option<ChaosMetrics>,
    /// Totals.
    pub summary: CategorySummary,
    /// Mean score of the categories that ran tests.
    pub overall_score: f64,
    /// Grade of the overall score.
    pub grade: Grade,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Follow-up suggestions.
    pub recommendations: Vec<String>,
}

/// Coordinates hybrid test runs for one session at a time.
pub struct TestCoordinator {
    orchestrator: Arc<ExecutionOrchestrator>,
    injector: FailureInjector,
    api_runner: Option<Arc<dyn CategoryRunner>>,
    scenario_runner: Option<Arc<dyn CategoryRunner>>,
    session: Mutex<Option<TestSession>>,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl TestCoordinator {
    /// Coordinator over an orchestrator; chaos probes draw from `rng`.
    pub fn new(orchestrator: Arc<ExecutionOrchestrator>, rng: DynRng) -> Self {
        let system = orchestrator.system();
        let injector = FailureInjector::new(system.interceptor(), system.pressure(), rng);
        Self {
            orchestrator,
            injector,
            api_runner: None,
            scenario_runner: None,
            session: Mutex::new(None),
        }
    }

    /// Runner for the API validation category.
    pub fn with_api_runner(mut self, runner: Arc<dyn CategoryRunner>) -> Self {
        self.api_runner = Some(runner);
        self
    }

    /// Runner for the scenario coordination category.
    pub fn with_scenario_runner(mut self, runner: Arc<dyn CategoryRunner>) -> Self {
        self.scenario_runner = Some(runner);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Option<TestSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The open session, if any.
    pub fn session(&self) -> Option<TestSession> {
        self.lock().clone()
    }

    /// Open a session.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::SessionActive`] if one is already open.
    pub fn initialize_session(&self, name: &str, environment: &str) -> CoordinatorResult<SessionId> {
        let mut slot = self.lock();
        if let Some(active) = slot.as_ref() {
            return Err(CoordinatorError::SessionActive(active.id.to_string()));
        }
        let session = TestSession {
            id: SessionId::new(),
            name: name.to_string(),
            environment: environment.to_string(),
            started_at_ms: now_ms(),
        };
        tracing::info!(session = %session.id, name, environment, "Test session initialized");
        let id = session.id;
        *slot = Some(session);
        Ok(id)
    }

    /// Run the requested categories concurrently and unify their results.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::NoSession`] without an open session, and
    /// [`CoordinatorError::Orchestration`] if the infrastructure config is
    /// rejected. Fatal orchestration failures are reported as a failed
    /// category.
    pub async fn execute_hybrid_tests(
        &self,
        request: HybridTestRequest,
    ) -> CoordinatorResult<UnifiedResult> {
        let session = self.session().ok_or(CoordinatorError::NoSession)?;
        let started = Instant::now();
        tracing::info!(
            session = %session.id,
            infrastructure = request.infrastructure.is_some(),
            api_validation = request.api_validation,
            scenario_coordination = request.scenario_coordination,
            chaos = request.chaos.is_some(),
            "Hybrid test run started"
        );

        let infrastructure = async {
            match request.infrastructure.clone() {
                Some(config) => Some(self.run_infrastructure(config).await),
                None => None,
            }
        };
        let api = async {
            if request.api_validation {
                Some(Self::run_category(self.api_runner.as_ref(), API_VALIDATION, &session).await)
            } else {
                None
            }
        };
        let scenarios = async {
            if request.scenario_coordination {
                Some(
                    Self::run_category(
                        self.scenario_runner.as_ref(),
                        SCENARIO_COORDINATION,
                        &session,
                    )
                    .await,
                )
            } else {
                None
            }
        };
        let chaos = async {
            match request.chaos.clone() {
                Some(config) => Some(
                    self.run_chaos(config, request.chaos_probes.unwrap_or(DEFAULT_CHAOS_PROBES))
                        .await,
                ),
                None => None,
            }
        };

        let (infrastructure, api, scenarios, chaos) =
            tokio::join!(infrastructure, api, scenarios, chaos);

        let mut categories = BTreeMap::new();
        let mut orchestration = None;
        if let Some(outcome) = infrastructure {
            let (category, result) = outcome?;
            categories.insert(INFRASTRUCTURE.to_string(), category);
            orchestration = Some(result);
        }
        if let Some(category) = api {
            categories.insert(API_VALIDATION.to_string(), category);
        }
        if let Some(category) = scenarios {
            categories.insert(SCENARIO_COORDINATION.to_string(), category);
        }
        let mut chaos_metrics = None;
        if let Some((category, metrics)) = chaos {
            categories.insert(CHAOS.to_string(), category);
            chaos_metrics = Some(metrics);
        }

        let summary = categories.values().fold(CategorySummary::default(), |mut acc, c| {
            acc.total += c.total;
            acc.passed += c.passed;
            acc.failed += c.failed;
            acc.skipped += c.skipped;
            acc
        });
        let scores: Vec<f64> = categories
            .values()
            .filter(|c| c.total > 0)
            .map(CategoryResult::score)
            .collect();
        let overall_score = safe_average(&scores);

        let mut result = UnifiedResult {
            session,
            categories,
            orchestration,
            chaos_metrics,
            summary,
            overall_score,
            grade: grade_for_score(overall_score),
            duration_ms: started.elapsed().as_millis() as u64,
            recommendations: Vec::new(),
        };
        result.recommendations = generate_recommendations(&result);

        tracing::info!(
            session = %result.session.id,
            total = result.summary.total,
            passed = result.summary.passed,
            failed = result.summary.failed,
            grade = %result.grade,
            "Hybrid test run finished"
        );
        Ok(result)
    }

    async fn run_category(
        runner: Option<&Arc<dyn CategoryRunner>>,
        name: &str,
        session: &TestSession,
    ) -> CategoryResult {
        match runner {
            Some(runner) => {
                let started = Instant::now();
                let mut result = runner.run(session).await;
                if result.duration_ms == 0 {
                    result.duration_ms = started.elapsed().as_millis() as u64;
                }
                result
            }
            None => {
                tracing::warn!(category = name, "No runner configured, skipping category");
                CategoryResult::skipped("no runner configured")
            }
        }
    }

    async fn run_infrastructure(
        &self,
        config: OrchestrationConfig,
    ) -> CoordinatorResult<(CategoryResult, OrchestrationResult)> {
        let result = match self.orchestrator.execute(config).await {
            Ok(result) => result,
            Err(OrchestrationError::Fatal { reason, result }) => {
                tracing::warn!(%reason, "Infrastructure tests failed during setup");
                *result
            }
            Err(e) => return Err(e.into()),
        };

        let total = result.overall.total_scenarios;
        let passed = result.overall.successful_scenarios;
        let category = CategoryResult {
            total,
            passed,
            failed: total - passed,
            skipped: 0,
            duration_ms: result.duration_ms,
            errors: result.summary.critical_blockers.clone(),
        };
        Ok((category, result))
    }

    /// Start the injector, push probes through the interceptor, stop it and
    /// confirm the system answers cleanly again.
    async fn run_chaos(&self, config: ChaosConfig, probes: usize) -> (CategoryResult, ChaosMetrics) {
        let started = Instant::now();
        let system = self.orchestrator.system();
        let organization = config.target.clone();
        let probe = |i: usize| {
            let request = OutboundRequest::new("GET", &format!("/api/probe/{}", i));
            match &organization {
                Some(org) => request.for_organization(org),
                None => request,
            }
        };

        let status = self.injector.start(config).await;
        let mut errors: Vec<String> = status
            .results
            .iter()
            .flat_map(|r| r.errors.iter().map(move |e| format!("{}: {}", r.scenario, e)))
            .collect();

        let mut passed = 0;
        for i in 0..probes {
            if !system.dispatch(probe(i)).await.is_failure() {
                passed += 1;
            }
        }

        let metrics = self.injector.stop().await;
        if system.dispatch(probe(probes)).await.is_failure() {
            errors.push("system did not recover after chaos stopped".to_string());
        }
        if let Err(e) = self.injector.reset() {
            tracing::warn!(error = %e, "Failed to reset chaos counters");
        }

        tracing::info!(
            probes,
            passed,
            failures_injected = metrics.failures_injected,
            "Chaos probes finished"
        );
        (
            CategoryResult {
                total: probes,
                passed,
                failed: probes - passed,
                skipped: 0,
                duration_ms: started.elapsed().as_millis() as u64,
                errors,
            },
            metrics,
        )
    }

    /// Close the session and stop any fault injection. Safe to call at any time.
    pub async fn cleanup_session(&self) {
        if self.injector.is_active() {
            self.injector.stop().await;
        }
        let closed = self.lock().take();
        match closed {
            Some(session) => tracing::info!(session = %session.id, "Test session closed"),
            None => tracing::debug!("No test session to close"),
        }
    }
}

/// Follow-up suggestions for a unified result.
pub fn generate_recommendations(result: &UnifiedResult) -> Vec<String> {
    let mut recommendations = Vec::new();
    let summary = &result.summary;

    if summary.total < MIN_TOTAL_TESTS {
        recommendations.push(format!(
            "Increase test coverage: only {} tests executed",
            summary.total
        ));
    }
    let failure_rate = percentage(summary.failed, summary.total);
    if failure_rate > MAX_FAILURE_RATE {
        recommendations.push(format!(
            "Investigate failures: {:.1}% of tests failed",
            failure_rate
        ));
    }
    for (name, category) in &result.categories {
        if category.total == 0 {
            continue;
        }
        let grade = category.grade();
        if matches!(grade, Grade::C | Grade::D | Grade::F) {
            recommendations.push(format!(
                "Improve {} results (grade {}, {:.1}% passed)",
                name,
                grade,
                category.score()
            ));
        }
    }
    if result.duration_ms > MAX_DURATION_MS {
        recommendations.push(format!(
            "Reduce total test duration ({} minutes); parallelize the slowest categories",
            result.duration_ms / 60_000
        ));
    }
    recommendations
}

/// Markdown report of a unified result.
pub fn unified_report(result: &UnifiedResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Unified Test Report");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Session `{}` ({}, {})",
        result.session.name, result.session.environment, result.session.id
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "**Grade {}** ({:.1}) - {} tests, {} passed, {} failed, {} skipped",
        result.grade,
        result.overall_score,
        result.summary.total,
        result.summary.passed,
        result.summary.failed,
        result.summary.skipped
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "## Categories");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Category | Total | Passed | Failed | Skipped | Grade |");
    let _ = writeln!(out, "|----------|-------|--------|--------|---------|-------|");
    for (name, category) in &result.categories {
        let grade = if category.total == 0 {
            "-".to_string()
        } else {
            category.grade().to_string()
        };
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} |",
            name, category.total, category.passed, category.failed, category.skipped, grade
        );
    }

    if let Some(metrics) = &result.chaos_metrics {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Chaos");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} faults installed, {} failures injected, {} critical, {} recoveries",
            metrics.scenarios_executed,
            metrics.failures_injected,
            metrics.critical_failures,
            metrics.system_recoveries
        );
    }

    let errors: Vec<(&String, &String)> = result
        .categories
        .iter()
        .flat_map(|(name, c)| c.errors.iter().map(move |e| (name, e)))
        .collect();
    if !errors.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Errors");
        let _ = writeln!(out);
        for (name, error) in errors {
            let _ = writeln!(out, "- {}: {}", name, error);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Recommendations");
    let _ = writeln!(out);
    if result.recommendations.is_empty() {
        let _ = writeln!(out, "- None");
    }
    for recommendation in &result.recommendations {
        let _ = writeln!(out, "- {}", recommendation);
    }
    out
}
