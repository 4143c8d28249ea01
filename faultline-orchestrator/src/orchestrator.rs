//! Execution orchestrator.
//!
//! One run goes through these phases:
//!
//! 1. Validate the configuration.
//! 2. Allocate `parallel_sessions` sessions per organization. This is the
//!    only shared setup; a failure here is fatal.
//! 3. Run organizations concurrently. Each walks its environments and suites
//!    in order; a suite's scenarios are spread round-robin over the
//!    organization's sessions, sessions run concurrently, and each session
//!    runs its scenarios one after another under a per-scenario timeout.
//! 4. Stop at completion, at the run deadline, or on [`cancel`].
//! 5. Tear down (stop fault injection and network simulation, close
//!    sessions), then aggregate, grade and render reports.
//!
//! Scenario records land in a shared progress map as they complete, so a
//! run cut short by its deadline or a cancel still reports what finished.
//! An orchestrator drives one run at a time; a second concurrent
//! [`execute`] is rejected.
//!
//! [`execute`]: ExecutionOrchestrator::execute
//!
//! [`cancel`]: ExecutionOrchestrator::cancel

use dashmap::DashMap;
use faultline_chaos::{profiles, FailureInjector, NetworkConditionSimulator};
use faultline_core::{
    complexity_for_suite, expand_suites, organization_metrics, organization_status,
    overall_metrics, render_reports, rng_from, summarize, ComplianceProfile, ScenarioCatalog,
    SlaThresholds,
};
use faultline_sut::{CostEstimator, EnvelopeCostEstimator, SessionHandle, SystemUnderTest};
use faultline_types::{
    ChaosMetrics, Complexity, ExecutionId, NetworkScenarioKind, OrchestrationReports,
    OrchestrationResult, OrchestrationStatus, OrganizationTestResult, PipelineExecution,
    ScenarioDefinition, ScenarioRecord, TestSuite, ValidationCheck, ValidationResult,
};
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::{NetworkSettings, OrchestrationConfig};
use crate::error::{OrchestrationError, Result};
use crate::validation::{check_compliance, check_cost, check_health, check_network, check_sla};

/// Per-scenario timeout when a scenario set is run without a run budget.
pub const DEFAULT_SCENARIO_TIMEOUT_MS: u64 = 5 * 60 * 1000;

/// How one scenario set is executed.
#[derive(Clone)]
pub struct ScenarioSetOptions {
    /// Suite the scenarios were selected for.
    pub suite: TestSuite,
    /// Sessions scenarios are assigned to, round-robin.
    pub sessions: Vec<SessionHandle>,
    /// Time one scenario's pipeline may take.
    pub scenario_timeout_ms: u64,
    /// SLA thresholds.
    pub sla: SlaThresholds,
    /// Compliance requirements, when compliance validation is on.
    pub compliance: Option<ComplianceProfile>,
    /// Network simulator to probe after each scenario.
    pub network: Option<Arc<NetworkConditionSimulator>>,
    /// Probe traffic settings.
    pub probes: NetworkSettings,
    /// Record wall-clock time per scenario.
    pub performance_monitoring: bool,
}

impl ScenarioSetOptions {
    /// Options with default thresholds and no compliance or network checks.
    pub fn new(suite: TestSuite, sessions: Vec<SessionHandle>) -> Self {
        Self {
            suite,
            sessions,
            scenario_timeout_ms: DEFAULT_SCENARIO_TIMEOUT_MS,
            sla: SlaThresholds::default(),
            compliance: None,
            network: None,
            probes: NetworkSettings::default(),
            performance_monitoring: true,
        }
    }
}

/// State of one run, shared by every organization task.
struct RunContext {
    config: OrchestrationConfig,
    sessions: BTreeMap<String, Vec<SessionHandle>>,
    /// Fault injectors in use, by organization.
    chaos: DashMap<String, FailureInjector>,
    /// Network simulators in use, by organization.
    networks: DashMap<String, Arc<NetworkConditionSimulator>>,
}

/// Drives resilience-testing runs against a system under test.
pub struct ExecutionOrchestrator {
    system: Arc<dyn SystemUnderTest>,
    catalog: ScenarioCatalog,
    cost: Arc<dyn CostEstimator>,
    progress: DashMap<String, OrganizationTestResult>,
    cancel: watch::Sender<bool>,
    running: AtomicBool,
}

/// Marks a run in progress; clears the run and cancel flags when dropped.
struct RunGuard<'a> {
    running: &'a AtomicBool,
    cancel: &'a watch::Sender<bool>,
}

impl<'a> RunGuard<'a> {
    fn acquire(running: &'a AtomicBool, cancel: &'a watch::Sender<bool>) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { running, cancel })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.cancel.send_replace(false);
        self.running.store(false, Ordering::Release);
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Per-organization seed, distinct per random stream.
fn derive_seed(seed: Option<u64>, ordinal: usize, stream: u64) -> Option<u64> {
    seed.map(|s| {
        s.wrapping_add((ordinal as u64).wrapping_mul(1_000_003))
            .wrapping_add(stream)
    })
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn organization_error(organization: &str, reason: impl ToString) -> OrchestrationError {
    OrchestrationError::OrganizationExecution {
        organization: organization.to_string(),
        reason: reason.to_string(),
    }
}

impl ExecutionOrchestrator {
    /// Orchestrator over the standard catalog with envelope-midpoint costs.
    pub fn new(system: Arc<dyn SystemUnderTest>) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            system,
            catalog: ScenarioCatalog::standard(),
            cost: Arc::new(EnvelopeCostEstimator),
            progress: DashMap::new(),
            cancel,
            running: AtomicBool::new(false),
        }
    }

    /// Replace the scenario catalog.
    pub fn with_catalog(mut self, catalog: ScenarioCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the cost collaborator.
    pub fn with_cost_estimator(mut self, cost: Arc<dyn CostEstimator>) -> Self {
        self.cost = cost;
        self
    }

    /// The system under test.
    pub fn system(&self) -> Arc<dyn SystemUnderTest> {
        Arc::clone(&self.system)
    }

    /// The scenario catalog.
    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    /// Snapshot of per-organization results recorded so far.
    pub fn progress(&self) -> BTreeMap<String, OrganizationTestResult> {
        self.progress
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Cancel the run in progress, or the next run if none has started yet.
    /// Calling it again has no further effect.
    pub fn cancel(&self) {
        if !self.cancel.send_replace(true) {
            tracing::info!("Orchestration cancellation requested");
        }
    }

    /// Whether a cancel is pending. Cleared when the run finishes.
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Whether a run is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run every configured organization, environment and suite.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Configuration`] before anything runs if
    /// the configuration is rejected, [`OrchestrationError::AlreadyRunning`]
    /// if another run on this orchestrator has not finished, and
    /// [`OrchestrationError::Fatal`] if session allocation fails. Everything
    /// else is recorded in the result.
    pub async fn execute(&self, config: OrchestrationConfig) -> Result<OrchestrationResult> {
        config.validate()?;
        let _guard = RunGuard::acquire(&self.running, &self.cancel)
            .ok_or(OrchestrationError::AlreadyRunning)?;

        let execution_id = ExecutionId::new();
        let started_at_ms = now_ms();
        let started = Instant::now();
        tracing::info!(
            %execution_id,
            organizations = config.organizations.len(),
            environments = config.environments.len(),
            suites = ?config.test_suites,
            parallel_sessions = config.parallel_sessions,
            "Orchestration started"
        );

        self.progress.clear();
        for organization in &config.organizations {
            self.progress.insert(
                organization.clone(),
                OrganizationTestResult::new(organization),
            );
        }

        let (sessions, setup_failure) = self.allocate_sessions(&config).await;
        let ctx = RunContext {
            config,
            sessions,
            chaos: DashMap::new(),
            networks: DashMap::new(),
        };

        if let Some(reason) = setup_failure {
            tracing::error!(%execution_id, %reason, "Shared setup failed");
            self.teardown(&ctx).await;
            let result = self.assemble(
                &ctx.config,
                execution_id,
                started_at_ms,
                started,
                OrchestrationStatus::Failed,
                vec![reason.clone()],
            );
            return Err(OrchestrationError::Fatal {
                reason,
                result: Box::new(result),
            });
        }

        let budget_ms = ctx.config.max_execution_time_ms;
        let mut cancel_rx = self.cancel.subscribe();
        let organizations = join_all(
            ctx.config
                .organizations
                .iter()
                .enumerate()
                .map(|(ordinal, organization)| self.run_organization(&ctx, organization, ordinal)),
        );

        let status = tokio::select! {
            biased;
            _ = cancelled(&mut cancel_rx) => OrchestrationStatus::Cancelled,
            _ = tokio::time::sleep(Duration::from_millis(budget_ms)) => OrchestrationStatus::Timeout,
            _ = organizations => OrchestrationStatus::Completed,
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let run_blockers = match status {
            OrchestrationStatus::Cancelled => {
                tracing::warn!(%execution_id, elapsed_ms, "Orchestration cancelled");
                vec![format!("execution cancelled after {}ms", elapsed_ms)]
            }
            OrchestrationStatus::Timeout => {
                tracing::warn!(%execution_id, budget_ms, "Orchestration timed out");
                vec![format!("execution exceeded its {}ms budget", budget_ms)]
            }
            _ => Vec::new(),
        };

        self.teardown(&ctx).await;
        let result = self.assemble(
            &ctx.config,
            execution_id,
            started_at_ms,
            started,
            status,
            run_blockers,
        );

        tracing::info!(
            %execution_id,
            status = %result.status,
            duration_ms = result.duration_ms,
            scenarios = result.overall.total_scenarios,
            success_rate = result.overall.success_rate,
            overall_success = result.summary.overall_success,
            "Orchestration finished"
        );
        Ok(result)
    }

    /// Open every session up front; stops at the first failure.
    async fn allocate_sessions(
        &self,
        config: &OrchestrationConfig,
    ) -> (BTreeMap<String, Vec<SessionHandle>>, Option<String>) {
        let mut sessions = BTreeMap::new();
        for organization in &config.organizations {
            let mut opened = Vec::with_capacity(config.parallel_sessions);
            for index in 0..config.parallel_sessions {
                match self.system.open_session(organization, index).await {
                    Ok(session) => {
                        tracing::debug!(organization = %organization, session = %session.id, index, "Session opened");
                        opened.push(session);
                    }
                    Err(e) => {
                        sessions.insert(organization.clone(), opened);
                        return (
                            sessions,
                            Some(format!(
                                "session allocation failed for {}: {}",
                                organization, e
                            )),
                        );
                    }
                }
            }
            sessions.insert(organization.clone(), opened);
        }
        (sessions, None)
    }

    async fn teardown(&self, ctx: &RunContext) {
        let injectors: Vec<(String, FailureInjector)> = ctx
            .chaos
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        ctx.chaos.clear();
        for (organization, injector) in injectors {
            let metrics = injector.stop().await;
            self.merge_chaos_metrics(&organization, &metrics);
        }

        let networks: Vec<Arc<NetworkConditionSimulator>> = ctx
            .networks
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        ctx.networks.clear();
        for simulator in networks {
            simulator.stop();
        }

        for session in ctx.sessions.values().flatten() {
            if let Err(e) = self.system.close_session(session).await {
                tracing::warn!(organization = %session.organization, session = %session.id, error = %e, "Failed to close session");
            }
        }
    }

    fn record_error(&self, organization: &str, error: String) {
        self.progress
            .entry(organization.to_string())
            .or_insert_with(|| OrganizationTestResult::new(organization))
            .errors
            .push(error);
    }

    fn merge_chaos_metrics(&self, organization: &str, metrics: &ChaosMetrics) {
        let mut entry = self
            .progress
            .entry(organization.to_string())
            .or_insert_with(|| OrganizationTestResult::new(organization));
        let total = entry.chaos_metrics.get_or_insert_with(ChaosMetrics::default);
        total.scenarios_executed += metrics.scenarios_executed;
        total.failures_injected += metrics.failures_injected;
        total.system_recoveries += metrics.system_recoveries;
        total.degradation_events += metrics.degradation_events;
        total.critical_failures += metrics.critical_failures;
        total.recovery_time_ms += metrics.recovery_time_ms;
    }

    async fn run_organization(&self, ctx: &RunContext, organization: &str, ordinal: usize) {
        let suites = expand_suites(&ctx.config.test_suites);
        let sessions = ctx.sessions.get(organization).cloned().unwrap_or_default();

        for environment in &ctx.config.environments {
            for suite in &suites {
                if let Err(e) = self
                    .run_suite(ctx, organization, ordinal, environment, *suite, &sessions)
                    .await
                {
                    tracing::warn!(
                        organization = %organization,
                        environment = %environment,
                        suite = %suite,
                        error = %e,
                        "Suite failed"
                    );
                    let detail = match e {
                        OrchestrationError::OrganizationExecution { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    self.record_error(organization, format!("{}/{}: {}", environment, suite, detail));
                }
            }
        }
        tracing::info!(organization = %organization, "Organization finished");
    }

    async fn run_suite(
        &self,
        ctx: &RunContext,
        organization: &str,
        ordinal: usize,
        environment: &str,
        suite: TestSuite,
        sessions: &[SessionHandle],
    ) -> Result<()> {
        self.system
            .prepare_suite(organization, environment, suite)
            .await
            .map_err(|e| organization_error(organization, e))?;
        tracing::debug!(organization = %organization, environment = %environment, suite = %suite, "Suite prepared");

        match suite {
            TestSuite::Compliance => {
                self.run_compliance_checks(ctx, organization, environment);
                Ok(())
            }
            TestSuite::Chaos => {
                self.run_chaos_suite(ctx, organization, ordinal, environment, sessions)
                    .await
            }
            _ => {
                let Some(complexity) = complexity_for_suite(suite) else {
                    return Ok(());
                };
                let scenarios = self.catalog.scenarios_for(organization, complexity);
                let network = if ctx.config.enable_network_simulation {
                    Some(self.start_network(ctx, organization, ordinal, None)?)
                } else {
                    None
                };
                let options =
                    Self::options_for(ctx, organization, suite, sessions, scenarios.len(), network);
                self.execute_scenario_set(organization, &scenarios, environment, &options)
                    .await;
                self.stop_network(ctx, organization);
                Ok(())
            }
        }
    }

    /// Medium scenarios under the `unstable` profile forced to `degraded`,
    /// with fault injection scoped to the organization when chaos mode is on.
    async fn run_chaos_suite(
        &self,
        ctx: &RunContext,
        organization: &str,
        ordinal: usize,
        environment: &str,
        sessions: &[SessionHandle],
    ) -> Result<()> {
        let scenarios = self
            .catalog
            .scenarios_for(organization, complexity_for_suite(TestSuite::Chaos).unwrap_or(Complexity::Medium));
        let network = self.start_network(
            ctx,
            organization,
            ordinal,
            Some(NetworkScenarioKind::Degraded),
        )?;

        let injector = if ctx.config.enable_chaos_mode {
            let injector = FailureInjector::new(
                self.system.interceptor(),
                self.system.pressure(),
                rng_from(derive_seed(ctx.config.seed, ordinal, 2)),
            );
            ctx.chaos.insert(organization.to_string(), injector.clone());
            let status = injector
                .start(
                    ctx.config
                        .chaos
                        .config_for(organization, ctx.config.max_execution_time_ms),
                )
                .await;
            tracing::info!(
                organization = %organization,
                intensity = %status.intensity,
                installed = status.installed.len(),
                "Fault injection active"
            );
            Some(injector)
        } else {
            None
        };

        let options = Self::options_for(
            ctx,
            organization,
            TestSuite::Chaos,
            sessions,
            scenarios.len(),
            Some(network),
        );
        self.execute_scenario_set(organization, &scenarios, environment, &options)
            .await;

        if let Some(injector) = injector {
            ctx.chaos.remove(organization);
            let metrics = injector.stop().await;
            self.merge_chaos_metrics(organization, &metrics);
        }
        self.stop_network(ctx, organization);
        Ok(())
    }

    /// Check compliance for scenarios that already ran in `environment`
    /// without it.
    fn run_compliance_checks(&self, ctx: &RunContext, organization: &str, environment: &str) {
        let profile = ctx.config.compliance_profile(organization);
        let Some(mut entry) = self.progress.get_mut(organization) else {
            return;
        };
        for record in entry.scenarios.values_mut() {
            if record.environment != environment
                || record
                    .validations
                    .iter()
                    .any(|v| v.check == ValidationCheck::Compliance)
            {
                continue;
            }
            if let Some(definition) = self.catalog.get(&record.execution.scenario) {
                let results =
                    check_compliance(&profile, definition, &record.execution, record.estimated_cost);
                record.validations.extend(results);
            }
        }
    }

    fn start_network(
        &self,
        ctx: &RunContext,
        organization: &str,
        ordinal: usize,
        degrade_to: Option<NetworkScenarioKind>,
    ) -> Result<Arc<NetworkConditionSimulator>> {
        let simulator = Arc::new(NetworkConditionSimulator::with_rng(
            ctx.config.network.simulator.clone(),
            rng_from(derive_seed(ctx.config.seed, ordinal, 1)),
        ));
        if degrade_to.is_some() {
            simulator
                .set_condition(profiles::UNSTABLE)
                .map_err(|e| organization_error(organization, e))?;
        }
        simulator.start();
        if let Some(kind) = degrade_to {
            simulator
                .force_scenario(kind, None)
                .map_err(|e| organization_error(organization, e))?;
        }
        ctx.networks
            .insert(organization.to_string(), Arc::clone(&simulator));
        Ok(simulator)
    }

    fn stop_network(&self, ctx: &RunContext, organization: &str) {
        if let Some((_, simulator)) = ctx.networks.remove(organization) {
            let summary = simulator.stop();
            tracing::debug!(
                organization = %organization,
                samples = summary.samples,
                uptime_percent = summary.uptime_percent,
                "Network simulation stopped"
            );
        }
    }

    fn options_for(
        ctx: &RunContext,
        organization: &str,
        suite: TestSuite,
        sessions: &[SessionHandle],
        scenario_count: usize,
        network: Option<Arc<NetworkConditionSimulator>>,
    ) -> ScenarioSetOptions {
        let config = &ctx.config;
        ScenarioSetOptions {
            suite,
            sessions: sessions.to_vec(),
            scenario_timeout_ms: (config.max_execution_time_ms / scenario_count.max(1) as u64)
                .max(1),
            sla: config.sla,
            compliance: config
                .enable_compliance_validation
                .then(|| config.compliance_profile(organization)),
            network,
            probes: config.network.clone(),
            performance_monitoring: config.enable_performance_monitoring,
        }
    }

    /// Run a set of scenarios for one organization.
    ///
    /// Scenarios are assigned round-robin to `options.sessions`; sessions run
    /// concurrently and each runs its scenarios in order. Every record is
    /// also written to the progress map under `environment/suite/scenario`.
    pub async fn execute_scenario_set(
        &self,
        organization: &str,
        scenarios: &[ScenarioDefinition],
        environment: &str,
        options: &ScenarioSetOptions,
    ) -> Vec<(String, ScenarioRecord)> {
        if scenarios.is_empty() {
            return Vec::new();
        }
        if options.sessions.is_empty() {
            tracing::warn!(organization = %organization, "No sessions to run scenarios on");
            self.record_error(
                organization,
                format!("{}/{}: no sessions available", environment, options.suite),
            );
            return Vec::new();
        }

        let mut lanes: Vec<Vec<&ScenarioDefinition>> = vec![Vec::new(); options.sessions.len()];
        for (i, scenario) in scenarios.iter().enumerate() {
            lanes[i % options.sessions.len()].push(scenario);
        }

        let runs = lanes
            .into_iter()
            .zip(options.sessions.iter())
            .map(|(lane, session)| async move {
                let mut records = Vec::with_capacity(lane.len());
                for scenario in lane {
                    let record = self
                        .run_scenario(organization, session, scenario, environment, options)
                        .await;
                    let key = format!("{}/{}/{}", environment, options.suite, scenario.name);
                    self.progress
                        .entry(organization.to_string())
                        .or_insert_with(|| OrganizationTestResult::new(organization))
                        .scenarios
                        .insert(key.clone(), record.clone());
                    records.push((key, record));
                }
                records
            });

        join_all(runs).await.into_iter().flatten().collect()
    }

    async fn run_scenario(
        &self,
        organization: &str,
        session: &SessionHandle,
        scenario: &ScenarioDefinition,
        environment: &str,
        options: &ScenarioSetOptions,
    ) -> ScenarioRecord {
        let started = Instant::now();
        let timeout = Duration::from_millis(options.scenario_timeout_ms);
        let pipeline = self.system.execute_scenario(session, scenario, environment);

        let (execution, completed) = match tokio::time::timeout(timeout, pipeline).await {
            Ok(Ok(mut execution)) => {
                execution.scenario = scenario.name.clone();
                (execution, true)
            }
            Ok(Err(e)) => {
                let err = OrchestrationError::ScenarioExecution {
                    scenario: scenario.name.clone(),
                    reason: e.to_string(),
                };
                tracing::warn!(organization = %organization, error = %err, "Scenario errored");
                (PipelineExecution::failed(&scenario.name, &e.to_string()), false)
            }
            Err(_) => {
                tracing::warn!(
                    organization = %organization,
                    scenario = %scenario.name,
                    timeout_ms = options.scenario_timeout_ms,
                    "Scenario timed out"
                );
                let reason = format!("scenario timed out after {}ms", options.scenario_timeout_ms);
                (PipelineExecution::failed(&scenario.name, &reason), false)
            }
        };

        let estimated_cost = self.cost.estimate(scenario);
        let mut validations = Vec::new();
        validations.push(if completed {
            check_sla(&execution.metrics, &options.sla)
        } else {
            ValidationResult::fail(
                ValidationCheck::Sla,
                "deployment and rollback within SLA",
                "scenario did not complete",
            )
        });
        validations.push(check_health(
            self.system.health_check(session, environment).await,
        ));
        if let Some(profile) = &options.compliance {
            validations.extend(check_compliance(profile, scenario, &execution, estimated_cost));
        }
        validations.push(check_cost(&scenario.expected, estimated_cost));

        let network = match &options.network {
            Some(simulator) => {
                let outcome = simulator
                    .simulate_request_batch(
                        options.probes.probe_requests,
                        options.probes.probe_size_bytes,
                        options.probes.probe_concurrency,
                    )
                    .await;
                validations.push(check_network(&outcome, options.probes.min_probe_success));
                Some(outcome)
            }
            None => None,
        };

        let observed_duration_ms = options
            .performance_monitoring
            .then(|| started.elapsed().as_millis() as u64);

        tracing::debug!(
            organization = %organization,
            scenario = %scenario.name,
            session = session.index,
            success = execution.summary.overall_success,
            failed_checks = validations.iter().filter(|v| !v.passed).count(),
            "Scenario finished"
        );

        ScenarioRecord {
            environment: environment.to_string(),
            suite: options.suite,
            session_index: session.index,
            execution,
            validations,
            estimated_cost,
            observed_duration_ms,
            network,
        }
    }

    fn assemble(
        &self,
        config: &OrchestrationConfig,
        execution_id: ExecutionId,
        started_at_ms: u64,
        started: Instant,
        status: OrchestrationStatus,
        run_blockers: Vec<String>,
    ) -> OrchestrationResult {
        let compliance_on = config.enable_compliance_validation
            || expand_suites(&config.test_suites).contains(&TestSuite::Compliance);

        let mut organizations = self.progress();
        for (name, org) in organizations.iter_mut() {
            org.metrics = organization_metrics(org.scenarios.values(), &config.sla);
            org.validation_results = org
                .scenarios
                .iter()
                .map(|(key, record)| (key.clone(), record.validations.clone()))
                .collect();
            if compliance_on {
                org.compliance_results =
                    Some(config.compliance_profile(name).evaluate(&org.scenarios));
            }
            org.status = organization_status(org);
        }

        let overall = overall_metrics(&organizations, &config.sla);
        let summary = summarize(&overall, &organizations, &run_blockers);

        let mut result = OrchestrationResult {
            execution_id,
            started_at_ms,
            completed_at_ms: now_ms(),
            duration_ms: started.elapsed().as_millis() as u64,
            status,
            organization_results: organizations,
            overall,
            summary,
            reports: OrchestrationReports::default(),
        };
        result.reports = render_reports(&result, config.reporting_level);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_sut::{stub_execution, MockSystem, StaticCostEstimator};
    use faultline_types::SessionId;

    fn sessions(count: usize) -> Vec<SessionHandle> {
        (0..count)
            .map(|index| SessionHandle {
                id: SessionId::new(),
                organization: "acme".into(),
                index,
            })
            .collect()
    }

    fn orchestrator(system: &MockSystem) -> ExecutionOrchestrator {
        ExecutionOrchestrator::new(Arc::new(system.clone()))
    }

    #[test]
    fn derived_seeds_differ_per_organization_and_stream() {
        assert_eq!(derive_seed(None, 3, 1), None);
        let a = derive_seed(Some(7), 0, 1);
        let b = derive_seed(Some(7), 1, 1);
        let c = derive_seed(Some(7), 0, 2);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, derive_seed(Some(7), 0, 1));
    }

    #[tokio::test]
    async fn scenarios_are_assigned_round_robin() {
        let system = MockSystem::new();
        let orchestrator = orchestrator(&system);
        let scenarios = orchestrator.catalog().entries().to_vec();
        let options = ScenarioSetOptions::new(TestSuite::Smoke, sessions(2));

        let records = orchestrator
            .execute_scenario_set("acme", &scenarios, "staging", &options)
            .await;

        assert_eq!(records.len(), scenarios.len());
        for (key, record) in &records {
            let position = scenarios
                .iter()
                .position(|s| key.ends_with(&format!("/{}", s.name)))
                .unwrap();
            assert_eq!(record.session_index, position % 2);
        }
        assert_eq!(orchestrator.progress()["acme"].scenarios.len(), scenarios.len());
    }

    #[tokio::test]
    async fn scenario_errors_become_failed_executions() {
        let system = MockSystem::new();
        system.fail_scenario("static-site", "pipeline crashed");
        let orchestrator = orchestrator(&system);
        let scenarios = orchestrator.catalog().scenarios_for("acme", Complexity::Simple);

        let records = orchestrator
            .execute_scenario_set(
                "acme",
                &scenarios,
                "staging",
                &ScenarioSetOptions::new(TestSuite::Smoke, sessions(1)),
            )
            .await;

        let (key, record) = &records[0];
        assert_eq!(key, "staging/smoke/static-site");
        assert!(!record.succeeded());
        assert_eq!(
            record.execution.summary.critical_issues,
            vec!["scenario failed: pipeline crashed".to_string()]
        );
        let sla = record
            .validations
            .iter()
            .find(|v| v.check == ValidationCheck::Sla)
            .unwrap();
        assert!(!sla.passed);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_scenarios_time_out() {
        let system = MockSystem::new();
        system.delay_scenario("static-site", 10_000);
        let orchestrator = orchestrator(&system);
        let scenarios = orchestrator.catalog().scenarios_for("acme", Complexity::Simple);
        let mut options = ScenarioSetOptions::new(TestSuite::Smoke, sessions(1));
        options.scenario_timeout_ms = 2_000;

        let started = Instant::now();
        let records = orchestrator
            .execute_scenario_set("acme", &scenarios, "staging", &options)
            .await;

        assert!(started.elapsed() < Duration::from_millis(3_000));
        assert_eq!(
            records[0].1.execution.summary.critical_issues,
            vec!["scenario timed out after 2000ms".to_string()]
        );
    }

    #[tokio::test]
    async fn cost_and_health_checks_are_recorded() {
        let system = MockSystem::new();
        system.set_unhealthy(true);
        let orchestrator = orchestrator(&system)
            .with_cost_estimator(Arc::new(StaticCostEstimator::new(10.0).with_cost("static-site", 500.0)));
        let scenarios = orchestrator.catalog().scenarios_for("acme", Complexity::Simple);

        let records = orchestrator
            .execute_scenario_set(
                "acme",
                &scenarios,
                "staging",
                &ScenarioSetOptions::new(TestSuite::Smoke, sessions(1)),
            )
            .await;

        let record = &records[0].1;
        assert_eq!(record.estimated_cost, 500.0);
        let failed: Vec<ValidationCheck> = record
            .validations
            .iter()
            .filter(|v| !v.passed)
            .map(|v| v.check)
            .collect();
        assert_eq!(failed, vec![ValidationCheck::Health, ValidationCheck::Cost]);
    }

    #[tokio::test]
    async fn compliance_suite_checks_earlier_records() {
        let system = MockSystem::new();
        system.respond_all(stub_execution("any", 10_000, None, true));
        let orchestrator = orchestrator(&system);

        let mut config = OrchestrationConfig::for_organizations(["acme"]);
        config.parallel_sessions = 1;
        config.enable_compliance_validation = false;
        config.test_suites = vec![TestSuite::Smoke, TestSuite::Compliance];

        let result = orchestrator.execute(config).await.unwrap();
        let acme = &result.organization_results["acme"];
        let record = &acme.scenarios["staging/smoke/static-site"];
        let compliance: Vec<&ValidationResult> = record
            .validations
            .iter()
            .filter(|v| v.check == ValidationCheck::Compliance)
            .collect();
        assert_eq!(compliance.len(), 3);

        let compliance = acme.compliance_results.as_ref().unwrap();
        assert_eq!(compliance.violations.len(), 1);
        assert!(compliance.violations[0].starts_with("rollback_verified"));
    }

    #[tokio::test]
    async fn compliance_suite_resolves_names_containing_slashes() {
        let system = MockSystem::new();
        system.respond_with("team/api", stub_execution("deploy-42", 10_000, Some(5_000), true));
        let mut scenario = ScenarioCatalog::standard()
            .get("static-site")
            .cloned()
            .unwrap();
        scenario.name = "team/api".into();
        let orchestrator =
            orchestrator(&system).with_catalog(ScenarioCatalog::new().with_scenario(scenario));

        let mut config = OrchestrationConfig::for_organizations(["acme"]);
        config.parallel_sessions = 1;
        config.enable_compliance_validation = false;
        config.test_suites = vec![TestSuite::Smoke, TestSuite::Compliance];

        let result = orchestrator.execute(config).await.unwrap();
        let record = &result.organization_results["acme"].scenarios["staging/smoke/team/api"];
        assert_eq!(record.execution.scenario, "team/api");
        assert_eq!(
            record
                .validations
                .iter()
                .filter(|v| v.check == ValidationCheck::Compliance)
                .count(),
            3
        );
    }

    #[tokio::test(start_paused = true)]
    async fn second_concurrent_run_is_rejected() {
        let system = MockSystem::new();
        system.delay_scenario("static-site", 60_000);
        let orchestrator = Arc::new(orchestrator(&system));
        let mut config = OrchestrationConfig::for_organizations(["acme"]);
        config.parallel_sessions = 1;
        config.test_suites = vec![TestSuite::Smoke];

        let runner = Arc::clone(&orchestrator);
        let first = config.clone();
        let handle = tokio::spawn(async move { runner.execute(first).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(orchestrator.is_running());

        let err = orchestrator.execute(config.clone()).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::AlreadyRunning));
        assert_eq!(orchestrator.progress()["acme"].organization, "acme");

        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.status, OrchestrationStatus::Completed);
        assert_eq!(result.organization_results["acme"].scenarios.len(), 1);
        assert!(!orchestrator.is_running());

        let again = orchestrator.execute(config).await.unwrap();
        assert_eq!(again.status, OrchestrationStatus::Completed);
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let system = MockSystem::new();
        let orchestrator = orchestrator(&system);
        assert!(!orchestrator.is_cancelled());
        orchestrator.cancel();
        orchestrator.cancel();
        assert!(orchestrator.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_before_start_applies_to_next_run() {
        let system = MockSystem::new();
        let orchestrator = orchestrator(&system);
        let mut config = OrchestrationConfig::for_organizations(["acme"]);
        config.parallel_sessions = 1;
        config.test_suites = vec![TestSuite::Smoke];

        orchestrator.cancel();
        let cancelled = orchestrator.execute(config.clone()).await.unwrap();
        assert_eq!(cancelled.status, OrchestrationStatus::Cancelled);
        assert!(!orchestrator.is_cancelled());

        let completed = orchestrator.execute(config).await.unwrap();
        assert_eq!(completed.status, OrchestrationStatus::Completed);
    }

    #[tokio::test]
    async fn invalid_config_runs_nothing() {
        let system = MockSystem::new();
        let orchestrator = orchestrator(&system);

        let err = orchestrator
            .execute(OrchestrationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Configuration(_)));
        assert!(system.open_sessions().is_empty());
        assert!(system.closed_sessions().is_empty());
    }
}
