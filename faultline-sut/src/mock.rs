//! Scripted system under test.
//!
//! Allows scripting pipeline results per scenario, forcing failures at every
//! seam, and inspecting what the engine did.

use async_trait::async_trait;
use faultline_types::{
    PipelineExecution, PipelineMetrics, PipelineSummary, ScenarioDefinition, Scorecard, SessionId,
    TestSuite,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::{
    InterceptError, InterceptResolution, InterceptRule, InterceptorChain, OutboundRequest,
    PressureKind, RequestInterceptor, ResourcePressureInjector, RuleId, SessionHandle, SutError,
    SystemUnderTest,
};

/// Pipeline result with the given timings and verdict.
pub fn stub_execution(
    scenario: &str,
    deployment_time_ms: u64,
    rollback_time_ms: Option<u64>,
    success: bool,
) -> PipelineExecution {
    PipelineExecution {
        scenario: scenario.to_string(),
        metrics: PipelineMetrics {
            deployment_time_ms,
            rollback_time_ms,
            resources_created: 3,
        },
        scorecard: Scorecard {
            overall: if success { 92.0 } else { 35.0 },
        },
        summary: PipelineSummary {
            overall_success: success,
            critical_issues: Vec::new(),
            recommendations: Vec::new(),
        },
    }
}

/// Scripted system under test.
///
/// Cloning yields a handle to the same state.
#[derive(Debug, Clone, Default)]
pub struct MockSystem {
    inner: Arc<Mutex<MockSystemInner>>,
    chain: InterceptorChain,
}

#[derive(Debug, Default)]
struct MockSystemInner {
    default_response: Option<PipelineExecution>,
    responses: HashMap<String, PipelineExecution>,
    scenario_delays: HashMap<String, u64>,
    failing_scenarios: HashMap<String, String>,
    failing_organizations: HashMap<String, String>,
    failing_suites: HashMap<(String, TestSuite), String>,
    fail_next_open: Option<String>,
    refuse_interception: Option<String>,
    unhealthy: bool,
    open_sessions: Vec<SessionHandle>,
    closed_sessions: Vec<SessionId>,
    executed: Vec<(String, String)>,
    prepared: Vec<(String, String, TestSuite)>,
    active_pressure: BTreeMap<PressureKind, f64>,
    pressure_log: Vec<(PressureKind, f64)>,
}

impl MockSystem {
    /// Create a mock whose pipeline always succeeds quickly.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockSystemInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return `execution` (renamed per scenario) for every unscripted scenario.
    pub fn respond_all(&self, execution: PipelineExecution) {
        self.lock().default_response = Some(execution);
    }

    /// Return `execution` for the named scenario.
    pub fn respond_with(&self, scenario: &str, execution: PipelineExecution) {
        self.lock().responses.insert(scenario.to_string(), execution);
    }

    /// Hold the named scenario's pipeline for `delay_ms` before answering.
    pub fn delay_scenario(&self, scenario: &str, delay_ms: u64) {
        self.lock()
            .scenario_delays
            .insert(scenario.to_string(), delay_ms);
    }

    /// Make the named scenario's pipeline fail.
    pub fn fail_scenario(&self, scenario: &str, error: &str) {
        self.lock()
            .failing_scenarios
            .insert(scenario.to_string(), error.to_string());
    }

    /// Make suite preparation fail for an organization.
    pub fn fail_organization(&self, organization: &str, error: &str) {
        self.lock()
            .failing_organizations
            .insert(organization.to_string(), error.to_string());
    }

    /// Make preparation of one suite fail for an organization.
    pub fn fail_suite(&self, organization: &str, suite: TestSuite, error: &str) {
        self.lock()
            .failing_suites
            .insert((organization.to_string(), suite), error.to_string());
    }

    /// Cause the next open_session() to fail.
    pub fn fail_next_open(&self, error: &str) {
        self.lock().fail_next_open = Some(error.to_string());
    }

    /// Refuse every rule registration with an unsupported-interception error.
    pub fn refuse_interception(&self, reason: &str) {
        self.lock().refuse_interception = Some(reason.to_string());
    }

    /// Report the deployment as unhealthy.
    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.lock().unhealthy = unhealthy;
    }

    /// Sessions currently open.
    pub fn open_sessions(&self) -> Vec<SessionHandle> {
        self.lock().open_sessions.clone()
    }

    /// Sessions closed so far.
    pub fn closed_sessions(&self) -> Vec<SessionId> {
        self.lock().closed_sessions.clone()
    }

    /// `(organization, scenario)` pairs executed, in call order.
    pub fn executed(&self) -> Vec<(String, String)> {
        self.lock().executed.clone()
    }

    /// `(organization, environment, suite)` triples prepared.
    pub fn prepared(&self) -> Vec<(String, String, TestSuite)> {
        self.lock().prepared.clone()
    }

    /// Pressure currently applied.
    pub fn active_pressure(&self) -> BTreeMap<PressureKind, f64> {
        self.lock().active_pressure.clone()
    }

    /// Every apply() call, in order.
    pub fn pressure_log(&self) -> Vec<(PressureKind, f64)> {
        self.lock().pressure_log.clone()
    }

    /// Direct handle to the interceptor chain.
    pub fn chain(&self) -> &InterceptorChain {
        &self.chain
    }

    /// Clear all scripted and recorded state, including interception rules.
    pub fn reset(&self) {
        *self.lock() = MockSystemInner::default();
        self.chain.clear();
    }
}

impl RequestInterceptor for MockSystem {
    fn register(&self, rule: InterceptRule) -> Result<RuleId, InterceptError> {
        if let Some(reason) = self.lock().refuse_interception.clone() {
            return Err(InterceptError::UnsupportedInterceptionPoint(reason));
        }
        self.chain.register(rule)
    }

    fn unregister(&self, id: RuleId) -> Result<(), InterceptError> {
        self.chain.unregister(id)
    }

    fn clear(&self) {
        self.chain.clear();
    }

    fn rule_count(&self) -> usize {
        self.chain.rule_count()
    }

    fn evaluate(&self, request: &OutboundRequest) -> InterceptResolution {
        self.chain.evaluate(request)
    }
}

#[async_trait]
impl ResourcePressureInjector for MockSystem {
    async fn apply(&self, kind: PressureKind, level: f64) -> Result<(), SutError> {
        if !(0.0..=1.0).contains(&level) {
            return Err(SutError::Pressure(format!(
                "{} level {} outside [0, 1]",
                kind, level
            )));
        }
        let mut inner = self.lock();
        inner.active_pressure.insert(kind, level);
        inner.pressure_log.push((kind, level));
        Ok(())
    }

    async fn release(&self, kind: PressureKind) -> Result<(), SutError> {
        self.lock().active_pressure.remove(&kind);
        Ok(())
    }
}

#[async_trait]
impl SystemUnderTest for MockSystem {
    async fn open_session(
        &self,
        organization: &str,
        index: usize,
    ) -> Result<SessionHandle, SutError> {
        let mut inner = self.lock();

        // Check for forced failure
        if let Some(error) = inner.fail_next_open.take() {
            return Err(SutError::SessionAllocation(error));
        }

        let session = SessionHandle {
            id: SessionId::new(),
            organization: organization.to_string(),
            index,
        };
        inner.open_sessions.push(session.clone());
        Ok(session)
    }

    async fn close_session(&self, session: &SessionHandle) -> Result<(), SutError> {
        let mut inner = self.lock();
        let before = inner.open_sessions.len();
        inner.open_sessions.retain(|s| s.id != session.id);
        if inner.open_sessions.len() != before {
            inner.closed_sessions.push(session.id);
        }
        Ok(())
    }

    async fn prepare_suite(
        &self,
        organization: &str,
        environment: &str,
        suite: TestSuite,
    ) -> Result<(), SutError> {
        let mut inner = self.lock();
        if let Some(error) = inner.failing_organizations.get(organization) {
            return Err(SutError::SuiteSetup(error.clone()));
        }
        if let Some(error) = inner
            .failing_suites
            .get(&(organization.to_string(), suite))
        {
            return Err(SutError::SuiteSetup(error.clone()));
        }
        inner
            .prepared
            .push((organization.to_string(), environment.to_string(), suite));
        Ok(())
    }

    async fn execute_scenario(
        &self,
        session: &SessionHandle,
        scenario: &ScenarioDefinition,
        environment: &str,
    ) -> Result<PipelineExecution, SutError> {
        let delay_ms = {
            let mut inner = self.lock();
            inner
                .executed
                .push((session.organization.clone(), scenario.name.clone()));
            if let Some(error) = inner.failing_scenarios.get(&scenario.name) {
                return Err(SutError::ScenarioFailed(error.clone()));
            }
            inner.scenario_delays.get(&scenario.name).copied()
        };

        if let Some(ms) = delay_ms {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        let url = format!("/api/deployments/{}/{}", environment, scenario.name);
        let request = OutboundRequest::new("POST", &url).for_organization(&session.organization);
        match self.dispatch(request).await {
            InterceptResolution::Proceed { .. } => {}
            InterceptResolution::Aborted { reason, .. } => {
                return Err(SutError::RequestAborted(reason))
            }
            InterceptResolution::Fulfilled { status, body, .. } if status >= 400 => {
                return Err(SutError::RequestRejected { status, body })
            }
            InterceptResolution::Fulfilled { .. } => {}
        }

        let inner = self.lock();
        let execution = match inner.responses.get(&scenario.name) {
            Some(execution) => execution.clone(),
            None => {
                let mut execution = inner
                    .default_response
                    .clone()
                    .unwrap_or_else(|| stub_execution(&scenario.name, 10_000, Some(5_000), true));
                execution.scenario = scenario.name.clone();
                execution
            }
        };
        Ok(execution)
    }

    async fn health_check(
        &self,
        session: &SessionHandle,
        environment: &str,
    ) -> Result<bool, SutError> {
        let unhealthy = self.lock().unhealthy;
        if unhealthy {
            return Ok(false);
        }
        let url = format!("/health/{}", environment);
        let request = OutboundRequest::new("GET", &url).for_organization(&session.organization);
        Ok(!self.dispatch(request).await.is_failure())
    }

    fn interceptor(&self) -> Arc<dyn RequestInterceptor> {
        Arc::new(self.clone())
    }

    fn pressure(&self) -> Arc<dyn ResourcePressureInjector> {
        Arc::new(self.clone())
    }
}
