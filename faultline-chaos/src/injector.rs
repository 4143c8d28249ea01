//! Intensity-gated fault injection.
//!
//! The injector installs faults into a system's [`RequestInterceptor`] and
//! [`ResourcePressureInjector`]. Request faults are probability gates drawn
//! per matching request: the gate is the intensity's failure rate scaled by a
//! fixed fraction per fault type. Pressure faults apply a level equal to the
//! failure rate until removed.
//!
//! Lifecycle:
//!
//! ```text
//! Idle --start/execute_scenario--> Active --stop/auto-stop--> Idle
//! ```
//!
//! Counters are atomics shared with the installed rules; they only reset
//! through [`FailureInjector::reset`].

use faultline_core::DynRng;
use faultline_sut::{
    InterceptAction, InterceptRule, OutboundRequest, PressureKind, RequestInterceptor,
    ResourcePressureInjector, RuleId,
};
use faultline_types::{
    ChaosConfig, ChaosIntensity, ChaosMetrics, ChaosScenarioResult, ChaosScenarioType, Impact,
};
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::ChaosError;

/// Status codes drawn by `random_errors`.
const SERVER_ERRORS: [u16; 4] = [500, 502, 503, 504];
/// Base delay range of `slow_responses`, scaled by the intensity multiplier.
const SLOW_RESPONSE_RANGE_MS: (u64, u64) = (500, 2000);

// =============================================================================
// Counters
// =============================================================================

/// Chaos counters shared by the injector and its installed rules.
#[derive(Debug, Default)]
struct ChaosCounters {
    scenarios_executed: AtomicU64,
    failures_injected: AtomicU64,
    system_recoveries: AtomicU64,
    degradation_events: AtomicU64,
    critical_failures: AtomicU64,
    recovery_time_ms: AtomicU64,
}

impl ChaosCounters {
    fn record_failure(&self, impact: Impact) {
        self.failures_injected.fetch_add(1, Ordering::Relaxed);
        if impact == Impact::Critical {
            self.critical_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> ChaosMetrics {
        ChaosMetrics {
            scenarios_executed: self.scenarios_executed.load(Ordering::Relaxed),
            failures_injected: self.failures_injected.load(Ordering::Relaxed),
            system_recoveries: self.system_recoveries.load(Ordering::Relaxed),
            degradation_events: self.degradation_events.load(Ordering::Relaxed),
            critical_failures: self.critical_failures.load(Ordering::Relaxed),
            recovery_time_ms: self.recovery_time_ms.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        for counter in [
            &self.scenarios_executed,
            &self.failures_injected,
            &self.system_recoveries,
            &self.degradation_events,
            &self.critical_failures,
            &self.recovery_time_ms,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

// =============================================================================
// State
// =============================================================================

/// What one installed fault type left behind.
#[derive(Debug)]
struct Installed {
    rules: Vec<RuleId>,
    pressure: Option<PressureKind>,
}

#[derive(Debug, Default)]
struct InjectorState {
    active: bool,
    config: ChaosConfig,
    installed: BTreeMap<ChaosScenarioType, Installed>,
    direct_rules: Vec<RuleId>,
    timer: Option<JoinHandle<()>>,
    results: Vec<ChaosScenarioResult>,
    last_snapshot: Option<ChaosMetrics>,
}

/// Point-in-time view of the injector.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectorStatus {
    /// Whether faults may be installed right now.
    pub active: bool,
    /// Intensity of the current (or last) run.
    pub intensity: ChaosIntensity,
    /// Fault types currently installed.
    pub installed: Vec<ChaosScenarioType>,
    /// Install outcomes since the last reset.
    pub results: Vec<ChaosScenarioResult>,
}

struct Shared {
    interceptor: Arc<dyn RequestInterceptor>,
    pressure: Arc<dyn ResourcePressureInjector>,
    rng: Arc<Mutex<DynRng>>,
    counters: Arc<ChaosCounters>,
    state: Mutex<InjectorState>,
}

/// Fault injection engine.
///
/// Cloning yields a handle to the same engine.
#[derive(Clone)]
pub struct FailureInjector {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for FailureInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureInjector")
            .field("status", &self.status())
            .field("metrics", &self.metrics())
            .finish()
    }
}

fn draw(rng: &Mutex<DynRng>) -> f64 {
    rng.lock().unwrap_or_else(PoisonError::into_inner).gen()
}

impl FailureInjector {
    /// Create an idle injector against a system's interception and pressure capabilities.
    pub fn new(
        interceptor: Arc<dyn RequestInterceptor>,
        pressure: Arc<dyn ResourcePressureInjector>,
        rng: DynRng,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                interceptor,
                pressure,
                rng: Arc::new(Mutex::new(rng)),
                counters: Arc::new(ChaosCounters::default()),
                state: Mutex::new(InjectorState::default()),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, InjectorState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn status_of(state: &InjectorState) -> InjectorStatus {
        InjectorStatus {
            active: state.active,
            intensity: state.config.intensity,
            installed: state.installed.keys().copied().collect(),
            results: state.results.clone(),
        }
    }

    /// Current status.
    pub fn status(&self) -> InjectorStatus {
        Self::status_of(&self.lock())
    }

    /// Whether the injector is active.
    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    /// Failure rate of the current (or last) intensity.
    pub fn failure_rate(&self) -> f64 {
        self.lock().config.intensity.failure_rate()
    }

    /// Live counters.
    pub fn metrics(&self) -> ChaosMetrics {
        self.shared.counters.snapshot()
    }

    /// Install every fault type in `config` and arm the auto-stop timer.
    ///
    /// Starting an active injector logs a warning and returns the existing
    /// status. A disabled config leaves the injector idle.
    pub async fn start(&self, config: ChaosConfig) -> InjectorStatus {
        {
            let mut state = self.lock();
            if state.active {
                tracing::warn!("Chaos injector already active, ignoring start");
                return Self::status_of(&state);
            }
            if !config.enabled {
                tracing::info!("Chaos injection disabled by config");
                return Self::status_of(&state);
            }
            state.active = true;
            state.config = config.clone();
            state.last_snapshot = None;
        }

        tracing::info!(
            intensity = %config.intensity,
            scenarios = config.scenarios.len(),
            duration_ms = config.duration_ms,
            target = ?config.target,
            "Chaos injection started"
        );

        for kind in &config.scenarios {
            self.execute_scenario(*kind).await;
        }

        if config.duration_ms > 0 {
            let injector = self.clone();
            let duration = Duration::from_millis(config.duration_ms);
            let handle = tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                tracing::info!("Chaos duration elapsed, stopping");
                injector.finish(false).await;
            });
            let mut state = self.lock();
            if let Some(old) = state.timer.replace(handle) {
                old.abort();
            }
        }

        self.status()
    }

    /// Install one fault type at the current intensity.
    ///
    /// Install errors are recorded in the result, never raised.
    pub async fn execute_scenario(&self, kind: ChaosScenarioType) -> ChaosScenarioResult {
        let started = Instant::now();
        let (config, refused) = {
            let mut state = self.lock();
            if state.installed.contains_key(&kind) {
                (state.config.clone(), true)
            } else {
                state.active = true;
                state.installed.insert(
                    kind,
                    Installed {
                        rules: Vec::new(),
                        pressure: None,
                    },
                );
                (state.config.clone(), false)
            }
        };
        let impact = config.severity.impact_of(kind);

        let outcome = if refused {
            Err(ChaosError::AlreadyInstalled(kind))
        } else {
            self.install(kind, &config, impact).await
        };

        let mut errors = Vec::new();
        {
            let mut state = self.lock();
            match outcome {
                Ok(installed) => {
                    if let Some(slot) = state.installed.get_mut(&kind) {
                        *slot = installed;
                    }
                    self.shared
                        .counters
                        .scenarios_executed
                        .fetch_add(1, Ordering::Relaxed);
                    tracing::info!(scenario = %kind, %impact, "Chaos scenario installed");
                }
                Err(e) => {
                    if !refused {
                        state.installed.remove(&kind);
                    }
                    tracing::warn!(scenario = %kind, error = %e, "Chaos scenario not installed");
                    errors.push(e.to_string());
                }
            }
        }

        let result = ChaosScenarioResult {
            scenario: kind,
            success: errors.is_empty(),
            impact,
            duration_ms: started.elapsed().as_millis() as u64,
            recovery_time_ms: None,
            errors,
        };
        self.lock().results.push(result.clone());
        result
    }

    async fn install(
        &self,
        kind: ChaosScenarioType,
        config: &ChaosConfig,
        impact: Impact,
    ) -> Result<Installed, ChaosError> {
        let rate = config.intensity.failure_rate();

        if let Some(pressure) = PressureKind::for_scenario(kind) {
            self.shared.pressure.apply(pressure, rate).await?;
            self.shared.counters.record_failure(impact);
            return Ok(Installed {
                rules: Vec::new(),
                pressure: Some(pressure),
            });
        }

        let rule = self.request_rule(kind, config, impact);
        let id = self.shared.interceptor.register(rule)?;
        Ok(Installed {
            rules: vec![id],
            pressure: None,
        })
    }

    fn request_rule(
        &self,
        kind: ChaosScenarioType,
        config: &ChaosConfig,
        impact: Impact,
    ) -> InterceptRule {
        let rate = config.intensity.failure_rate();
        let multiplier = config.intensity.delay_multiplier();
        let target = config.target.clone();
        let rng = Arc::clone(&self.shared.rng);
        let counters = Arc::clone(&self.shared.counters);

        let path: Option<&'static str> = match kind {
            ChaosScenarioType::AuthFailures => Some("/auth"),
            ChaosScenarioType::ApiTimeouts => Some("/api/"),
            ChaosScenarioType::DeploymentInterruptions => Some("/deploy"),
            _ => None,
        };
        let predicate = move |req: &OutboundRequest| {
            target
                .as_deref()
                .map_or(true, |t| req.organization.as_deref() == Some(t))
                && path.map_or(true, |p| req.url_contains(p))
        };

        let gate = rate * gate_fraction(kind);
        let label = format!("chaos:{}", kind);

        match kind {
            ChaosScenarioType::SlowResponses => InterceptRule::new(&label, predicate, move |_| {
                let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
                if rng.gen::<f64>() >= gate {
                    return InterceptAction::Continue;
                }
                let base = rng.gen_range(SLOW_RESPONSE_RANGE_MS.0..=SLOW_RESPONSE_RANGE_MS.1);
                counters.degradation_events.fetch_add(1, Ordering::Relaxed);
                InterceptAction::Delay(base * multiplier)
            }),
            ChaosScenarioType::RandomErrors => InterceptRule::new(&label, predicate, move |_| {
                let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
                if rng.gen::<f64>() >= gate {
                    return InterceptAction::Continue;
                }
                let status = SERVER_ERRORS[rng.gen_range(0..SERVER_ERRORS.len())];
                counters.record_failure(impact);
                InterceptAction::Fulfill {
                    status,
                    body: "injected server error".to_string(),
                }
            }),
            ChaosScenarioType::AuthFailures => InterceptRule::new(&label, predicate, move |_| {
                if draw(&rng) >= gate {
                    return InterceptAction::Continue;
                }
                counters.record_failure(impact);
                InterceptAction::Fulfill {
                    status: 401,
                    body: "injected authentication failure".to_string(),
                }
            }),
            ChaosScenarioType::ApiTimeouts => InterceptRule::new(&label, predicate, move |_| {
                if draw(&rng) >= gate {
                    return InterceptAction::Continue;
                }
                counters.record_failure(impact);
                InterceptAction::Abort("request timed out".to_string())
            }),
            ChaosScenarioType::DeploymentInterruptions => {
                InterceptRule::new(&label, predicate, move |_| {
                    if draw(&rng) >= gate {
                        return InterceptAction::Continue;
                    }
                    counters.record_failure(impact);
                    InterceptAction::Fulfill {
                        status: 503,
                        body: "deployment interrupted".to_string(),
                    }
                })
            }
            // Network failures, and the fallback for anything routed here.
            _ => InterceptRule::new(&label, predicate, move |_| {
                if draw(&rng) >= gate {
                    return InterceptAction::Continue;
                }
                counters.record_failure(impact);
                InterceptAction::Abort("network connection failed".to_string())
            }),
        }
    }

    /// Delay every matching request by `delay_ms`.
    pub fn inject_latency(&self, delay_ms: u64) -> Result<RuleId, ChaosError> {
        let target = self.lock().config.target.clone();
        let counters = Arc::clone(&self.shared.counters);
        let rule = InterceptRule::new(
            "chaos:latency",
            move |req: &OutboundRequest| {
                target
                    .as_deref()
                    .map_or(true, |t| req.organization.as_deref() == Some(t))
            },
            move |_| {
                counters.degradation_events.fetch_add(1, Ordering::Relaxed);
                InterceptAction::Delay(delay_ms)
            },
        );
        let id = self.shared.interceptor.register(rule)?;
        self.lock().direct_rules.push(id);
        tracing::info!(delay_ms, "Latency injected");
        Ok(id)
    }

    /// Abort matching requests with probability `rate`.
    pub fn inject_random_failures(&self, rate: f64) -> Result<RuleId, ChaosError> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(ChaosError::InvalidRate(rate));
        }
        let target = self.lock().config.target.clone();
        let rng = Arc::clone(&self.shared.rng);
        let counters = Arc::clone(&self.shared.counters);
        let rule = InterceptRule::new(
            "chaos:random-failures",
            move |req: &OutboundRequest| {
                target
                    .as_deref()
                    .map_or(true, |t| req.organization.as_deref() == Some(t))
            },
            move |_| {
                if draw(&rng) >= rate {
                    return InterceptAction::Continue;
                }
                counters.record_failure(Impact::Medium);
                InterceptAction::Abort("injected failure".to_string())
            },
        );
        let id = self.shared.interceptor.register(rule)?;
        self.lock().direct_rules.push(id);
        tracing::info!(rate, "Random failures injected");
        Ok(id)
    }

    /// Remove every fault and return the counters.
    ///
    /// Calling it again returns the same snapshot.
    pub async fn stop(&self) -> ChaosMetrics {
        self.finish(true).await
    }

    async fn finish(&self, abort_timer: bool) -> ChaosMetrics {
        let (installed, direct_rules, timer) = {
            let mut state = self.lock();
            if !state.active && state.installed.is_empty() && state.direct_rules.is_empty() {
                return state
                    .last_snapshot
                    .clone()
                    .unwrap_or_else(|| self.shared.counters.snapshot());
            }
            state.active = false;
            (
                std::mem::take(&mut state.installed),
                std::mem::take(&mut state.direct_rules),
                state.timer.take(),
            )
        };

        if let Some(handle) = timer {
            if abort_timer {
                handle.abort();
            }
        }

        let started = Instant::now();
        let recovered: Vec<ChaosScenarioType> = installed.keys().copied().collect();
        for (kind, entry) in installed {
            for id in entry.rules {
                if let Err(e) = self.shared.interceptor.unregister(id) {
                    tracing::warn!(scenario = %kind, error = %e, "Failed to remove chaos rule");
                }
            }
            if let Some(pressure) = entry.pressure {
                if let Err(e) = self.shared.pressure.release(pressure).await {
                    tracing::warn!(scenario = %kind, error = %e, "Failed to release pressure");
                }
            }
            self.shared
                .counters
                .system_recoveries
                .fetch_add(1, Ordering::Relaxed);
        }
        for id in direct_rules {
            if let Err(e) = self.shared.interceptor.unregister(id) {
                tracing::warn!(rule = %id, error = %e, "Failed to remove chaos rule");
            }
        }

        let recovery_ms = started.elapsed().as_millis() as u64;
        self.shared
            .counters
            .recovery_time_ms
            .fetch_add(recovery_ms, Ordering::Relaxed);

        let snapshot = self.shared.counters.snapshot();
        let mut state = self.lock();
        for result in state
            .results
            .iter_mut()
            .filter(|r| r.success && r.recovery_time_ms.is_none() && recovered.contains(&r.scenario))
        {
            result.recovery_time_ms = Some(recovery_ms);
        }
        state.last_snapshot = Some(snapshot.clone());
        tracing::info!(
            failures = snapshot.failures_injected,
            recoveries = snapshot.system_recoveries,
            "Chaos injection stopped"
        );
        snapshot
    }

    /// Clear counters and results. Refused while active.
    pub fn reset(&self) -> Result<(), ChaosError> {
        let mut state = self.lock();
        if state.active {
            return Err(ChaosError::Active);
        }
        self.shared.counters.reset();
        state.results.clear();
        state.last_snapshot = None;
        Ok(())
    }
}

/// Fraction of the intensity failure rate each request fault gates at.
fn gate_fraction(kind: ChaosScenarioType) -> f64 {
    match kind {
        ChaosScenarioType::NetworkFailures => 1.0,
        ChaosScenarioType::SlowResponses => 1.0,
        ChaosScenarioType::RandomErrors => 0.5,
        ChaosScenarioType::AuthFailures => 0.3,
        ChaosScenarioType::ApiTimeouts => 0.5,
        ChaosScenarioType::DeploymentInterruptions => 0.25,
        ChaosScenarioType::MemoryPressure
        | ChaosScenarioType::CpuThrottling
        | ChaosScenarioType::StorageErrors
        | ChaosScenarioType::ResourceExhaustion => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_core::seeded;
    use faultline_sut::{InterceptResolution, MockSystem};

    fn injector(system: &MockSystem, seed: u64) -> FailureInjector {
        FailureInjector::new(Arc::new(system.clone()), Arc::new(system.clone()), seeded(seed))
    }

    fn config(intensity: ChaosIntensity, scenarios: Vec<ChaosScenarioType>) -> ChaosConfig {
        ChaosConfig::new(intensity, scenarios).duration_ms(0)
    }

    fn send(system: &MockSystem, url: &str) -> InterceptResolution {
        system.evaluate(&OutboundRequest::new("GET", url).for_organization("acme"))
    }

    // ===========================================
    // Lifecycle
    // ===========================================

    #[tokio::test]
    async fn start_installs_configured_scenarios() {
        let system = MockSystem::new();
        let chaos = injector(&system, 1);

        let status = chaos
            .start(config(
                ChaosIntensity::High,
                vec![ChaosScenarioType::NetworkFailures, ChaosScenarioType::SlowResponses],
            ))
            .await;

        assert!(status.active);
        assert_eq!(status.installed.len(), 2);
        assert_eq!(system.rule_count(), 2);
        assert_eq!(chaos.metrics().scenarios_executed, 2);
        assert_eq!(chaos.failure_rate(), 0.50);
    }

    #[tokio::test]
    async fn start_while_active_is_a_no_op() {
        let system = MockSystem::new();
        let chaos = injector(&system, 1);
        chaos
            .start(config(ChaosIntensity::Low, vec![ChaosScenarioType::RandomErrors]))
            .await;

        let status = chaos
            .start(config(ChaosIntensity::Extreme, vec![ChaosScenarioType::ApiTimeouts]))
            .await;
        assert_eq!(status.intensity, ChaosIntensity::Low);
        assert_eq!(status.installed, vec![ChaosScenarioType::RandomErrors]);
        assert_eq!(system.rule_count(), 1);
    }

    #[tokio::test]
    async fn disabled_config_stays_idle() {
        let system = MockSystem::new();
        let chaos = injector(&system, 1);
        let mut cfg = config(ChaosIntensity::High, vec![ChaosScenarioType::NetworkFailures]);
        cfg.enabled = false;

        let status = chaos.start(cfg).await;
        assert!(!status.active);
        assert_eq!(system.rule_count(), 0);
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_removes_everything() {
        let system = MockSystem::new();
        let chaos = injector(&system, 1);
        chaos
            .start(config(
                ChaosIntensity::Extreme,
                vec![ChaosScenarioType::NetworkFailures, ChaosScenarioType::MemoryPressure],
            ))
            .await;
        chaos.inject_latency(100).unwrap();
        for _ in 0..20 {
            send(&system, "/api/items");
        }

        let first = chaos.stop().await;
        let second = chaos.stop().await;
        assert_eq!(first, second);
        assert_eq!(first.system_recoveries, 2);
        assert_eq!(system.rule_count(), 0);
        assert!(system.active_pressure().is_empty());
        assert!(!chaos.is_active());

        let results = chaos.status().results;
        assert!(results.iter().all(|r| r.recovery_time_ms.is_some()));
    }

    #[tokio::test(start_paused = true)]
    async fn auto_stop_after_duration() {
        let system = MockSystem::new();
        let chaos = injector(&system, 1);
        chaos
            .start(
                ChaosConfig::new(ChaosIntensity::Medium, vec![ChaosScenarioType::NetworkFailures])
                    .duration_ms(10_000),
            )
            .await;
        assert_eq!(system.rule_count(), 1);

        tokio::time::sleep(Duration::from_millis(10_001)).await;
        tokio::task::yield_now().await;

        assert!(!chaos.is_active());
        assert_eq!(system.rule_count(), 0);
        assert_eq!(chaos.stop().await.system_recoveries, 1);
    }

    #[tokio::test]
    async fn reset_requires_idle() {
        let system = MockSystem::new();
        let chaos = injector(&system, 1);
        chaos
            .start(config(ChaosIntensity::Low, vec![ChaosScenarioType::CpuThrottling]))
            .await;
        assert_eq!(chaos.reset(), Err(ChaosError::Active));

        chaos.stop().await;
        chaos.reset().unwrap();
        assert_eq!(chaos.metrics(), ChaosMetrics::default());
        assert!(chaos.status().results.is_empty());
    }

    // ===========================================
    // Scenario installation
    // ===========================================

    #[tokio::test]
    async fn installing_twice_is_refused() {
        let system = MockSystem::new();
        let chaos = injector(&system, 1);

        let first = chaos.execute_scenario(ChaosScenarioType::ApiTimeouts).await;
        let second = chaos.execute_scenario(ChaosScenarioType::ApiTimeouts).await;

        assert!(first.success);
        assert!(!second.success);
        assert_eq!(second.errors, vec!["api_timeouts is already installed".to_string()]);
        assert_eq!(system.rule_count(), 1);
        assert!(chaos.is_active());

        chaos.stop().await;
        let third = chaos.execute_scenario(ChaosScenarioType::ApiTimeouts).await;
        assert!(third.success);
    }

    #[tokio::test]
    async fn install_failure_does_not_abort_other_scenarios() {
        let system = MockSystem::new();
        system.refuse_interception("no request hook");
        let chaos = injector(&system, 1);

        chaos
            .start(config(
                ChaosIntensity::High,
                vec![ChaosScenarioType::NetworkFailures, ChaosScenarioType::StorageErrors],
            ))
            .await;

        let results = chaos.status().results;
        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert!(results[0].errors[0].contains("no request hook"));
        assert!(results[1].success);
        assert_eq!(
            system.active_pressure().get(&PressureKind::Storage),
            Some(&0.50)
        );
    }

    #[tokio::test]
    async fn result_impact_uses_severity_map_and_overrides() {
        let system = MockSystem::new();
        let chaos = injector(&system, 1);
        let result = chaos
            .execute_scenario(ChaosScenarioType::DeploymentInterruptions)
            .await;
        assert_eq!(result.impact, Impact::Critical);
        chaos.stop().await;

        let mut cfg = config(ChaosIntensity::Low, vec![ChaosScenarioType::SlowResponses]);
        cfg.severity = faultline_types::SeverityOverrides::new()
            .with(ChaosScenarioType::SlowResponses, Impact::Low);
        let status = chaos.start(cfg).await;
        assert_eq!(status.results.last().map(|r| r.impact), Some(Impact::Low));
    }

    // ===========================================
    // Gates
    // ===========================================

    #[tokio::test]
    async fn extreme_network_failures_abort_about_seventy_percent() {
        let system = MockSystem::new();
        let chaos = injector(&system, 2024);
        chaos
            .start(config(ChaosIntensity::Extreme, vec![ChaosScenarioType::NetworkFailures]))
            .await;

        let aborted = (0..1000)
            .filter(|i| send(&system, &format!("/api/items/{}", i)).is_aborted())
            .count();
        assert!((650..=750).contains(&aborted), "aborted {aborted}");
        assert_eq!(chaos.metrics().failures_injected, aborted as u64);
    }

    #[tokio::test]
    async fn failure_counts_grow_with_intensity() {
        let mut previous = 0;
        for intensity in ChaosIntensity::ALL {
            let system = MockSystem::new();
            let chaos = injector(&system, 99);
            chaos
                .start(config(intensity, vec![ChaosScenarioType::NetworkFailures]))
                .await;
            let failed = (0..2000)
                .filter(|_| send(&system, "/api/items").is_failure())
                .count();
            assert!(failed > previous, "{intensity}: {failed} <= {previous}");
            previous = failed;
        }
    }

    #[tokio::test]
    async fn path_scoped_faults_only_hit_their_paths() {
        let system = MockSystem::new();
        let chaos = injector(&system, 5);
        chaos
            .start(config(
                ChaosIntensity::Extreme,
                vec![
                    ChaosScenarioType::AuthFailures,
                    ChaosScenarioType::DeploymentInterruptions,
                ],
            ))
            .await;

        for _ in 0..200 {
            assert!(!send(&system, "/static/logo.png").is_failure());
        }
        let auth_failures = (0..1000)
            .filter(|_| {
                matches!(
                    send(&system, "/auth/login"),
                    InterceptResolution::Fulfilled { status: 401, .. }
                )
            })
            .count();
        // 0.7 * 0.3
        assert!((160..=260).contains(&auth_failures), "{auth_failures}");

        let interrupted = (0..1000)
            .filter(|_| {
                matches!(
                    send(&system, "/deployments/42"),
                    InterceptResolution::Fulfilled { status: 503, .. }
                )
            })
            .count();
        // 0.7 * 0.25
        assert!((125..=225).contains(&interrupted), "{interrupted}");
        assert_eq!(
            chaos.metrics().critical_failures,
            (auth_failures + interrupted) as u64
        );
    }

    #[tokio::test]
    async fn random_errors_fulfill_server_errors() {
        let system = MockSystem::new();
        let chaos = injector(&system, 8);
        chaos
            .start(config(ChaosIntensity::Extreme, vec![ChaosScenarioType::RandomErrors]))
            .await;

        for _ in 0..500 {
            if let InterceptResolution::Fulfilled { status, .. } = send(&system, "/api/items") {
                assert!(SERVER_ERRORS.contains(&status));
            }
        }
        let injected = chaos.metrics().failures_injected;
        // 0.7 * 0.5 of 500
        assert!((125..=225).contains(&injected), "{injected}");
    }

    #[tokio::test]
    async fn slow_responses_delay_within_scaled_range() {
        let system = MockSystem::new();
        let chaos = injector(&system, 13);
        chaos
            .start(config(ChaosIntensity::High, vec![ChaosScenarioType::SlowResponses]))
            .await;

        let mut delayed = 0;
        for _ in 0..300 {
            let resolution = send(&system, "/api/items");
            assert!(!resolution.is_failure());
            let delay = resolution.delay_ms();
            if delay > 0 {
                delayed += 1;
                assert!((1_500..=6_000).contains(&delay), "{delay}");
            }
        }
        assert_eq!(chaos.metrics().degradation_events, delayed);
        assert_eq!(chaos.metrics().failures_injected, 0);
    }

    #[tokio::test]
    async fn target_scopes_faults_to_one_organization() {
        let system = MockSystem::new();
        let chaos = injector(&system, 3);
        chaos
            .start(
                config(ChaosIntensity::Extreme, vec![ChaosScenarioType::NetworkFailures])
                    .targeting("globex"),
            )
            .await;

        for _ in 0..200 {
            assert!(!send(&system, "/api/items").is_failure());
        }
        let globex_failures = (0..200)
            .filter(|_| {
                system
                    .evaluate(&OutboundRequest::new("GET", "/api/items").for_organization("globex"))
                    .is_aborted()
            })
            .count();
        assert!(globex_failures > 0);
    }

    #[tokio::test]
    async fn direct_injectors() {
        let system = MockSystem::new();
        let chaos = injector(&system, 4);

        assert_eq!(chaos.inject_random_failures(1.5), Err(ChaosError::InvalidRate(1.5)));

        chaos.inject_latency(250).unwrap();
        chaos.inject_random_failures(1.0).unwrap();
        let resolution = send(&system, "/anything");
        assert_eq!(
            resolution,
            InterceptResolution::Aborted {
                reason: "injected failure".into(),
                delay_ms: 250
            }
        );

        chaos.stop().await;
        assert_eq!(system.rule_count(), 0);
    }

    #[test]
    fn gate_fractions() {
        assert_eq!(gate_fraction(ChaosScenarioType::NetworkFailures), 1.0);
        assert_eq!(gate_fraction(ChaosScenarioType::RandomErrors), 0.5);
        assert_eq!(gate_fraction(ChaosScenarioType::AuthFailures), 0.3);
        assert_eq!(gate_fraction(ChaosScenarioType::ApiTimeouts), 0.5);
        assert_eq!(gate_fraction(ChaosScenarioType::DeploymentInterruptions), 0.25);
    }
}
