//! Probabilistic network condition simulator.
//!
//! The simulator holds a set of named [`NetworkCondition`] profiles. One is
//! active; once started, exactly one of its scenarios is current. Every tick
//! advances the scenario clock, reselects by weighted draw when the scenario
//! has run its course, and appends a [`NetworkMetrics`] sample to a bounded
//! history.
//!
//! Ticks are driven by a background Tokio task after [`start`], or stepped
//! by hand with [`tick`]. Request latency is a logical delay on the Tokio
//! clock, so tests with a paused clock run instantly.
//!
//! [`start`]: NetworkConditionSimulator::start
//! [`tick`]: NetworkConditionSimulator::tick

use faultline_core::{rng_from, select_scenario_index, DynRng, MetricsRing};
use faultline_types::{
    BatchOutcome, ConnectionStatus, ImpactMultipliers, NetworkCondition, NetworkMetrics,
    NetworkScenario, NetworkScenarioKind, NetworkSummary, RequestOutcome,
};
use futures_util::future::join_all;
use rand::Rng;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

use crate::profiles;
use crate::SimulatorError;

/// Packet loss above which a link counts as disconnected.
const DISCONNECTED_LOSS: f64 = 50.0;
/// Packet loss above which a link counts as degraded.
const DEGRADED_LOSS: f64 = 5.0;
/// Throughput efficiency range applied to simulated requests.
const EFFICIENCY_RANGE: (f64, f64) = (0.75, 0.90);

/// Simulator settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulatorConfig {
    /// Sampling interval in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Number of samples kept in history.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Condition active at construction.
    #[serde(default = "default_condition")]
    pub initial_condition: String,

    /// Seed for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_history_capacity() -> usize {
    300
}

fn default_condition() -> String {
    "wifi".to_string()
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            history_capacity: default_history_capacity(),
            initial_condition: default_condition(),
            seed: None,
        }
    }
}

struct SimState {
    conditions: BTreeMap<String, NetworkCondition>,
    active: String,
    current: Option<usize>,
    elapsed_ms: u64,
    forced_duration_ms: Option<u64>,
    history: MetricsRing<NetworkMetrics>,
    rng: DynRng,
    running: bool,
    stopped_summary: Option<NetworkSummary>,
}

impl SimState {
    fn condition(&self) -> Option<&NetworkCondition> {
        self.conditions.get(&self.active)
    }

    fn scenario(&self) -> Option<&NetworkScenario> {
        let index = self.current?;
        self.condition()?.scenarios.get(index)
    }

    fn reselect(&mut self) {
        let roll: f64 = self.rng.gen();
        self.current = self
            .conditions
            .get(&self.active)
            .and_then(|c| select_scenario_index(&c.scenarios, roll));
        self.elapsed_ms = 0;
        self.forced_duration_ms = None;
        if let Some(scenario) = self.scenario() {
            tracing::debug!(condition = %self.active, scenario = %scenario.kind, "Network scenario selected");
        }
    }

    fn advance(&mut self, step_ms: u64) {
        if self.current.is_none() {
            self.reselect();
            return;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(step_ms);
        let duration = self
            .forced_duration_ms
            .or_else(|| self.scenario().map(|s| s.duration_ms))
            .unwrap_or(0);
        if self.elapsed_ms >= duration {
            self.reselect();
        }
    }

    fn sample(&mut self) -> NetworkMetrics {
        let (kind, impact) = match self.scenario() {
            Some(s) => (Some(s.kind), s.impact),
            None => (None, ImpactMultipliers::IDENTITY),
        };
        let Some(condition) = self.conditions.get(&self.active) else {
            return disconnected_sample();
        };

        let latency = &condition.latency;
        let base = if latency.max_ms > latency.min_ms {
            self.rng.gen_range(latency.min_ms..=latency.max_ms)
        } else {
            latency.min_ms
        };
        let jitter = if latency.jitter_ms > 0.0 {
            self.rng.gen_range(-latency.jitter_ms..=latency.jitter_ms)
        } else {
            0.0
        };

        let latency_ms = ((base + jitter) * impact.latency).max(0.0);
        let bandwidth_kbps = (condition.bandwidth.download_kbps * impact.bandwidth).max(0.0);
        let packet_loss = (condition.packet_loss * impact.packet_loss).clamp(0.0, 100.0);
        let error_rate = ((100.0 - condition.reliability) * impact.packet_loss).clamp(0.0, 100.0);

        NetworkMetrics {
            timestamp_ms: now_ms(),
            latency_ms,
            bandwidth_kbps,
            packet_loss,
            connection_status: connection_status(kind, packet_loss),
            throughput_kbps: bandwidth_kbps * (1.0 - packet_loss / 100.0),
            error_rate,
        }
    }

    fn summary(&self) -> NetworkSummary {
        let samples = self.history.len();
        if samples == 0 {
            return NetworkSummary::default();
        }
        let n = samples as f64;
        let connected = self
            .history
            .iter()
            .filter(|m| m.connection_status == ConnectionStatus::Connected)
            .count();
        NetworkSummary {
            samples,
            average_latency_ms: self.history.iter().map(|m| m.latency_ms).sum::<f64>() / n,
            average_bandwidth_kbps: self.history.iter().map(|m| m.bandwidth_kbps).sum::<f64>() / n,
            average_packet_loss: self.history.iter().map(|m| m.packet_loss).sum::<f64>() / n,
            uptime_percent: connected as f64 / n * 100.0,
        }
    }
}

fn connection_status(kind: Option<NetworkScenarioKind>, packet_loss: f64) -> ConnectionStatus {
    if packet_loss > DISCONNECTED_LOSS {
        ConnectionStatus::Disconnected
    } else if matches!(
        kind,
        Some(NetworkScenarioKind::Degraded | NetworkScenarioKind::Intermittent)
    ) || packet_loss > DEGRADED_LOSS
    {
        ConnectionStatus::Degraded
    } else {
        ConnectionStatus::Connected
    }
}

fn disconnected_sample() -> NetworkMetrics {
    NetworkMetrics {
        timestamp_ms: now_ms(),
        latency_ms: 0.0,
        bandwidth_kbps: 0.0,
        packet_loss: 100.0,
        connection_status: ConnectionStatus::Disconnected,
        throughput_kbps: 0.0,
        error_rate: 100.0,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Probabilistic network condition simulator.
pub struct NetworkConditionSimulator {
    state: Arc<Mutex<SimState>>,
    config: SimulatorConfig,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl NetworkConditionSimulator {
    /// Create a simulator with the predefined profiles.
    ///
    /// Randomness is seeded from `config.seed` when set.
    pub fn new(config: SimulatorConfig) -> Self {
        let rng = rng_from(config.seed);
        Self::with_rng(config, rng)
    }

    /// Create a simulator drawing from the given random source.
    pub fn with_rng(config: SimulatorConfig, rng: DynRng) -> Self {
        let conditions: BTreeMap<String, NetworkCondition> = profiles::predefined()
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();
        let active = if conditions.contains_key(&config.initial_condition) {
            config.initial_condition.clone()
        } else {
            default_condition()
        };

        let state = SimState {
            conditions,
            active,
            current: None,
            elapsed_ms: 0,
            forced_duration_ms: None,
            history: MetricsRing::new(config.history_capacity),
            rng,
            running: false,
            stopped_summary: None,
        };

        Self {
            state: Arc::new(Mutex::new(state)),
            config,
            task: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        lock_state(&self.state)
    }

    /// Add or replace a profile.
    pub fn register_condition(&self, condition: NetworkCondition) -> Result<(), SimulatorError> {
        if condition.scenarios.is_empty() {
            return Err(SimulatorError::EmptyCondition(condition.name));
        }
        let mut state = self.lock();
        if state.active == condition.name {
            state.current = None;
        }
        state.conditions.insert(condition.name.clone(), condition);
        if state.running && state.current.is_none() {
            state.reselect();
        }
        Ok(())
    }

    /// Names of every registered profile.
    pub fn condition_names(&self) -> Vec<String> {
        self.lock().conditions.keys().cloned().collect()
    }

    /// The active profile.
    pub fn active_condition(&self) -> Option<NetworkCondition> {
        self.lock().condition().cloned()
    }

    /// Switch the active profile and reset scenario selection.
    pub fn set_condition(&self, name: &str) -> Result<(), SimulatorError> {
        let mut state = self.lock();
        if !state.conditions.contains_key(name) {
            return Err(SimulatorError::UnknownCondition(name.to_string()));
        }
        state.active = name.to_string();
        state.current = None;
        state.elapsed_ms = 0;
        state.forced_duration_ms = None;
        if state.running {
            state.reselect();
        }
        tracing::info!(condition = %name, "Network condition set");
        Ok(())
    }

    /// Begin periodic sampling. Starting a running simulator is a no-op.
    pub fn start(&self) {
        {
            let mut state = self.lock();
            if state.running {
                return;
            }
            state.running = true;
            state.stopped_summary = None;
            if state.current.is_none() {
                state.reselect();
            }
        }

        let state = Arc::clone(&self.state);
        let step_ms = self.config.tick_interval_ms.max(1);
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(Duration::from_millis(step_ms));
            // First tick completes immediately.
            timer.tick().await;
            loop {
                timer.tick().await;
                let mut state = lock_state(&state);
                state.advance(step_ms);
                let sample = state.sample();
                state.history.push(sample);
            }
        });

        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = task.replace(handle) {
            old.abort();
        }
        tracing::info!(interval_ms = step_ms, "Network simulation started");
    }

    /// Stop sampling and return the summary.
    ///
    /// Calling it again returns the same summary.
    pub fn stop(&self) -> NetworkSummary {
        if let Some(handle) = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }

        let mut state = self.lock();
        if let Some(summary) = &state.stopped_summary {
            return summary.clone();
        }
        state.running = false;
        let summary = state.summary();
        state.stopped_summary = Some(summary.clone());
        tracing::info!(samples = summary.samples, uptime = summary.uptime_percent, "Network simulation stopped");
        summary
    }

    /// Whether the tick task is running.
    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Make `kind` current, for `duration_ms` or its own duration.
    pub fn force_scenario(
        &self,
        kind: NetworkScenarioKind,
        duration_ms: Option<u64>,
    ) -> Result<(), SimulatorError> {
        let mut state = self.lock();
        let index = state
            .condition()
            .and_then(|c| c.scenarios.iter().position(|s| s.kind == kind))
            .ok_or_else(|| SimulatorError::ScenarioNotInProfile {
                kind,
                condition: state.active.clone(),
            })?;
        state.current = Some(index);
        state.elapsed_ms = 0;
        state.forced_duration_ms = duration_ms;
        tracing::debug!(scenario = %kind, ?duration_ms, "Network scenario forced");
        Ok(())
    }

    /// The current scenario, once one has been selected.
    pub fn current_scenario(&self) -> Option<NetworkScenario> {
        self.lock().scenario().cloned()
    }

    /// A fresh sample under the current scenario (not recorded).
    pub fn current_metrics(&self) -> NetworkMetrics {
        self.lock().sample()
    }

    /// Advance by one tick interval and record a sample.
    pub fn tick(&self) -> NetworkMetrics {
        let mut state = self.lock();
        state.advance(self.config.tick_interval_ms);
        let sample = state.sample();
        state.history.push(sample.clone());
        sample
    }

    /// Recorded samples, oldest first.
    pub fn history(&self) -> Vec<NetworkMetrics> {
        self.lock().history.iter().cloned().collect()
    }

    /// Summary over the recorded samples.
    pub fn export_summary(&self) -> NetworkSummary {
        self.lock().summary()
    }

    /// Simulate one request of `size_bytes`.
    ///
    /// Waits the sampled latency on the Tokio clock, then draws success
    /// against the sample's success probability.
    pub async fn simulate_request(&self, size_bytes: u64) -> RequestOutcome {
        let metrics = self.current_metrics();
        tokio::time::sleep(Duration::from_secs_f64(metrics.latency_ms / 1000.0)).await;

        let (roll, efficiency): (f64, f64) = {
            let mut state = self.lock();
            let roll = state.rng.gen();
            let efficiency = state.rng.gen_range(EFFICIENCY_RANGE.0..=EFFICIENCY_RANGE.1);
            (roll, efficiency)
        };

        let success = roll < metrics.success_probability();
        let throughput_kbps = metrics.bandwidth_kbps * efficiency;
        let transfer_time_ms = if throughput_kbps > 0.0 {
            size_bytes as f64 * 8.0 / throughput_kbps
        } else {
            0.0
        };

        RequestOutcome {
            success,
            latency_ms: metrics.latency_ms,
            throughput_kbps,
            transfer_time_ms,
        }
    }

    /// Simulate `count` requests, at most `concurrency` at a time.
    ///
    /// Requests run in waves; each wave completes before the next starts.
    pub async fn simulate_request_batch(
        &self,
        count: usize,
        size_bytes: u64,
        concurrency: usize,
    ) -> BatchOutcome {
        let wave = concurrency.max(1);
        let mut outcomes = Vec::with_capacity(count);
        let mut remaining = count;
        while remaining > 0 {
            let n = remaining.min(wave);
            let results = join_all((0..n).map(|_| self.simulate_request(size_bytes))).await;
            outcomes.extend(results);
            remaining -= n;
        }

        if outcomes.is_empty() {
            return BatchOutcome::default();
        }
        let total = outcomes.len();
        let successful = outcomes.iter().filter(|o| o.success).count();
        BatchOutcome {
            total,
            successful,
            failed: total - successful,
            average_latency_ms: outcomes.iter().map(|o| o.latency_ms).sum::<f64>() / total as f64,
            average_throughput_kbps: outcomes.iter().map(|o| o.throughput_kbps).sum::<f64>()
                / total as f64,
        }
    }
}

impl Default for NetworkConditionSimulator {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

impl Drop for NetworkConditionSimulator {
    fn drop(&mut self) {
        if let Some(handle) = self
            .task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

fn lock_state(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_core::seeded;
    use faultline_types::{BandwidthProfile, LatencyProfile};

    fn simulator(condition: &str, seed: u64) -> NetworkConditionSimulator {
        let config = SimulatorConfig {
            initial_condition: condition.to_string(),
            ..Default::default()
        };
        NetworkConditionSimulator::with_rng(config, seeded(seed))
    }

    fn two_step_condition() -> NetworkCondition {
        NetworkCondition {
            name: "two-step".into(),
            latency: LatencyProfile {
                min_ms: 10.0,
                max_ms: 10.0,
                jitter_ms: 0.0,
            },
            bandwidth: BandwidthProfile {
                download_kbps: 1_000.0,
                upload_kbps: 500.0,
            },
            packet_loss: 1.0,
            reliability: 99.0,
            scenarios: vec![
                NetworkScenario::new(NetworkScenarioKind::Stable, 2_000, 0.0, ImpactMultipliers::IDENTITY),
                NetworkScenario::new(
                    NetworkScenarioKind::Congested,
                    60_000,
                    1.0,
                    ImpactMultipliers::new(2.0, 0.5, 2.0),
                ),
            ],
        }
    }

    // ===========================================
    // Lifecycle
    // ===========================================

    #[tokio::test]
    async fn every_predefined_profile_has_a_current_scenario_after_start() {
        for condition in profiles::predefined() {
            for seed in 0..20 {
                let sim = simulator(&condition.name, seed);
                sim.start();
                assert!(
                    sim.current_scenario().is_some(),
                    "{} seed {}",
                    condition.name,
                    seed
                );
                sim.stop();
            }
        }
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let sim = simulator("wifi", 1);
        sim.start();
        for _ in 0..5 {
            sim.tick();
        }
        let first = sim.stop();
        let second = sim.stop();
        assert_eq!(first, second);
        assert_eq!(first.samples, 5);
        assert!(!sim.is_running());
    }

    #[tokio::test]
    async fn stop_without_start_returns_empty_summary() {
        let sim = simulator("wifi", 1);
        assert_eq!(sim.stop(), NetworkSummary::default());
        assert_eq!(sim.stop(), NetworkSummary::default());
    }

    #[tokio::test(start_paused = true)]
    async fn background_task_samples_every_tick() {
        let sim = simulator("fiber", 3);
        sim.start();
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        let summary = sim.stop();
        assert_eq!(summary.samples, 5);

        tokio::time::sleep(Duration::from_millis(3_000)).await;
        assert_eq!(sim.history().len(), 5);
    }

    #[test]
    fn unknown_condition_is_rejected() {
        let sim = simulator("wifi", 1);
        assert_eq!(
            sim.set_condition("dial-up"),
            Err(SimulatorError::UnknownCondition("dial-up".into()))
        );
    }

    #[test]
    fn set_condition_resets_selection() {
        let sim = simulator("unstable", 1);
        sim.force_scenario(NetworkScenarioKind::Offline, None).unwrap();
        sim.set_condition("fiber").unwrap();
        assert!(sim.current_scenario().is_none());
        sim.tick();
        assert!(sim.current_scenario().is_some());
    }

    #[test]
    fn empty_condition_cannot_be_registered() {
        let sim = simulator("wifi", 1);
        let mut condition = two_step_condition();
        condition.scenarios.clear();
        assert!(matches!(
            sim.register_condition(condition),
            Err(SimulatorError::EmptyCondition(_))
        ));
    }

    // ===========================================
    // Scenarios and sampling
    // ===========================================

    #[test]
    fn forcing_a_missing_scenario_errors() {
        let sim = simulator("fiber", 1);
        let err = sim
            .force_scenario(NetworkScenarioKind::Offline, None)
            .unwrap_err();
        assert_eq!(
            err,
            SimulatorError::ScenarioNotInProfile {
                kind: NetworkScenarioKind::Offline,
                condition: "fiber".into()
            }
        );
    }

    #[test]
    fn scenario_transitions_when_duration_elapses() {
        let sim = simulator("wifi", 1);
        sim.register_condition(two_step_condition()).unwrap();
        sim.set_condition("two-step").unwrap();
        sim.force_scenario(NetworkScenarioKind::Stable, None).unwrap();

        sim.tick();
        assert_eq!(
            sim.current_scenario().map(|s| s.kind),
            Some(NetworkScenarioKind::Stable)
        );
        sim.tick();
        assert_eq!(
            sim.current_scenario().map(|s| s.kind),
            Some(NetworkScenarioKind::Congested)
        );
    }

    #[test]
    fn forced_duration_overrides_scenario_duration() {
        let sim = simulator("wifi", 1);
        sim.register_condition(two_step_condition()).unwrap();
        sim.set_condition("two-step").unwrap();
        sim.force_scenario(NetworkScenarioKind::Stable, Some(5_000)).unwrap();

        for _ in 0..4 {
            sim.tick();
        }
        assert_eq!(
            sim.current_scenario().map(|s| s.kind),
            Some(NetworkScenarioKind::Stable)
        );
        sim.tick();
        assert_eq!(
            sim.current_scenario().map(|s| s.kind),
            Some(NetworkScenarioKind::Congested)
        );
    }

    #[test]
    fn sample_applies_impact_multipliers() {
        let sim = simulator("wifi", 1);
        sim.register_condition(two_step_condition()).unwrap();
        sim.set_condition("two-step").unwrap();
        sim.force_scenario(NetworkScenarioKind::Congested, None).unwrap();

        let m = sim.current_metrics();
        assert_eq!(m.latency_ms, 20.0);
        assert_eq!(m.bandwidth_kbps, 500.0);
        assert_eq!(m.packet_loss, 2.0);
        assert_eq!(m.error_rate, 2.0);
        assert_eq!(m.connection_status, ConnectionStatus::Connected);
    }

    #[test]
    fn latency_stays_within_profile_bounds() {
        let sim = simulator("fiber", 5);
        sim.force_scenario(NetworkScenarioKind::Stable, None).unwrap();
        for _ in 0..200 {
            let m = sim.current_metrics();
            assert!(m.latency_ms >= 3.0 && m.latency_ms <= 17.0, "{}", m.latency_ms);
        }
    }

    #[test]
    fn connection_status_thresholds() {
        assert_eq!(
            connection_status(Some(NetworkScenarioKind::Stable), 51.0),
            ConnectionStatus::Disconnected
        );
        assert_eq!(
            connection_status(Some(NetworkScenarioKind::Stable), 50.0),
            ConnectionStatus::Degraded
        );
        assert_eq!(
            connection_status(Some(NetworkScenarioKind::Degraded), 0.0),
            ConnectionStatus::Degraded
        );
        assert_eq!(
            connection_status(Some(NetworkScenarioKind::Intermittent), 1.0),
            ConnectionStatus::Degraded
        );
        assert_eq!(
            connection_status(Some(NetworkScenarioKind::Congested), 5.0),
            ConnectionStatus::Connected
        );
    }

    #[test]
    fn offline_scenario_disconnects() {
        let sim = simulator("unstable", 1);
        sim.force_scenario(NetworkScenarioKind::Offline, None).unwrap();
        let m = sim.current_metrics();
        assert_eq!(m.packet_loss, 100.0);
        assert_eq!(m.connection_status, ConnectionStatus::Disconnected);
        assert_eq!(m.success_probability(), 0.0);
    }

    #[test]
    fn history_is_bounded() {
        let config = SimulatorConfig {
            history_capacity: 5,
            ..Default::default()
        };
        let sim = NetworkConditionSimulator::with_rng(config, seeded(1));
        for _ in 0..12 {
            sim.tick();
        }
        assert_eq!(sim.history().len(), 5);
        assert_eq!(sim.export_summary().samples, 5);
    }

    #[test]
    fn uptime_counts_connected_samples() {
        let sim = simulator("unstable", 1);
        sim.force_scenario(NetworkScenarioKind::Stable, Some(60_000)).unwrap();
        sim.tick();
        sim.tick();
        sim.force_scenario(NetworkScenarioKind::Offline, Some(60_000)).unwrap();
        sim.tick();
        sim.tick();
        let summary = sim.export_summary();
        assert_eq!(summary.samples, 4);
        assert_eq!(summary.uptime_percent, 50.0);
    }

    // ===========================================
    // Simulated requests
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn success_rate_converges_to_expected_probability() {
        let sim = simulator("unstable", 42);
        sim.force_scenario(NetworkScenarioKind::Degraded, None).unwrap();
        let expected = sim.current_metrics().success_probability();

        let batch = sim.simulate_request_batch(2_000, 1_024, 50).await;
        let observed = batch.successful as f64 / batch.total as f64;
        assert!(
            (observed - expected).abs() < 0.05,
            "observed {observed}, expected {expected}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn request_waits_latency_on_tokio_clock() {
        let sim = simulator("satellite", 7);
        sim.force_scenario(NetworkScenarioKind::Stable, None).unwrap();
        let start = tokio::time::Instant::now();
        let outcome = sim.simulate_request(10_000).await;
        assert!(start.elapsed() >= Duration::from_millis(400));
        assert!(outcome.latency_ms >= 450.0);
        assert!(outcome.transfer_time_ms > 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn throughput_uses_efficiency_band() {
        let sim = simulator("wifi", 11);
        sim.register_condition(two_step_condition()).unwrap();
        sim.set_condition("two-step").unwrap();
        sim.force_scenario(NetworkScenarioKind::Stable, Some(u64::MAX)).unwrap();

        for _ in 0..50 {
            let outcome = sim.simulate_request(1_000).await;
            assert!(outcome.throughput_kbps >= 750.0 && outcome.throughput_kbps <= 900.0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn batch_processes_every_request_in_waves() {
        let sim = simulator("fiber", 2);
        let batch = sim.simulate_request_batch(10, 512, 3).await;
        assert_eq!(batch.total, 10);
        assert_eq!(batch.successful + batch.failed, 10);
        assert!(batch.average_latency_ms > 0.0);
    }

    #[tokio::test]
    async fn empty_batch_is_all_zeros() {
        let sim = simulator("fiber", 2);
        let batch = sim.simulate_request_batch(0, 512, 0).await;
        assert_eq!(batch, BatchOutcome::default());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: SimulatorConfig = serde_json::from_str(r#"{"seed": 9}"#).unwrap();
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.history_capacity, 300);
        assert_eq!(config.initial_condition, "wifi");
        assert_eq!(config.seed, Some(9));
    }
}
