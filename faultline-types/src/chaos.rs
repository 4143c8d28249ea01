//! Fault-injection model: intensities, scenario types, severities and metrics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Chaos dial controlling failure rate and delay magnitude.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ChaosIntensity {
    /// 10% failure band
    Low,
    /// 30% failure band
    #[default]
    Medium,
    /// 50% failure band
    High,
    /// 70% failure band
    Extreme,
}

impl ChaosIntensity {
    /// All intensities, mildest first.
    pub const ALL: [ChaosIntensity; 4] = [
        ChaosIntensity::Low,
        ChaosIntensity::Medium,
        ChaosIntensity::High,
        ChaosIntensity::Extreme,
    ];

    /// Base failure rate of this intensity band.
    pub fn failure_rate(&self) -> f64 {
        match self {
            ChaosIntensity::Low => 0.10,
            ChaosIntensity::Medium => 0.30,
            ChaosIntensity::High => 0.50,
            ChaosIntensity::Extreme => 0.70,
        }
    }

    /// Multiplier applied to the slow-response delay range.
    pub fn delay_multiplier(&self) -> u64 {
        match self {
            ChaosIntensity::Low => 1,
            ChaosIntensity::Medium => 2,
            ChaosIntensity::High => 3,
            ChaosIntensity::Extreme => 5,
        }
    }

    /// Stable wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChaosIntensity::Low => "low",
            ChaosIntensity::Medium => "medium",
            ChaosIntensity::High => "high",
            ChaosIntensity::Extreme => "extreme",
        }
    }
}

impl fmt::Display for ChaosIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChaosIntensity {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| TypesError::UnknownIntensity(s.to_string()))
    }
}

/// Static severity classification of a fault type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    /// No user-visible effect
    None,
    /// Minor degradation
    Low,
    /// Noticeable degradation
    Medium,
    /// Partial outage
    High,
    /// Full outage or data risk
    Critical,
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Impact::None => "none",
            Impact::Low => "low",
            Impact::Medium => "medium",
            Impact::High => "high",
            Impact::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Catalog of injectable fault types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChaosScenarioType {
    /// Abort outbound requests
    NetworkFailures,
    /// Delay outbound requests
    SlowResponses,
    /// Answer with server errors
    RandomErrors,
    /// Client-side memory pressure
    MemoryPressure,
    /// Client-side CPU throttling
    CpuThrottling,
    /// Client-side storage failures
    StorageErrors,
    /// Answer auth calls with 401
    AuthFailures,
    /// Time out API calls
    ApiTimeouts,
    /// Interrupt deployment calls
    DeploymentInterruptions,
    /// Exhaust client-side resources
    ResourceExhaustion,
}

impl ChaosScenarioType {
    /// Every fault type, in catalog order.
    pub const ALL: [ChaosScenarioType; 10] = [
        ChaosScenarioType::NetworkFailures,
        ChaosScenarioType::SlowResponses,
        ChaosScenarioType::RandomErrors,
        ChaosScenarioType::MemoryPressure,
        ChaosScenarioType::CpuThrottling,
        ChaosScenarioType::StorageErrors,
        ChaosScenarioType::AuthFailures,
        ChaosScenarioType::ApiTimeouts,
        ChaosScenarioType::DeploymentInterruptions,
        ChaosScenarioType::ResourceExhaustion,
    ];

    /// Default severity of this fault type.
    pub fn severity(&self) -> Impact {
        match self {
            ChaosScenarioType::NetworkFailures => Impact::High,
            ChaosScenarioType::SlowResponses => Impact::Medium,
            ChaosScenarioType::RandomErrors => Impact::Medium,
            ChaosScenarioType::MemoryPressure => Impact::High,
            ChaosScenarioType::CpuThrottling => Impact::Medium,
            ChaosScenarioType::StorageErrors => Impact::High,
            ChaosScenarioType::AuthFailures => Impact::Critical,
            ChaosScenarioType::ApiTimeouts => Impact::High,
            ChaosScenarioType::DeploymentInterruptions => Impact::Critical,
            ChaosScenarioType::ResourceExhaustion => Impact::Critical,
        }
    }

    /// Whether this type simulates client-side pressure instead of gating requests.
    pub fn is_resource_pressure(&self) -> bool {
        match self {
            ChaosScenarioType::MemoryPressure
            | ChaosScenarioType::CpuThrottling
            | ChaosScenarioType::StorageErrors
            | ChaosScenarioType::ResourceExhaustion => true,
            ChaosScenarioType::NetworkFailures
            | ChaosScenarioType::SlowResponses
            | ChaosScenarioType::RandomErrors
            | ChaosScenarioType::AuthFailures
            | ChaosScenarioType::ApiTimeouts
            | ChaosScenarioType::DeploymentInterruptions => false,
        }
    }

    /// Stable wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChaosScenarioType::NetworkFailures => "network_failures",
            ChaosScenarioType::SlowResponses => "slow_responses",
            ChaosScenarioType::RandomErrors => "random_errors",
            ChaosScenarioType::MemoryPressure => "memory_pressure",
            ChaosScenarioType::CpuThrottling => "cpu_throttling",
            ChaosScenarioType::StorageErrors => "storage_errors",
            ChaosScenarioType::AuthFailures => "auth_failures",
            ChaosScenarioType::ApiTimeouts => "api_timeouts",
            ChaosScenarioType::DeploymentInterruptions => "deployment_interruptions",
            ChaosScenarioType::ResourceExhaustion => "resource_exhaustion",
        }
    }
}

impl fmt::Display for ChaosScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChaosScenarioType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TypesError::UnknownChaosScenario(s.to_string()))
    }
}

/// Per-run overrides of the static severity map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeverityOverrides(BTreeMap<ChaosScenarioType, Impact>);

impl SeverityOverrides {
    /// No overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the severity of one fault type.
    pub fn with(mut self, scenario: ChaosScenarioType, impact: Impact) -> Self {
        self.0.insert(scenario, impact);
        self
    }

    /// Effective severity: the override if present, the static map otherwise.
    pub fn impact_of(&self, scenario: ChaosScenarioType) -> Impact {
        self.0
            .get(&scenario)
            .copied()
            .unwrap_or_else(|| scenario.severity())
    }
}

/// Configuration of one chaos run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaosConfig {
    /// Master switch.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Failure-rate band.
    #[serde(default)]
    pub intensity: ChaosIntensity,
    /// Auto-stop delay in milliseconds.
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
    /// Fault types to install.
    #[serde(default)]
    pub scenarios: Vec<ChaosScenarioType>,
    /// Restrict interception to requests tagged with this organization.
    #[serde(default)]
    pub target: Option<String>,
    /// Severity overrides for impact classification.
    #[serde(default)]
    pub severity: SeverityOverrides,
}

fn default_enabled() -> bool {
    true
}

fn default_duration_ms() -> u64 {
    5 * 60 * 1000 // 5 minutes
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            intensity: ChaosIntensity::default(),
            duration_ms: default_duration_ms(),
            scenarios: Vec::new(),
            target: None,
            severity: SeverityOverrides::default(),
        }
    }
}

impl ChaosConfig {
    /// Config with the given intensity and fault types, defaults elsewhere.
    pub fn new(intensity: ChaosIntensity, scenarios: Vec<ChaosScenarioType>) -> Self {
        Self {
            intensity,
            scenarios,
            ..Default::default()
        }
    }

    /// Scope interception rules to one organization.
    pub fn targeting(mut self, organization: &str) -> Self {
        self.target = Some(organization.to_string());
        self
    }

    /// Set the auto-stop delay.
    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Counters accumulated by one injector between resets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaosMetrics {
    /// Fault types installed.
    pub scenarios_executed: u64,
    /// Individual faults applied to requests or resources.
    pub failures_injected: u64,
    /// Fault types cleanly removed.
    pub system_recoveries: u64,
    /// Requests delayed rather than failed.
    pub degradation_events: u64,
    /// Faults of critical severity applied.
    pub critical_failures: u64,
    /// Total time spent removing faults, in milliseconds.
    pub recovery_time_ms: u64,
}

/// Outcome of installing one fault type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaosScenarioResult {
    /// Fault type.
    pub scenario: ChaosScenarioType,
    /// Whether the fault was installed.
    pub success: bool,
    /// Severity classification.
    pub impact: Impact,
    /// Time spent installing, in milliseconds.
    pub duration_ms: u64,
    /// Time spent removing, once removed.
    pub recovery_time_ms: Option<u64>,
    /// Install errors.
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_rates_are_strictly_monotonic() {
        let rates: Vec<f64> = ChaosIntensity::ALL.iter().map(|i| i.failure_rate()).collect();
        assert_eq!(rates, vec![0.10, 0.30, 0.50, 0.70]);
        for pair in rates.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn every_scenario_type_has_a_severity() {
        for scenario in ChaosScenarioType::ALL {
            let _ = scenario.severity();
        }
        assert_eq!(
            ChaosScenarioType::DeploymentInterruptions.severity(),
            Impact::Critical
        );
        assert_eq!(ChaosScenarioType::SlowResponses.severity(), Impact::Medium);
    }

    #[test]
    fn scenario_type_round_trips_wire_name() {
        for scenario in ChaosScenarioType::ALL {
            let parsed: ChaosScenarioType = scenario.as_str().parse().unwrap();
            assert_eq!(parsed, scenario);
            let json = serde_json::to_string(&scenario).unwrap();
            assert_eq!(json, format!("\"{}\"", scenario.as_str()));
        }
    }

    #[test]
    fn unknown_intensity_is_rejected() {
        assert_eq!(
            "brutal".parse::<ChaosIntensity>(),
            Err(TypesError::UnknownIntensity("brutal".into()))
        );
    }

    #[test]
    fn severity_overrides_fall_back_to_static_map() {
        let overrides =
            SeverityOverrides::new().with(ChaosScenarioType::SlowResponses, Impact::Critical);
        assert_eq!(
            overrides.impact_of(ChaosScenarioType::SlowResponses),
            Impact::Critical
        );
        assert_eq!(
            overrides.impact_of(ChaosScenarioType::NetworkFailures),
            Impact::High
        );
    }

    #[test]
    fn chaos_config_deserializes_with_defaults() {
        let json = r#"{"intensity":"extreme","scenarios":["network_failures"]}"#;
        let config: ChaosConfig = serde_json::from_str(json).unwrap();
        assert!(config.enabled);
        assert_eq!(config.intensity, ChaosIntensity::Extreme);
        assert_eq!(config.scenarios, vec![ChaosScenarioType::NetworkFailures]);
        assert_eq!(config.duration_ms, 300_000);
        assert!(config.target.is_none());
    }

    #[test]
    fn pressure_types_are_classified() {
        let pressure: Vec<_> = ChaosScenarioType::ALL
            .into_iter()
            .filter(|t| t.is_resource_pressure())
            .collect();
        assert_eq!(pressure.len(), 4);
        assert!(pressure.contains(&ChaosScenarioType::StorageErrors));
    }
}
