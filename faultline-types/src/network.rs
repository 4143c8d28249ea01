//! Network condition model for the probabilistic network simulator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Kind of network behaviour a scenario represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkScenarioKind {
    /// Nominal conditions
    Stable,
    /// Elevated latency and reduced bandwidth
    Degraded,
    /// Connection flaps in and out
    Intermittent,
    /// Shared link saturated by other traffic
    Congested,
    /// No connectivity
    Offline,
}

impl NetworkScenarioKind {
    /// All kinds, in declaration order.
    pub const ALL: [NetworkScenarioKind; 5] = [
        NetworkScenarioKind::Stable,
        NetworkScenarioKind::Degraded,
        NetworkScenarioKind::Intermittent,
        NetworkScenarioKind::Congested,
        NetworkScenarioKind::Offline,
    ];

    /// Stable wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkScenarioKind::Stable => "stable",
            NetworkScenarioKind::Degraded => "degraded",
            NetworkScenarioKind::Intermittent => "intermittent",
            NetworkScenarioKind::Congested => "congested",
            NetworkScenarioKind::Offline => "offline",
        }
    }
}

impl fmt::Display for NetworkScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkScenarioKind {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| TypesError::UnknownNetworkScenario(s.to_string()))
    }
}

/// Multipliers a scenario applies on top of a profile's baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactMultipliers {
    /// Latency multiplier.
    pub latency: f64,
    /// Bandwidth multiplier.
    pub bandwidth: f64,
    /// Packet loss multiplier.
    pub packet_loss: f64,
}

impl ImpactMultipliers {
    /// Multipliers that leave the baseline untouched.
    pub const IDENTITY: ImpactMultipliers = ImpactMultipliers {
        latency: 1.0,
        bandwidth: 1.0,
        packet_loss: 1.0,
    };

    /// Create a new set of multipliers.
    pub const fn new(latency: f64, bandwidth: f64, packet_loss: f64) -> Self {
        Self {
            latency,
            bandwidth,
            packet_loss,
        }
    }
}

impl Default for ImpactMultipliers {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A weighted, timed network scenario within a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkScenario {
    /// Scenario kind.
    pub kind: NetworkScenarioKind,
    /// How long the scenario stays current once selected.
    pub duration_ms: u64,
    /// Selection weight (probabilities of a profile should sum to 1.0).
    pub probability: f64,
    /// Multipliers applied to the baseline while current.
    pub impact: ImpactMultipliers,
}

impl NetworkScenario {
    /// Create a new scenario.
    pub fn new(
        kind: NetworkScenarioKind,
        duration_ms: u64,
        probability: f64,
        impact: ImpactMultipliers,
    ) -> Self {
        Self {
            kind,
            duration_ms,
            probability,
            impact,
        }
    }
}

/// Baseline latency of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyProfile {
    /// Minimum round-trip latency in milliseconds.
    pub min_ms: f64,
    /// Maximum round-trip latency in milliseconds.
    pub max_ms: f64,
    /// Jitter amplitude in milliseconds.
    pub jitter_ms: f64,
}

/// Baseline bandwidth of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandwidthProfile {
    /// Download bandwidth in kbit/s.
    pub download_kbps: f64,
    /// Upload bandwidth in kbit/s.
    pub upload_kbps: f64,
}

/// A named network quality profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkCondition {
    /// Profile name (e.g. `mobile-4g`).
    pub name: String,
    /// Baseline latency.
    pub latency: LatencyProfile,
    /// Baseline bandwidth.
    pub bandwidth: BandwidthProfile,
    /// Baseline packet loss percentage (0.0–100.0).
    pub packet_loss: f64,
    /// Baseline reliability percentage (0.0–100.0).
    pub reliability: f64,
    /// Scenarios the simulator draws from, in selection order.
    pub scenarios: Vec<NetworkScenario>,
}

impl NetworkCondition {
    /// Whether the profile lists a scenario of the given kind.
    pub fn has_scenario(&self, kind: NetworkScenarioKind) -> bool {
        self.scenarios.iter().any(|s| s.kind == kind)
    }

    /// Find the first scenario of the given kind.
    pub fn scenario(&self, kind: NetworkScenarioKind) -> Option<&NetworkScenario> {
        self.scenarios.iter().find(|s| s.kind == kind)
    }
}

/// Connection quality derived from a metrics sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Nominal connectivity
    Connected,
    /// Usable but impaired
    Degraded,
    /// Effectively unusable
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Degraded => write!(f, "degraded"),
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// A point-in-time network sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    /// Unix timestamp in milliseconds.
    pub timestamp_ms: u64,
    /// Sampled latency in milliseconds.
    pub latency_ms: f64,
    /// Effective bandwidth in kbit/s.
    pub bandwidth_kbps: f64,
    /// Packet loss percentage (0.0–100.0).
    pub packet_loss: f64,
    /// Derived connection status.
    pub connection_status: ConnectionStatus,
    /// Estimated throughput in kbit/s.
    pub throughput_kbps: f64,
    /// Error rate percentage (0.0–100.0).
    pub error_rate: f64,
}

impl NetworkMetrics {
    /// Probability that a single request succeeds under this sample.
    pub fn success_probability(&self) -> f64 {
        ((1.0 - self.packet_loss / 100.0) * (1.0 - self.error_rate / 100.0)).clamp(0.0, 1.0)
    }
}

/// Aggregate view over the retained samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSummary {
    /// Number of retained samples.
    pub samples: usize,
    /// Mean latency in milliseconds.
    pub average_latency_ms: f64,
    /// Mean bandwidth in kbit/s.
    pub average_bandwidth_kbps: f64,
    /// Mean packet loss percentage.
    pub average_packet_loss: f64,
    /// Share of samples with `connected` status, as a percentage.
    pub uptime_percent: f64,
}

/// Outcome of one simulated request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOutcome {
    /// Whether the request went through.
    pub success: bool,
    /// Latency applied to the request in milliseconds.
    pub latency_ms: f64,
    /// Achieved throughput in kbit/s.
    pub throughput_kbps: f64,
    /// Time needed to move the payload at that throughput, in milliseconds.
    pub transfer_time_ms: f64,
}

/// Aggregate outcome of a batch of simulated requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Requests issued.
    pub total: usize,
    /// Requests that succeeded.
    pub successful: usize,
    /// Requests that failed.
    pub failed: usize,
    /// Mean latency in milliseconds.
    pub average_latency_ms: f64,
    /// Mean throughput in kbit/s.
    pub average_throughput_kbps: f64,
}

impl BatchOutcome {
    /// Success share as a percentage; 0 for an empty batch.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.successful as f64 / self.total as f64 * 100.0
    }
}
