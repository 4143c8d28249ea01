//! Predefined network conditions.
//!
//! Every profile lists at least one scenario and its probabilities sum to 1.0.

use faultline_types::{
    BandwidthProfile, ImpactMultipliers, LatencyProfile, NetworkCondition, NetworkScenario,
    NetworkScenarioKind,
};

/// Name of the profile the orchestrator uses for chaos suites.
pub const UNSTABLE: &str = "unstable";

const STABLE: ImpactMultipliers = ImpactMultipliers::IDENTITY;
const CONGESTED: ImpactMultipliers = ImpactMultipliers::new(2.5, 0.4, 3.0);
const DEGRADED: ImpactMultipliers = ImpactMultipliers::new(2.0, 0.5, 2.0);
const INTERMITTENT: ImpactMultipliers = ImpactMultipliers::new(3.0, 0.3, 4.0);
const OFFLINE: ImpactMultipliers = ImpactMultipliers::new(10.0, 0.01, 50.0);

fn condition(
    name: &str,
    latency: (f64, f64, f64),
    bandwidth: (f64, f64),
    packet_loss: f64,
    reliability: f64,
    scenarios: Vec<NetworkScenario>,
) -> NetworkCondition {
    NetworkCondition {
        name: name.to_string(),
        latency: LatencyProfile {
            min_ms: latency.0,
            max_ms: latency.1,
            jitter_ms: latency.2,
        },
        bandwidth: BandwidthProfile {
            download_kbps: bandwidth.0,
            upload_kbps: bandwidth.1,
        },
        packet_loss,
        reliability,
        scenarios,
    }
}

/// Wired fiber: fast, rarely congested.
pub fn fiber() -> NetworkCondition {
    condition(
        "fiber",
        (5.0, 15.0, 2.0),
        (100_000.0, 50_000.0),
        0.01,
        99.9,
        vec![
            NetworkScenario::new(NetworkScenarioKind::Stable, 300_000, 0.95, STABLE),
            NetworkScenario::new(NetworkScenarioKind::Congested, 30_000, 0.05, CONGESTED),
        ],
    )
}

/// Home or office wifi.
pub fn wifi() -> NetworkCondition {
    condition(
        "wifi",
        (10.0, 50.0, 10.0),
        (50_000.0, 20_000.0),
        0.5,
        99.0,
        vec![
            NetworkScenario::new(NetworkScenarioKind::Stable, 120_000, 0.80, STABLE),
            NetworkScenario::new(NetworkScenarioKind::Congested, 60_000, 0.15, CONGESTED),
            NetworkScenario::new(NetworkScenarioKind::Intermittent, 15_000, 0.05, INTERMITTENT),
        ],
    )
}

/// LTE mobile.
pub fn mobile_4g() -> NetworkCondition {
    condition(
        "mobile-4g",
        (30.0, 100.0, 20.0),
        (20_000.0, 5_000.0),
        1.0,
        98.0,
        vec![
            NetworkScenario::new(NetworkScenarioKind::Stable, 90_000, 0.70, STABLE),
            NetworkScenario::new(NetworkScenarioKind::Degraded, 60_000, 0.20, DEGRADED),
            NetworkScenario::new(NetworkScenarioKind::Intermittent, 20_000, 0.10, INTERMITTENT),
        ],
    )
}

/// 3G mobile with occasional dead zones.
pub fn mobile_3g() -> NetworkCondition {
    condition(
        "mobile-3g",
        (100.0, 500.0, 100.0),
        (2_000.0, 500.0),
        2.0,
        95.0,
        vec![
            NetworkScenario::new(NetworkScenarioKind::Stable, 60_000, 0.60, STABLE),
            NetworkScenario::new(NetworkScenarioKind::Degraded, 45_000, 0.30, DEGRADED),
            NetworkScenario::new(NetworkScenarioKind::Offline, 10_000, 0.10, OFFLINE),
        ],
    )
}

/// Geostationary satellite link.
pub fn satellite() -> NetworkCondition {
    condition(
        "satellite",
        (500.0, 700.0, 50.0),
        (10_000.0, 2_000.0),
        1.5,
        97.0,
        vec![
            NetworkScenario::new(NetworkScenarioKind::Stable, 180_000, 0.80, STABLE),
            NetworkScenario::new(NetworkScenarioKind::Degraded, 60_000, 0.20, DEGRADED),
        ],
    )
}

/// Deliberately poor link used for chaos runs.
pub fn unstable() -> NetworkCondition {
    condition(
        UNSTABLE,
        (50.0, 300.0, 80.0),
        (5_000.0, 1_000.0),
        5.0,
        90.0,
        vec![
            NetworkScenario::new(NetworkScenarioKind::Stable, 20_000, 0.30, STABLE),
            NetworkScenario::new(NetworkScenarioKind::Degraded, 30_000, 0.30, DEGRADED),
            NetworkScenario::new(NetworkScenarioKind::Intermittent, 15_000, 0.25, INTERMITTENT),
            NetworkScenario::new(NetworkScenarioKind::Offline, 10_000, 0.15, OFFLINE),
        ],
    )
}

/// Every predefined condition.
pub fn predefined() -> Vec<NetworkCondition> {
    vec![
        fiber(),
        wifi(),
        mobile_4g(),
        mobile_3g(),
        satellite(),
        unstable(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_profile_has_scenarios_summing_to_one() {
        for condition in predefined() {
            assert!(!condition.scenarios.is_empty(), "{}", condition.name);
            let total: f64 = condition.scenarios.iter().map(|s| s.probability).sum();
            assert!((total - 1.0).abs() < 1e-9, "{} sums to {}", condition.name, total);
        }
    }

    #[test]
    fn profile_names_are_unique() {
        let mut names: Vec<_> = predefined().into_iter().map(|c| c.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 6);
    }

    #[test]
    fn unstable_supports_degraded() {
        assert!(unstable().has_scenario(NetworkScenarioKind::Degraded));
        assert!(!fiber().has_scenario(NetworkScenarioKind::Offline));
    }
}
