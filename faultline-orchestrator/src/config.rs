//! Orchestration run configuration.
//!
//! Built in code or loaded from a TOML settings file. Every field has a
//! default, so a file only needs to list the organizations:
//!
//! ```toml
//! organizations = ["acme", "globex"]
//! test_suites = ["smoke", "chaos"]
//! enable_chaos_mode = true
//!
//! [chaos]
//! intensity = "high"
//! ```

use faultline_chaos::SimulatorConfig;
use faultline_core::{ComplianceProfile, SlaThresholds};
use faultline_types::{
    ChaosConfig, ChaosIntensity, ChaosScenarioType, ReportingLevel, SeverityOverrides, TestSuite,
};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Root configuration of one orchestration run.
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestrationConfig {
    /// Sessions allocated per organization (default: 3).
    #[serde(default = "default_parallel_sessions")]
    pub parallel_sessions: usize,
    /// Organizations under test.
    #[serde(default)]
    pub organizations: Vec<String>,
    /// Environments each organization is tested in (default: `staging`).
    #[serde(default = "default_environments")]
    pub environments: Vec<String>,
    /// Suites to run (default: `smoke`).
    #[serde(default = "default_test_suites")]
    pub test_suites: Vec<TestSuite>,
    /// Inject faults during the chaos suite (default: false).
    #[serde(default)]
    pub enable_chaos_mode: bool,
    /// Simulate the network and probe it after every scenario (default: false).
    #[serde(default)]
    pub enable_network_simulation: bool,
    /// Check organization compliance requirements (default: true).
    #[serde(default = "default_true")]
    pub enable_compliance_validation: bool,
    /// Record wall-clock time per scenario (default: true).
    #[serde(default = "default_true")]
    pub enable_performance_monitoring: bool,
    /// Budget for the whole run in milliseconds (default: 30 minutes).
    #[serde(default = "default_max_execution_time_ms")]
    pub max_execution_time_ms: u64,
    /// Report detail.
    #[serde(default)]
    pub reporting_level: ReportingLevel,
    /// SLA thresholds (default: deploy < 60 s, rollback < 30 s).
    #[serde(default)]
    pub sla: SlaThresholds,
    /// Compliance requirements per organization; unlisted ones get the default profile.
    #[serde(default)]
    pub compliance_profiles: BTreeMap<String, ComplianceProfile>,
    /// Fault injection used by the chaos suite.
    #[serde(default)]
    pub chaos: ChaosSettings,
    /// Network simulation and probe traffic.
    #[serde(default)]
    pub network: NetworkSettings,
    /// Seed for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Fault injection settings for the chaos suite.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChaosSettings {
    /// Intensity band (default: medium).
    #[serde(default)]
    pub intensity: ChaosIntensity,
    /// Fault types installed for each organization.
    #[serde(default = "default_chaos_scenarios")]
    pub scenarios: Vec<ChaosScenarioType>,
    /// Severity overrides.
    #[serde(default)]
    pub severity: SeverityOverrides,
}

/// Network simulation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSettings {
    /// Simulator settings; `initial_condition` applies outside the chaos suite.
    #[serde(default = "default_simulator")]
    pub simulator: SimulatorConfig,
    /// Probe requests sent after each scenario (default: 20).
    #[serde(default = "default_probe_requests")]
    pub probe_requests: usize,
    /// Probe payload in bytes (default: 64 KiB).
    #[serde(default = "default_probe_size_bytes")]
    pub probe_size_bytes: u64,
    /// Probe requests in flight at once (default: 5).
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,
    /// Probe success percentage required to pass (default: 50).
    #[serde(default = "default_min_probe_success")]
    pub min_probe_success: f64,
}

// Default value functions
fn default_parallel_sessions() -> usize {
    3
}

fn default_environments() -> Vec<String> {
    vec!["staging".to_string()]
}

fn default_test_suites() -> Vec<TestSuite> {
    vec![TestSuite::Smoke]
}

fn default_true() -> bool {
    true
}

fn default_max_execution_time_ms() -> u64 {
    30 * 60 * 1000 // 30 minutes
}

fn default_chaos_scenarios() -> Vec<ChaosScenarioType> {
    vec![
        ChaosScenarioType::NetworkFailures,
        ChaosScenarioType::SlowResponses,
        ChaosScenarioType::RandomErrors,
        ChaosScenarioType::ApiTimeouts,
    ]
}

fn default_simulator() -> SimulatorConfig {
    SimulatorConfig::default()
}

fn default_probe_requests() -> usize {
    20
}

fn default_probe_size_bytes() -> u64 {
    64 * 1024
}

fn default_probe_concurrency() -> usize {
    5
}

fn default_min_probe_success() -> f64 {
    50.0
}

impl Default for ChaosSettings {
    fn default() -> Self {
        Self {
            intensity: ChaosIntensity::default(),
            scenarios: default_chaos_scenarios(),
            severity: SeverityOverrides::default(),
        }
    }
}

impl ChaosSettings {
    /// Injector config scoped to one organization, auto-stopping after `duration_ms`.
    pub fn config_for(&self, organization: &str, duration_ms: u64) -> ChaosConfig {
        let mut config = ChaosConfig::new(self.intensity, self.scenarios.clone())
            .targeting(organization)
            .duration_ms(duration_ms);
        config.severity = self.severity.clone();
        config
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            simulator: default_simulator(),
            probe_requests: default_probe_requests(),
            probe_size_bytes: default_probe_size_bytes(),
            probe_concurrency: default_probe_concurrency(),
            min_probe_success: default_min_probe_success(),
        }
    }
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            parallel_sessions: default_parallel_sessions(),
            organizations: Vec::new(),
            environments: default_environments(),
            test_suites: default_test_suites(),
            enable_chaos_mode: false,
            enable_network_simulation: false,
            enable_compliance_validation: default_true(),
            enable_performance_monitoring: default_true(),
            max_execution_time_ms: default_max_execution_time_ms(),
            reporting_level: ReportingLevel::default(),
            sla: SlaThresholds::default(),
            compliance_profiles: BTreeMap::new(),
            chaos: ChaosSettings::default(),
            network: NetworkSettings::default(),
            seed: None,
        }
    }
}

impl OrchestrationConfig {
    /// Default configuration for the given organizations.
    pub fn for_organizations<I, S>(organizations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            organizations: organizations.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Compliance profile of an organization.
    pub fn compliance_profile(&self, organization: &str) -> ComplianceProfile {
        self.compliance_profiles
            .get(organization)
            .cloned()
            .unwrap_or_default()
    }

    /// Check the configuration before anything runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.organizations.is_empty() {
            return Err(ConfigError::Invalid("no organizations configured".into()));
        }
        let mut seen = BTreeSet::new();
        for organization in &self.organizations {
            if organization.trim().is_empty() {
                return Err(ConfigError::Invalid("organization name is empty".into()));
            }
            if !seen.insert(organization.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "organization {} listed twice",
                    organization
                )));
            }
        }
        if self.environments.is_empty() {
            return Err(ConfigError::Invalid("no environments configured".into()));
        }
        if self.test_suites.is_empty() {
            return Err(ConfigError::Invalid("no test suites configured".into()));
        }
        if self.parallel_sessions == 0 {
            return Err(ConfigError::Invalid(
                "parallel_sessions must be at least 1".into(),
            ));
        }
        if self.max_execution_time_ms == 0 {
            return Err(ConfigError::Invalid(
                "max_execution_time_ms must be positive".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.network.min_probe_success) {
            return Err(ConfigError::Invalid(format!(
                "min_probe_success {} outside 0..=100",
                self.network.min_probe_success
            )));
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// The configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_core::ComplianceRequirement;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let config = OrchestrationConfig::default();
        assert_eq!(config.parallel_sessions, 3);
        assert_eq!(config.environments, vec!["staging".to_string()]);
        assert_eq!(config.test_suites, vec![TestSuite::Smoke]);
        assert!(!config.enable_chaos_mode);
        assert!(!config.enable_network_simulation);
        assert!(config.enable_compliance_validation);
        assert_eq!(config.max_execution_time_ms, 1_800_000);
        assert_eq!(config.sla, SlaThresholds::default());
        assert_eq!(config.reporting_level, ReportingLevel::Standard);
    }

    #[test]
    fn default_config_needs_organizations() {
        let err = OrchestrationConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(OrchestrationConfig::for_organizations(["acme"])
            .validate()
            .is_ok());
    }

    #[test]
    fn validate_rejects_inconsistent_settings() {
        let mut config = OrchestrationConfig::for_organizations(["acme", "acme"]);
        assert!(config.validate().unwrap_err().to_string().contains("twice"));

        config = OrchestrationConfig::for_organizations(["acme"]);
        config.parallel_sessions = 0;
        assert!(config.validate().is_err());

        config = OrchestrationConfig::for_organizations(["acme"]);
        config.test_suites.clear();
        assert!(config.validate().is_err());

        config = OrchestrationConfig::for_organizations(["acme"]);
        config.environments.clear();
        assert!(config.validate().is_err());

        config = OrchestrationConfig::for_organizations([" "]);
        assert!(config.validate().is_err());

        config = OrchestrationConfig::for_organizations(["acme"]);
        config.max_execution_time_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
organizations = ["acme", "globex"]
environments = ["staging", "production"]
test_suites = ["smoke", "chaos", "compliance"]
parallel_sessions = 2
enable_chaos_mode = true
reporting_level = "detailed"
seed = 42

[sla]
max_deployment_ms = 45000

[compliance_profiles.globex]
requirements = ["cost_within_budget"]

[chaos]
intensity = "extreme"
scenarios = ["network_failures", "memory_pressure"]

[network]
probe_requests = 5

[network.simulator]
initial_condition = "mobile-3g"
"#;

        let config: OrchestrationConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.organizations.len(), 2);
        assert_eq!(config.environments.len(), 2);
        assert_eq!(
            config.test_suites,
            vec![TestSuite::Smoke, TestSuite::Chaos, TestSuite::Compliance]
        );
        assert_eq!(config.parallel_sessions, 2);
        assert!(config.enable_chaos_mode);
        assert_eq!(config.reporting_level, ReportingLevel::Detailed);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.sla.max_deployment_ms, 45_000);
        assert_eq!(config.sla.max_rollback_ms, 30_000);
        assert_eq!(config.chaos.intensity, ChaosIntensity::Extreme);
        assert_eq!(config.chaos.scenarios.len(), 2);
        assert_eq!(config.network.probe_requests, 5);
        assert_eq!(config.network.probe_concurrency, 5);
        assert_eq!(config.network.simulator.initial_condition, "mobile-3g");
        assert_eq!(
            config.compliance_profile("globex").requirements,
            vec![ComplianceRequirement::CostWithinBudget]
        );
        assert_eq!(
            config.compliance_profile("acme"),
            ComplianceProfile::default()
        );
    }

    #[test]
    fn config_missing_fields_use_defaults() {
        let config: OrchestrationConfig = toml::from_str(r#"organizations = ["acme"]"#).unwrap();
        assert_eq!(config.parallel_sessions, 3);
        assert_eq!(config.chaos, ChaosSettings::default());
        assert_eq!(config.network.probe_size_bytes, 64 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_suite_is_a_parse_error() {
        let result: Result<OrchestrationConfig, _> =
            toml::from_str(r#"organizations = ["acme"]
test_suites = ["soak"]"#);
        assert!(result.is_err());
    }

    #[test]
    fn chaos_settings_scope_to_organization() {
        let settings = ChaosSettings::default();
        let config = settings.config_for("acme", 10_000);
        assert!(config.enabled);
        assert_eq!(config.target.as_deref(), Some("acme"));
        assert_eq!(config.duration_ms, 10_000);
        assert_eq!(config.scenarios, settings.scenarios);
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "organizations = [\"acme\"]\nparallel_sessions = 1").unwrap();

        let config = OrchestrationConfig::from_file(file.path()).unwrap();
        assert_eq!(config.organizations, vec!["acme".to_string()]);
        assert_eq!(config.parallel_sessions, 1);
    }

    #[test]
    fn from_file_reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            OrchestrationConfig::from_file(&missing),
            Err(ConfigError::ReadError { .. })
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "organizations = [").unwrap();
        let err = OrchestrationConfig::from_file(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }
}
