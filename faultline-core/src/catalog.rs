//! Read-only scenario catalog.
//!
//! The standard catalog carries generic templates (organization `*`) that
//! apply to every tenant; organization-specific entries can be layered on top
//! with [`ScenarioCatalog::with_scenario`].

use faultline_types::{Complexity, ExpectedBehavior, ScenarioDefinition, TestSuite};
use std::collections::BTreeMap;

/// Organization tag of templates that apply to every tenant.
pub const ANY_ORGANIZATION: &str = "*";

/// Immutable set of scenario definitions.
#[derive(Debug, Clone, Default)]
pub struct ScenarioCatalog {
    entries: Vec<ScenarioDefinition>,
}

fn definition(
    name: &str,
    complexity: Complexity,
    configuration: &[(&str, &str)],
    expected: ExpectedBehavior,
) -> ScenarioDefinition {
    ScenarioDefinition {
        name: name.to_string(),
        organization: ANY_ORGANIZATION.to_string(),
        complexity,
        configuration: configuration
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
        expected,
    }
}

impl ScenarioCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in templates: one simple, two medium, one complex.
    pub fn standard() -> Self {
        let entries = vec![
            definition(
                "static-site",
                Complexity::Simple,
                &[("runtime", "static"), ("instances", "1"), ("region", "primary")],
                ExpectedBehavior {
                    min_cost: 5.0,
                    max_cost: 50.0,
                    max_deployment_ms: 30_000,
                    max_rollback_ms: 15_000,
                },
            ),
            definition(
                "api-service",
                Complexity::Medium,
                &[("runtime", "container"), ("instances", "3"), ("database", "postgres")],
                ExpectedBehavior {
                    min_cost: 50.0,
                    max_cost: 400.0,
                    max_deployment_ms: 45_000,
                    max_rollback_ms: 20_000,
                },
            ),
            definition(
                "worker-queue",
                Complexity::Medium,
                &[("runtime", "container"), ("instances", "2"), ("queue", "durable")],
                ExpectedBehavior {
                    min_cost: 40.0,
                    max_cost: 300.0,
                    max_deployment_ms: 45_000,
                    max_rollback_ms: 20_000,
                },
            ),
            definition(
                "multi-region-platform",
                Complexity::Complex,
                &[
                    ("runtime", "container"),
                    ("instances", "12"),
                    ("regions", "3"),
                    ("database", "replicated"),
                ],
                ExpectedBehavior {
                    min_cost: 800.0,
                    max_cost: 5_000.0,
                    max_deployment_ms: 60_000,
                    max_rollback_ms: 30_000,
                },
            ),
        ];
        Self { entries }
    }

    /// Add an entry.
    pub fn with_scenario(mut self, scenario: ScenarioDefinition) -> Self {
        self.entries.push(scenario);
        self
    }

    /// Every entry, in insertion order.
    pub fn entries(&self) -> &[ScenarioDefinition] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scenarios of one complexity for one organization.
    ///
    /// Generic templates come back tagged with `organization`; entries that
    /// belong to another organization are skipped.
    pub fn scenarios_for(&self, organization: &str, complexity: Complexity) -> Vec<ScenarioDefinition> {
        self.entries
            .iter()
            .filter(|entry| entry.complexity == complexity)
            .filter(|entry| {
                entry.organization == ANY_ORGANIZATION || entry.organization == organization
            })
            .map(|entry| {
                let mut scenario = entry.clone();
                scenario.organization = organization.to_string();
                scenario
            })
            .collect()
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&ScenarioDefinition> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}

/// Complexity a suite draws its scenarios from.
///
/// `compliance` runs checks only and `full` is expanded before lookup, so
/// both return `None`.
pub fn complexity_for_suite(suite: TestSuite) -> Option<Complexity> {
    match suite {
        TestSuite::Smoke => Some(Complexity::Simple),
        TestSuite::Integration => Some(Complexity::Medium),
        TestSuite::Performance => Some(Complexity::Complex),
        TestSuite::Chaos => Some(Complexity::Medium),
        TestSuite::Compliance | TestSuite::Full => None,
    }
}

/// Expand `full` into its member suites, preserving the requested order.
pub fn expand_suites(suites: &[TestSuite]) -> Vec<TestSuite> {
    let mut expanded = Vec::new();
    for suite in suites {
        match suite {
            TestSuite::Full => expanded.extend([
                TestSuite::Smoke,
                TestSuite::Integration,
                TestSuite::Performance,
                TestSuite::Chaos,
                TestSuite::Compliance,
            ]),
            other => expanded.push(*other),
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_has_one_simple_scenario() {
        let catalog = ScenarioCatalog::standard();
        let simple = catalog.scenarios_for("acme", Complexity::Simple);
        assert_eq!(simple.len(), 1);
        assert_eq!(simple[0].name, "static-site");
        assert_eq!(simple[0].organization, "acme");
    }

    #[test]
    fn medium_and_complex_templates() {
        let catalog = ScenarioCatalog::standard();
        assert_eq!(catalog.scenarios_for("acme", Complexity::Medium).len(), 2);
        assert_eq!(catalog.scenarios_for("acme", Complexity::Complex).len(), 1);
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn organization_specific_entries_stay_with_their_owner() {
        let mut custom = ScenarioCatalog::standard()
            .get("static-site")
            .cloned()
            .unwrap();
        custom.name = "globex-landing".into();
        custom.organization = "globex".into();
        let catalog = ScenarioCatalog::standard().with_scenario(custom);

        assert_eq!(catalog.scenarios_for("globex", Complexity::Simple).len(), 2);
        assert_eq!(catalog.scenarios_for("acme", Complexity::Simple).len(), 1);
    }

    #[test]
    fn suite_complexity_mapping() {
        assert_eq!(complexity_for_suite(TestSuite::Smoke), Some(Complexity::Simple));
        assert_eq!(complexity_for_suite(TestSuite::Integration), Some(Complexity::Medium));
        assert_eq!(complexity_for_suite(TestSuite::Performance), Some(Complexity::Complex));
        assert_eq!(complexity_for_suite(TestSuite::Chaos), Some(Complexity::Medium));
        assert_eq!(complexity_for_suite(TestSuite::Compliance), None);
    }

    #[test]
    fn full_expands_in_sequence() {
        let expanded = expand_suites(&[TestSuite::Full]);
        assert_eq!(
            expanded,
            vec![
                TestSuite::Smoke,
                TestSuite::Integration,
                TestSuite::Performance,
                TestSuite::Chaos,
                TestSuite::Compliance,
            ]
        );
        assert_eq!(
            expand_suites(&[TestSuite::Chaos, TestSuite::Smoke]),
            vec![TestSuite::Chaos, TestSuite::Smoke]
        );
    }

    #[test]
    fn empty_catalog_yields_nothing() {
        let catalog = ScenarioCatalog::new();
        assert!(catalog.is_empty());
        assert!(catalog.scenarios_for("acme", Complexity::Simple).is_empty());
    }
}
