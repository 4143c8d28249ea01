//! Cost estimation.

use faultline_types::ScenarioDefinition;
use std::collections::HashMap;

/// Produces a monthly cost estimate for a scenario.
pub trait CostEstimator: Send + Sync {
    /// Estimated monthly cost of running `scenario`.
    fn estimate(&self, scenario: &ScenarioDefinition) -> f64;
}

/// Estimates the midpoint of each scenario's expected cost envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeCostEstimator;

impl CostEstimator for EnvelopeCostEstimator {
    fn estimate(&self, scenario: &ScenarioDefinition) -> f64 {
        scenario.expected.cost_midpoint()
    }
}

/// Fixed costs per scenario name, with a fallback.
#[derive(Debug, Clone, Default)]
pub struct StaticCostEstimator {
    fallback: f64,
    costs: HashMap<String, f64>,
}

impl StaticCostEstimator {
    /// Estimator that returns `fallback` for every scenario.
    pub fn new(fallback: f64) -> Self {
        Self {
            fallback,
            costs: HashMap::new(),
        }
    }

    /// Fix the cost of one scenario.
    pub fn with_cost(mut self, scenario: &str, cost: f64) -> Self {
        self.costs.insert(scenario.to_string(), cost);
        self
    }
}

impl CostEstimator for StaticCostEstimator {
    fn estimate(&self, scenario: &ScenarioDefinition) -> f64 {
        self.costs
            .get(&scenario.name)
            .copied()
            .unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_types::{Complexity, ExpectedBehavior};
    use std::collections::BTreeMap;

    fn scenario(name: &str) -> ScenarioDefinition {
        ScenarioDefinition {
            name: name.into(),
            organization: "acme".into(),
            complexity: Complexity::Simple,
            configuration: BTreeMap::new(),
            expected: ExpectedBehavior {
                min_cost: 10.0,
                max_cost: 30.0,
                max_deployment_ms: 30_000,
                max_rollback_ms: 15_000,
            },
        }
    }

    #[test]
    fn envelope_estimator_uses_midpoint() {
        assert_eq!(EnvelopeCostEstimator.estimate(&scenario("a")), 20.0);
    }

    #[test]
    fn static_estimator_overrides_and_falls_back() {
        let estimator = StaticCostEstimator::new(5.0).with_cost("expensive", 999.0);
        assert_eq!(estimator.estimate(&scenario("expensive")), 999.0);
        assert_eq!(estimator.estimate(&scenario("cheap")), 5.0);
    }
}
