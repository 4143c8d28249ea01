//! Cumulative-probability scenario selection.
//!
//! Walks the profile's scenarios in order, summing probabilities, and picks
//! the first whose running total exceeds the roll. Weights that sum to less
//! than the roll (rounding, or a profile that does not sum to 1.0) fall back
//! to the first listed scenario.

use faultline_types::NetworkScenario;

/// Pick a scenario index for a roll in `[0, 1)`.
///
/// Returns `None` only for an empty list.
pub fn select_scenario_index(scenarios: &[NetworkScenario], roll: f64) -> Option<usize> {
    if scenarios.is_empty() {
        return None;
    }

    let mut cumulative = 0.0;
    for (index, scenario) in scenarios.iter().enumerate() {
        cumulative += scenario.probability;
        if roll < cumulative {
            return Some(index);
        }
    }

    Some(0)
}
