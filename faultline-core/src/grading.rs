//! Grading bands and SLA thresholds.
//!
//! A score maps to a letter through fixed bands: 90 and above is A, 80 is B,
//! 70 is C, 60 is D, anything lower (including NaN) is F.

use faultline_types::{Grade, PipelineMetrics};
use serde::{Deserialize, Serialize};

/// Lowest score that earns an A.
pub const GRADE_A_THRESHOLD: f64 = 90.0;
/// Lowest score that earns a B.
pub const GRADE_B_THRESHOLD: f64 = 80.0;
/// Lowest score that earns a C.
pub const GRADE_C_THRESHOLD: f64 = 70.0;
/// Lowest score that earns a D.
pub const GRADE_D_THRESHOLD: f64 = 60.0;

/// Default deployment-time ceiling (60 s).
pub const DEFAULT_MAX_DEPLOYMENT_MS: u64 = 60_000;
/// Default rollback-time ceiling (30 s).
pub const DEFAULT_MAX_ROLLBACK_MS: u64 = 30_000;

/// Map a 0–100 score to its letter grade.
pub fn grade_for_score(score: f64) -> Grade {
    if score >= GRADE_A_THRESHOLD {
        Grade::A
    } else if score >= GRADE_B_THRESHOLD {
        Grade::B
    } else if score >= GRADE_C_THRESHOLD {
        Grade::C
    } else if score >= GRADE_D_THRESHOLD {
        Grade::D
    } else {
        Grade::F
    }
}

/// Timing thresholds an execution must stay under to count as SLA-compliant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaThresholds {
    /// Deployment must finish strictly under this many milliseconds.
    #[serde(default = "default_max_deployment_ms")]
    pub max_deployment_ms: u64,
    /// Rollback must finish strictly under this many milliseconds.
    #[serde(default = "default_max_rollback_ms")]
    pub max_rollback_ms: u64,
}

fn default_max_deployment_ms() -> u64 {
    DEFAULT_MAX_DEPLOYMENT_MS
}

fn default_max_rollback_ms() -> u64 {
    DEFAULT_MAX_ROLLBACK_MS
}

impl Default for SlaThresholds {
    fn default() -> Self {
        Self {
            max_deployment_ms: DEFAULT_MAX_DEPLOYMENT_MS,
            max_rollback_ms: DEFAULT_MAX_ROLLBACK_MS,
        }
    }
}

impl SlaThresholds {
    /// Whether the deployment time is under the ceiling.
    pub fn deployment_ok(&self, metrics: &PipelineMetrics) -> bool {
        metrics.deployment_time_ms < self.max_deployment_ms
    }

    /// Whether the rollback time (if any rollback ran) is under the ceiling.
    pub fn rollback_ok(&self, metrics: &PipelineMetrics) -> bool {
        metrics
            .rollback_time_ms
            .map_or(true, |ms| ms < self.max_rollback_ms)
    }

    /// Whether both thresholds hold.
    pub fn meets(&self, metrics: &PipelineMetrics) -> bool {
        self.deployment_ok(metrics) && self.rollback_ok(metrics)
    }
}
