//! # faultline-core
//!
//! Pure logic for faultline (no I/O, instant tests).
//!
//! This crate holds the algorithms behind the orchestration engine without
//! any timers, tasks or network access:
//! - Grading bands and SLA thresholds
//! - Zero-guarded aggregation of scenario outcomes
//! - Organization compliance profiles
//! - The bounded metrics ring used by the network simulator
//! - Cumulative-probability scenario selection
//! - The read-only scenario catalog
//! - Markdown report rendering
//!
//! Everything random takes a [`DynRng`] so runs can be replayed from a seed.
//! The async engines in `faultline-chaos` and `faultline-orchestrator` feed
//! these functions and act on what they return.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod catalog;
pub mod compliance;
pub mod grading;
pub mod random;
pub mod report;
pub mod ring;
pub mod selection;

pub use aggregate::{
    organization_compliance_score, organization_metrics, organization_status, overall_metrics,
    percentage, safe_average, summarize,
};
pub use catalog::{complexity_for_suite, expand_suites, ScenarioCatalog};
pub use compliance::{ComplianceProfile, ComplianceRequirement};
pub use grading::{grade_for_score, SlaThresholds};
pub use random::{rng_from, seeded, DynRng};
pub use report::render_reports;
pub use ring::MetricsRing;
pub use selection::select_scenario_index;
