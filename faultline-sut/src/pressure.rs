//! Client-side resource pressure.

use async_trait::async_trait;
use faultline_types::ChaosScenarioType;
use std::fmt;

use crate::SutError;

/// Kind of resource pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PressureKind {
    /// Memory allocation pressure
    Memory,
    /// CPU throttling
    Cpu,
    /// Storage write errors
    Storage,
    /// Connection and handle exhaustion
    Exhaustion,
}

impl PressureKind {
    /// Pressure kind a chaos scenario type applies, if it is a pressure type.
    pub fn for_scenario(scenario: ChaosScenarioType) -> Option<Self> {
        match scenario {
            ChaosScenarioType::MemoryPressure => Some(PressureKind::Memory),
            ChaosScenarioType::CpuThrottling => Some(PressureKind::Cpu),
            ChaosScenarioType::StorageErrors => Some(PressureKind::Storage),
            ChaosScenarioType::ResourceExhaustion => Some(PressureKind::Exhaustion),
            ChaosScenarioType::NetworkFailures
            | ChaosScenarioType::SlowResponses
            | ChaosScenarioType::RandomErrors
            | ChaosScenarioType::AuthFailures
            | ChaosScenarioType::ApiTimeouts
            | ChaosScenarioType::DeploymentInterruptions => None,
        }
    }
}

impl fmt::Display for PressureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PressureKind::Memory => write!(f, "memory"),
            PressureKind::Cpu => write!(f, "cpu"),
            PressureKind::Storage => write!(f, "storage"),
            PressureKind::Exhaustion => write!(f, "exhaustion"),
        }
    }
}

/// Capability to simulate resource pressure inside the system under test.
#[async_trait]
pub trait ResourcePressureInjector: Send + Sync {
    /// Start applying pressure. `level` is a fraction in `[0, 1]`.
    async fn apply(&self, kind: PressureKind, level: f64) -> Result<(), SutError>;

    /// Stop applying pressure of this kind. Releasing inactive pressure is a no-op.
    async fn release(&self, kind: PressureKind) -> Result<(), SutError>;
}
