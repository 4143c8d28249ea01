//! The system under test.

use async_trait::async_trait;
use faultline_types::{PipelineExecution, ScenarioDefinition, SessionId, TestSuite};
use std::sync::Arc;

use crate::{InterceptResolution, OutboundRequest, RequestInterceptor, ResourcePressureInjector, SutError};

/// An execution context opened for one organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    /// Session identity.
    pub id: SessionId,
    /// Organization the session belongs to.
    pub organization: String,
    /// Position among the organization's sessions.
    pub index: usize,
}

/// A multi-tenant system whose deployment lifecycle is being tested.
///
/// Implementations handle the actual pipeline (real infrastructure, a
/// staging API, or a scripted double).
#[async_trait]
pub trait SystemUnderTest: Send + Sync {
    /// Open an execution context for an organization.
    async fn open_session(&self, organization: &str, index: usize)
        -> Result<SessionHandle, SutError>;

    /// Close a session. Closing an already-closed session is a no-op.
    async fn close_session(&self, session: &SessionHandle) -> Result<(), SutError>;

    /// Prepare an organization for a suite (seed data, feature flags, ...).
    async fn prepare_suite(
        &self,
        organization: &str,
        environment: &str,
        suite: TestSuite,
    ) -> Result<(), SutError>;

    /// Run the full deploy/monitor/rollback cycle of one scenario.
    async fn execute_scenario(
        &self,
        session: &SessionHandle,
        scenario: &ScenarioDefinition,
        environment: &str,
    ) -> Result<PipelineExecution, SutError>;

    /// Whether the deployment is healthy after a scenario.
    async fn health_check(&self, session: &SessionHandle, environment: &str)
        -> Result<bool, SutError>;

    /// Interception capability for outbound calls.
    fn interceptor(&self) -> Arc<dyn RequestInterceptor>;

    /// Resource pressure capability.
    fn pressure(&self) -> Arc<dyn ResourcePressureInjector>;

    /// Send a request through the interceptor, waiting out any delay.
    async fn dispatch(&self, request: OutboundRequest) -> InterceptResolution {
        let resolution = self.interceptor().evaluate(&request);
        let delay = resolution.delay_ms();
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        resolution
    }
}
