//! # faultline-sut
//!
//! Seams between faultline and the system under test.
//!
//! The engine never talks to a real deployment pipeline directly. It goes
//! through the traits in this crate:
//!
//! - [`RequestInterceptor`] - ordered, predicate-matched rules evaluated per
//!   outbound call ([`InterceptorChain`] is the standard implementation)
//! - [`ResourcePressureInjector`] - client-side memory/CPU/storage pressure
//! - [`SystemUnderTest`] - sessions, suite preparation, the deploy/monitor/
//!   rollback pipeline and health checks
//! - [`CostEstimator`] - cost figures for a scenario
//!
//! [`MockSystem`] implements all of them with scripted behaviour for tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod cost;
mod error;
mod interceptor;
mod mock;
mod pressure;
mod system;

pub use cost::{CostEstimator, EnvelopeCostEstimator, StaticCostEstimator};
pub use error::{InterceptError, SutError};
pub use interceptor::{
    InterceptAction, InterceptResolution, InterceptRule, InterceptorChain, OutboundRequest,
    RequestInterceptor, RuleId,
};
pub use mock::{stub_execution, MockSystem};
pub use pressure::{PressureKind, ResourcePressureInjector};
pub use system::{SessionHandle, SystemUnderTest};
