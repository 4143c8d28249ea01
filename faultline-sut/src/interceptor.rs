//! Request interception.
//!
//! An interceptor holds an ordered list of rules. For every outbound request
//! the rules are consulted in registration order:
//!
//! - a rule whose predicate does not match is skipped
//! - `Continue` passes the request on to the next rule
//! - `Delay(ms)` adds to the accumulated delay and passes it on
//! - `Abort` and `Fulfill` end evaluation
//!
//! The accumulated delay is reported with every resolution so a caller can
//! sleep before acting on it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::InterceptError;

/// An outbound call made by the system under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// HTTP method.
    pub method: String,
    /// Request URL or path.
    pub url: String,
    /// Organization the request was issued for, if known.
    pub organization: Option<String>,
}

impl OutboundRequest {
    /// Create an untagged request.
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_string(),
            url: url.to_string(),
            organization: None,
        }
    }

    /// Tag the request with an organization.
    pub fn for_organization(mut self, organization: &str) -> Self {
        self.organization = Some(organization.to_string());
        self
    }

    /// Whether the URL contains `fragment`.
    pub fn url_contains(&self, fragment: &str) -> bool {
        self.url.contains(fragment)
    }
}

/// What a matching rule does with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptAction {
    /// Let the request through unchanged.
    Continue,
    /// Fail the request at the network level.
    Abort(String),
    /// Hold the request for this many milliseconds, then continue.
    Delay(u64),
    /// Answer the request without reaching the system.
    Fulfill {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
}

/// Final outcome of running a request through every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptResolution {
    /// The request reaches the system.
    Proceed {
        /// Accumulated delay in milliseconds.
        delay_ms: u64,
    },
    /// The request fails at the network level.
    Aborted {
        /// Abort reason.
        reason: String,
        /// Delay accumulated before the abort.
        delay_ms: u64,
    },
    /// The request is answered by a rule.
    Fulfilled {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
        /// Delay accumulated before fulfilment.
        delay_ms: u64,
    },
}

impl InterceptResolution {
    /// Delay accumulated while evaluating rules.
    pub fn delay_ms(&self) -> u64 {
        match self {
            InterceptResolution::Proceed { delay_ms }
            | InterceptResolution::Aborted { delay_ms, .. }
            | InterceptResolution::Fulfilled { delay_ms, .. } => *delay_ms,
        }
    }

    /// Whether the request was aborted.
    pub fn is_aborted(&self) -> bool {
        matches!(self, InterceptResolution::Aborted { .. })
    }

    /// Whether the request failed, either aborted or answered with status >= 400.
    pub fn is_failure(&self) -> bool {
        match self {
            InterceptResolution::Proceed { .. } => false,
            InterceptResolution::Aborted { .. } => true,
            InterceptResolution::Fulfilled { status, .. } => *status >= 400,
        }
    }
}

/// Identifier of a registered rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u64);

impl RuleId {
    /// Raw numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule-{}", self.0)
    }
}

type Predicate = Arc<dyn Fn(&OutboundRequest) -> bool + Send + Sync>;
type Handler = Arc<dyn Fn(&OutboundRequest) -> InterceptAction + Send + Sync>;

/// A predicate-matched interception rule.
#[derive(Clone)]
pub struct InterceptRule {
    label: String,
    predicate: Predicate,
    handler: Handler,
}

impl fmt::Debug for InterceptRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptRule")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl InterceptRule {
    /// Create a rule from a predicate and a handler.
    pub fn new<P, H>(label: &str, predicate: P, handler: H) -> Self
    where
        P: Fn(&OutboundRequest) -> bool + Send + Sync + 'static,
        H: Fn(&OutboundRequest) -> InterceptAction + Send + Sync + 'static,
    {
        Self {
            label: label.to_string(),
            predicate: Arc::new(predicate),
            handler: Arc::new(handler),
        }
    }

    /// Rule that applies to every request.
    pub fn all<H>(label: &str, handler: H) -> Self
    where
        H: Fn(&OutboundRequest) -> InterceptAction + Send + Sync + 'static,
    {
        Self::new(label, |_| true, handler)
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the rule applies to `request`.
    pub fn matches(&self, request: &OutboundRequest) -> bool {
        (self.predicate)(request)
    }

    /// Run the handler.
    pub fn apply(&self, request: &OutboundRequest) -> InterceptAction {
        (self.handler)(request)
    }
}

/// Capability to intercept outbound calls of the system under test.
pub trait RequestInterceptor: Send + Sync {
    /// Install a rule at the end of the chain.
    fn register(&self, rule: InterceptRule) -> Result<RuleId, InterceptError>;

    /// Remove a rule.
    fn unregister(&self, id: RuleId) -> Result<(), InterceptError>;

    /// Remove every rule.
    fn clear(&self);

    /// Number of installed rules.
    fn rule_count(&self) -> usize;

    /// Run a request through the installed rules.
    fn evaluate(&self, request: &OutboundRequest) -> InterceptResolution;
}

#[derive(Debug, Default)]
struct ChainInner {
    next_id: u64,
    rules: Vec<(RuleId, InterceptRule)>,
}

/// Ordered rule chain.
///
/// Cloning yields a handle to the same chain.
#[derive(Debug, Clone, Default)]
pub struct InterceptorChain {
    inner: Arc<Mutex<ChainInner>>,
    max_rules: Option<usize>,
}

impl InterceptorChain {
    /// Create an empty, unbounded chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chain that refuses rules beyond `max_rules`.
    pub fn with_max_rules(max_rules: usize) -> Self {
        Self {
            inner: Arc::default(),
            max_rules: Some(max_rules),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChainInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Labels of installed rules, in evaluation order.
    pub fn labels(&self) -> Vec<String> {
        self.lock()
            .rules
            .iter()
            .map(|(_, rule)| rule.label.clone())
            .collect()
    }
}

impl RequestInterceptor for InterceptorChain {
    fn register(&self, rule: InterceptRule) -> Result<RuleId, InterceptError> {
        let mut inner = self.lock();
        if let Some(max) = self.max_rules {
            if inner.rules.len() >= max {
                return Err(InterceptError::RuleLimit(max));
            }
        }
        inner.next_id += 1;
        let id = RuleId(inner.next_id);
        tracing::debug!(rule = %id, label = %rule.label, "Interception rule registered");
        inner.rules.push((id, rule));
        Ok(id)
    }

    fn unregister(&self, id: RuleId) -> Result<(), InterceptError> {
        let mut inner = self.lock();
        let before = inner.rules.len();
        inner.rules.retain(|(rule_id, _)| *rule_id != id);
        if inner.rules.len() == before {
            return Err(InterceptError::UnknownRule(id));
        }
        Ok(())
    }

    fn clear(&self) {
        self.lock().rules.clear();
    }

    fn rule_count(&self) -> usize {
        self.lock().rules.len()
    }

    fn evaluate(&self, request: &OutboundRequest) -> InterceptResolution {
        // Handlers run outside the lock; they may draw from their own shared state.
        let rules: Vec<InterceptRule> = self
            .lock()
            .rules
            .iter()
            .map(|(_, rule)| rule.clone())
            .collect();

        let mut delay_ms = 0u64;
        for rule in rules.iter().filter(|rule| rule.matches(request)) {
            match rule.apply(request) {
                InterceptAction::Continue => {}
                InterceptAction::Delay(ms) => delay_ms = delay_ms.saturating_add(ms),
                InterceptAction::Abort(reason) => {
                    return InterceptResolution::Aborted { reason, delay_ms }
                }
                InterceptAction::Fulfill { status, body } => {
                    return InterceptResolution::Fulfilled {
                        status,
                        body,
                        delay_ms,
                    }
                }
            }
        }

        InterceptResolution::Proceed { delay_ms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> OutboundRequest {
        OutboundRequest::new("GET", url)
    }

    #[test]
    fn empty_chain_proceeds() {
        let chain = InterceptorChain::new();
        assert_eq!(
            chain.evaluate(&request("/api/status")),
            InterceptResolution::Proceed { delay_ms: 0 }
        );
    }

    #[test]
    fn rules_run_in_registration_order() {
        let chain = InterceptorChain::new();
        chain
            .register(InterceptRule::all("first", |_| {
                InterceptAction::Abort("first".into())
            }))
            .unwrap();
        chain
            .register(InterceptRule::all("second", |_| InterceptAction::Fulfill {
                status: 500,
                body: "second".into(),
            }))
            .unwrap();

        let resolution = chain.evaluate(&request("/"));
        assert_eq!(
            resolution,
            InterceptResolution::Aborted {
                reason: "first".into(),
                delay_ms: 0
            }
        );
        assert_eq!(chain.labels(), vec!["first", "second"]);
    }

    #[test]
    fn delays_accumulate_then_continue() {
        let chain = InterceptorChain::new();
        chain
            .register(InterceptRule::all("slow", |_| InterceptAction::Delay(200)))
            .unwrap();
        chain
            .register(InterceptRule::all("pass", |_| InterceptAction::Continue))
            .unwrap();
        chain
            .register(InterceptRule::all("slower", |_| InterceptAction::Delay(300)))
            .unwrap();

        let resolution = chain.evaluate(&request("/"));
        assert_eq!(resolution, InterceptResolution::Proceed { delay_ms: 500 });
        assert!(!resolution.is_failure());
    }

    #[test]
    fn non_matching_rules_are_skipped() {
        let chain = InterceptorChain::new();
        chain
            .register(InterceptRule::new(
                "deploy-only",
                |req| req.url_contains("/deploy"),
                |_| InterceptAction::Fulfill {
                    status: 503,
                    body: "unavailable".into(),
                },
            ))
            .unwrap();

        assert!(!chain.evaluate(&request("/api/users")).is_failure());
        assert!(chain.evaluate(&request("/api/deployments/1")).is_failure());
    }

    #[test]
    fn unregister_removes_only_that_rule() {
        let chain = InterceptorChain::new();
        let a = chain
            .register(InterceptRule::all("a", |_| InterceptAction::Continue))
            .unwrap();
        let _b = chain
            .register(InterceptRule::all("b", |_| InterceptAction::Continue))
            .unwrap();

        chain.unregister(a).unwrap();
        assert_eq!(chain.rule_count(), 1);
        assert_eq!(chain.unregister(a), Err(InterceptError::UnknownRule(a)));

        chain.clear();
        assert_eq!(chain.rule_count(), 0);
    }

    #[test]
    fn rule_limit_is_enforced() {
        let chain = InterceptorChain::with_max_rules(1);
        chain
            .register(InterceptRule::all("a", |_| InterceptAction::Continue))
            .unwrap();
        let err = chain
            .register(InterceptRule::all("b", |_| InterceptAction::Continue))
            .unwrap_err();
        assert_eq!(err, InterceptError::RuleLimit(1));
    }

    #[test]
    fn clones_share_rules() {
        let chain = InterceptorChain::new();
        let handle = chain.clone();
        handle
            .register(InterceptRule::all("a", |_| InterceptAction::Continue))
            .unwrap();
        assert_eq!(chain.rule_count(), 1);
    }

    #[test]
    fn fulfilled_success_is_not_a_failure() {
        let resolution = InterceptResolution::Fulfilled {
            status: 200,
            body: "ok".into(),
            delay_ms: 10,
        };
        assert!(!resolution.is_failure());
        assert_eq!(resolution.delay_ms(), 10);
    }
}
