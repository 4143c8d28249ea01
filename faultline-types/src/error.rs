//! Error types for faultline-types.

use thiserror::Error;

/// Errors raised while parsing data-model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// Unknown chaos intensity name
    #[error("unknown chaos intensity: {0}")]
    UnknownIntensity(String),

    /// Unknown chaos scenario type name
    #[error("unknown chaos scenario type: {0}")]
    UnknownChaosScenario(String),

    /// Unknown network scenario kind name
    #[error("unknown network scenario kind: {0}")]
    UnknownNetworkScenario(String),

    /// Unknown test suite name
    #[error("unknown test suite: {0}")]
    UnknownTestSuite(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TypesError::UnknownIntensity("apocalyptic".into());
        assert_eq!(err.to_string(), "unknown chaos intensity: apocalyptic");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TypesError>();
    }
}
