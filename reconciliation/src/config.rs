//! Reconciliation configuration

use serde::{Deserialize, Serialize};

/// Reconciliation tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationConfig {
    /// Tolerance when matching by `(amount, currency, timestamp)`, in seconds
    pub match_tolerance_secs: i64,

    /// How long a pending transaction may lack an external counterpart
    /// before it is flagged as disputed, in seconds
    pub dispute_grace_secs: i64,

    /// Bound on external feed calls; a slower feed counts as unavailable
    pub feed_timeout_ms: u64,

    /// Scheduler tick interval, in seconds
    pub interval_secs: u64,

    /// How far back each scheduled run looks, in seconds
    pub lookback_secs: i64,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            match_tolerance_secs: 300,
            dispute_grace_secs: 86_400,
            feed_timeout_ms: 5_000,
            interval_secs: 3_600,
            lookback_secs: 7 * 86_400,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReconciliationConfig::default();
        assert_eq!(config.match_tolerance_secs, 300);
        assert_eq!(config.dispute_grace_secs, 86_400);
        assert!(config.feed_timeout_ms > 0);
    }
}
