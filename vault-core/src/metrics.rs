//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `vault_transactions_created_total` - Transactions entering the ledger
//! - `vault_transactions_completed_total` - Completed transactions
//! - `vault_transactions_failed_total` - Failed/cancelled/rejected transactions
//! - `vault_transactions_disputed_total` - Transactions flagged by reconciliation
//! - `vault_votes_cast_total` - Approval votes appended
//! - `vault_history_snapshots_total` - Balance history rows appended
//! - `vault_mutation_duration_seconds` - Histogram of mutation latencies

use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Transactions created
    pub transactions_created: IntCounter,

    /// Transactions completed
    pub transactions_completed: IntCounter,

    /// Transactions failed
    pub transactions_failed: IntCounter,

    /// Transactions disputed
    pub transactions_disputed: IntCounter,

    /// Votes cast
    pub votes_cast: IntCounter,

    /// History snapshots appended
    pub history_snapshots: IntCounter,

    /// Mutation duration histogram
    pub mutation_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transactions_created = IntCounter::with_opts(Opts::new(
            "vault_transactions_created_total",
            "Transactions entering the ledger",
        ))?;
        registry.register(Box::new(transactions_created.clone()))?;

        let transactions_completed = IntCounter::with_opts(Opts::new(
            "vault_transactions_completed_total",
            "Completed transactions",
        ))?;
        registry.register(Box::new(transactions_completed.clone()))?;

        let transactions_failed = IntCounter::with_opts(Opts::new(
            "vault_transactions_failed_total",
            "Failed, cancelled, or rejected transactions",
        ))?;
        registry.register(Box::new(transactions_failed.clone()))?;

        let transactions_disputed = IntCounter::with_opts(Opts::new(
            "vault_transactions_disputed_total",
            "Transactions flagged by reconciliation",
        ))?;
        registry.register(Box::new(transactions_disputed.clone()))?;

        let votes_cast = IntCounter::with_opts(Opts::new(
            "vault_votes_cast_total",
            "Approval votes appended",
        ))?;
        registry.register(Box::new(votes_cast.clone()))?;

        let history_snapshots = IntCounter::with_opts(Opts::new(
            "vault_history_snapshots_total",
            "Balance history rows appended",
        ))?;
        registry.register(Box::new(history_snapshots.clone()))?;

        let mutation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "vault_mutation_duration_seconds",
                "Histogram of mutation latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(mutation_duration.clone()))?;

        Ok(Self {
            transactions_created,
            transactions_completed,
            transactions_failed,
            transactions_disputed,
            votes_cast,
            history_snapshots,
            mutation_duration,
            registry,
        })
    }

    /// Record mutation duration
    pub fn record_mutation_duration(&self, duration_seconds: f64) {
        self.mutation_duration.observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
