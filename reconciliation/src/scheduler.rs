//! Periodic reconciliation runs
//!
//! Drives the engine over a fixed account set on an interval. Failed runs
//! are logged and retried on the next tick; `SourceUnavailable` is expected
//! noise, not a fault.

use crate::engine::ReconciliationEngine;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use vault_core::AccountId;

/// Interval-driven reconciliation loop
#[derive(Debug)]
pub struct ReconciliationScheduler {
    engine: Arc<ReconciliationEngine>,
    accounts: Vec<AccountId>,
    tick: Duration,
    lookback: ChronoDuration,
}

impl ReconciliationScheduler {
    /// Scheduler over a fixed account set, using the engine's configured
    /// interval and lookback
    pub fn new(
        engine: Arc<ReconciliationEngine>,
        accounts: Vec<AccountId>,
        interval_secs: u64,
        lookback_secs: i64,
    ) -> Self {
        Self {
            engine,
            accounts,
            tick: Duration::from_secs(interval_secs),
            lookback: ChronoDuration::seconds(lookback_secs),
        }
    }

    /// Spawn the loop; drop or abort the handle to stop it
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                self.run_once().await;
            }
        })
    }

    /// One pass over every scheduled account
    pub async fn run_once(&self) {
        let to = Utc::now();
        let from = to - self.lookback;

        for account_id in &self.accounts {
            match self.engine.reconcile(*account_id, from, to).await {
                Ok(result) => {
                    if !result.converged() {
                        tracing::info!(
                            account_id = %account_id,
                            local_only = result.local_only.len(),
                            external_only = result.external_only.len(),
                            "Account not yet converged"
                        );
                    }
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(account_id = %account_id, error = %e, "Reconciliation deferred");
                }
                Err(e) => {
                    tracing::error!(account_id = %account_id, error = %e, "Reconciliation failed");
                }
            }
        }
    }
}
