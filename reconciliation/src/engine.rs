//! Reconciliation engine
//!
//! Two-pass matching over one account and time window, then convergence:
//! pass 1 keys on the external identifier, pass 2 falls back to
//! `(amount, currency, timestamp within tolerance, direction)`. The feed is
//! fetched before any ledger access; an unavailable feed aborts the run with
//! nothing touched.

use crate::config::ReconciliationConfig;
use crate::error::{ReconciliationError, Result};
use crate::feed::ExternalFeed;
use crate::types::{ExternalTransaction, ReconciliationResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use vault_core::{AccountId, EntryDirection, ExternalEntry, Ledger, Transaction, TransactionStatus};

/// Reconciliation engine over one ledger and one external feed
pub struct ReconciliationEngine {
    ledger: Arc<Ledger>,
    feed: Arc<dyn ExternalFeed>,
    config: ReconciliationConfig,
}

impl std::fmt::Debug for ReconciliationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReconciliationEngine {
    /// Create an engine
    pub fn new(ledger: Arc<Ledger>, feed: Arc<dyn ExternalFeed>, config: ReconciliationConfig) -> Self {
        Self {
            ledger,
            feed,
            config,
        }
    }

    /// Reconcile one account over `[from, to]`
    ///
    /// Idempotent: re-running over the same inputs after convergence yields
    /// empty `local_only` and `external_only` sets (synthesized rows carry a
    /// stable external reference and match on the next pass).
    pub async fn reconcile(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ReconciliationResult> {
        // Fetch first: feed failure must leave the ledger untouched
        let fetch = self.feed.fetch(account_id, from, to);
        let external = match timeout(Duration::from_millis(self.config.feed_timeout_ms), fetch).await
        {
            Ok(rows) => rows?,
            Err(_) => {
                return Err(ReconciliationError::SourceUnavailable(format!(
                    "external feed timed out after {}ms",
                    self.config.feed_timeout_ms
                )))
            }
        };

        // Failed transactions never moved funds; they are not candidates
        let locals: Vec<Transaction> = self
            .ledger
            .transactions(&account_id, Some(from), Some(to))?
            .into_iter()
            .filter(|txn| txn.status != TransactionStatus::Failed)
            .collect();

        tracing::debug!(
            account_id = %account_id,
            local = locals.len(),
            external = external.len(),
            "Reconciliation window loaded"
        );

        let mut used = vec![false; external.len()];
        let mut result = ReconciliationResult::default();

        // Pass 1: match by external identifier
        let mut remaining = Vec::new();
        for txn in locals {
            let hit = txn.external_ref.as_ref().and_then(|local_ref| {
                external
                    .iter()
                    .enumerate()
                    .find(|(i, row)| !used[*i] && row.reference() == *local_ref)
                    .map(|(i, _)| i)
            });
            match hit {
                Some(i) => {
                    used[i] = true;
                    result.matched.push(txn.transaction_id);
                }
                None => remaining.push(txn),
            }
        }

        // Pass 2: match by amount, currency, timestamp tolerance, direction
        let now = Utc::now();
        for txn in remaining {
            let hit = external
                .iter()
                .enumerate()
                .find(|(i, row)| !used[*i] && self.attribute_match(&txn, &account_id, row))
                .map(|(i, _)| i);

            match hit {
                Some(i) => {
                    used[i] = true;
                    result.matched.push(txn.transaction_id);
                }
                None => {
                    result.local_only.push(txn.transaction_id);
                    let age_ms = (now - txn.created_at).num_milliseconds();
                    if txn.status == TransactionStatus::Pending
                        && age_ms > self.config.dispute_grace_secs * 1000
                    {
                        self.ledger
                            .mark_disputed(
                                txn.transaction_id,
                                "no external counterpart past grace period",
                            )
                            .await?;
                        result.disputed.push(txn.transaction_id);
                    }
                }
            }
        }

        // External-only rows: synthesize local records so the ledger
        // converges toward the external source of truth
        for (i, row) in external.iter().enumerate() {
            if used[i] {
                continue;
            }
            if row.amount == Decimal::ZERO {
                tracing::warn!(account_id = %account_id, "Skipping zero-amount external row");
                continue;
            }

            let synthesized = self
                .ledger
                .record_external(ExternalEntry {
                    account_id,
                    direction: if row.is_credit() {
                        EntryDirection::Credit
                    } else {
                        EntryDirection::Debit
                    },
                    amount: row.magnitude(),
                    currency: row.currency,
                    external_ref: row.reference(),
                    occurred_at: row.timestamp,
                })
                .await?;
            result.external_only.push(synthesized.transaction_id);
        }

        tracing::info!(
            account_id = %account_id,
            matched = result.matched.len(),
            local_only = result.local_only.len(),
            disputed = result.disputed.len(),
            external_only = result.external_only.len(),
            "Reconciliation run finished"
        );
        Ok(result)
    }

    fn attribute_match(
        &self,
        txn: &Transaction,
        account_id: &AccountId,
        row: &ExternalTransaction,
    ) -> bool {
        let local_is_credit = txn.destination.account_id() == Some(account_id);

        row.magnitude() == txn.amount
            && row.currency == txn.currency
            && row.is_credit() == local_is_credit
            && (row.timestamp - txn.created_at).num_seconds().abs()
                <= self.config.match_tolerance_secs
    }
}
