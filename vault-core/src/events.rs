//! Typed event publication
//!
//! The ledger core publishes a `LedgerNotification` to an injected sink on
//! every transaction status change and recorded vote. Delivery is
//! fire-and-forget; at-least-once consumers live outside the core.

use approval_engine::ApprovalStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{AccountId, Currency, Transaction, TransactionStatus};

/// Notification kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Transaction entered the ledger
    TransactionCreated,
    /// A vote was appended to the audit log
    VoteRecorded,
    /// Transaction completed and funds moved
    TransactionCompleted,
    /// Transaction failed, rejected, or was cancelled
    TransactionFailed,
    /// Transaction flagged by reconciliation
    TransactionDisputed,
}

/// Structured event emitted on every transaction status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerNotification {
    /// Event type
    pub kind: NotificationKind,

    /// Transaction this event belongs to
    pub transaction_id: uuid::Uuid,

    /// Ledger accounts referenced by the transaction
    pub account_ids: Vec<AccountId>,

    /// Amount
    pub amount: Decimal,

    /// Currency
    pub currency: Currency,

    /// Transaction status after the change
    pub status: TransactionStatus,

    /// Approval status after the change
    pub approval_status: ApprovalStatus,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,
}

impl LedgerNotification {
    /// Build a notification from a transaction's current state
    pub fn for_transaction(kind: NotificationKind, transaction: &Transaction) -> Self {
        Self {
            kind,
            transaction_id: transaction.transaction_id,
            account_ids: transaction.account_ids(),
            amount: transaction.amount,
            currency: transaction.currency,
            status: transaction.status,
            approval_status: transaction.approval_status,
            timestamp: Utc::now(),
        }
    }
}

/// Injected publication seam; transport is an external collaborator concern
pub trait NotificationSink: Send + Sync {
    /// Publish one notification; must not block the ledger writer
    fn publish(&self, notification: LedgerNotification);
}

/// Sink that drops everything (default)
#[derive(Debug, Default)]
pub struct NoopSink;

impl NotificationSink for NoopSink {
    fn publish(&self, _notification: LedgerNotification) {}
}

/// In-process fan-out over a tokio broadcast channel
///
/// Slow subscribers lose the oldest events; the ledger never blocks on them.
#[derive(Debug)]
pub struct BroadcastSink {
    sender: broadcast::Sender<LedgerNotification>,
}

impl BroadcastSink {
    /// Create with the given channel capacity
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self { sender }
    }

    /// Subscribe to the notification stream
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerNotification> {
        self.sender.subscribe()
    }
}

impl NotificationSink for BroadcastSink {
    fn publish(&self, notification: LedgerNotification) {
        // Err means no subscribers; fire-and-forget
        let _ = self.sender.send(notification);
    }
}

/// Sink that logs each notification as a JSON line
#[derive(Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn publish(&self, notification: LedgerNotification) {
        match serde_json::to_string(&notification) {
            Ok(payload) => tracing::info!(target: "vault_events", %payload, "ledger event"),
            Err(e) => tracing::warn!("Failed to serialize notification: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActorId, Party};
    use uuid::Uuid;

    fn test_transaction() -> Transaction {
        Transaction {
            transaction_id: Uuid::new_v4(),
            source: Party::Account(AccountId::generate()),
            destination: Party::External("0xabc".to_string()),
            amount: Decimal::from(42),
            currency: Currency::USDC,
            initiated_by: ActorId::new("trader-1"),
            status: TransactionStatus::Pending,
            approvals_required: 2,
            approvals_current: 0,
            approval_status: ApprovalStatus::Pending,
            external_ref: None,
            reason: None,
            destination_credited: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_notification_carries_transaction_state() {
        let txn = test_transaction();
        let note = LedgerNotification::for_transaction(NotificationKind::TransactionCreated, &txn);
        assert_eq!(note.transaction_id, txn.transaction_id);
        assert_eq!(note.account_ids.len(), 1);
        assert_eq!(note.status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn test_broadcast_sink_delivers() {
        let sink = BroadcastSink::new(16);
        let mut rx = sink.subscribe();

        let txn = test_transaction();
        sink.publish(LedgerNotification::for_transaction(
            NotificationKind::TransactionCreated,
            &txn,
        ));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.transaction_id, txn.transaction_id);
    }

    #[test]
    fn test_broadcast_sink_without_subscribers_is_noop() {
        let sink = BroadcastSink::new(16);
        sink.publish(LedgerNotification::for_transaction(
            NotificationKind::TransactionFailed,
            &test_transaction(),
        ));
    }

    #[test]
    fn test_notification_json_roundtrip() {
        let note = LedgerNotification::for_transaction(
            NotificationKind::TransactionCompleted,
            &test_transaction(),
        );
        let json = serde_json::to_string(&note).unwrap();
        assert!(json.contains("transaction_completed"));
        let back: LedgerNotification = serde_json::from_str(&json).unwrap();
        assert_eq!(back.transaction_id, note.transaction_id);
    }
}
