//! Reconciliation engine integration tests
//!
//! Runs the engine against a real ledger on a temp directory and a static
//! external feed.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reconciliation::{
    ExternalFeed, ExternalTransaction, ReconciliationConfig, ReconciliationEngine,
    ReconciliationError, StaticFeed,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tempfile::TempDir;
use vault_core::{
    AccountId, ActorId, ApprovalPolicy, Config, Currency, Ledger, Party, TransactionStatus,
    TransferRequest,
};

async fn open_ledger() -> (Arc<Ledger>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.data_dir = temp_dir.path().to_path_buf();
    (Arc::new(Ledger::open(config).await.unwrap()), temp_dir)
}

async fn funded_account(ledger: &Ledger, policy: ApprovalPolicy, balance: i64) -> AccountId {
    let vault = ledger
        .create_vault(ActorId::new("owner-1"), "treasury", policy)
        .await
        .unwrap();
    ledger
        .create_account(vault.vault_id, Currency::USD, Decimal::from(balance))
        .await
        .unwrap()
        .account_id
}

async fn outgoing(ledger: &Ledger, account: AccountId, amount: i64) -> uuid::Uuid {
    ledger
        .create_transaction(TransferRequest {
            source: account,
            destination: Party::External(format!("addr-{}", amount)),
            amount: Decimal::from(amount),
            initiated_by: ActorId::new("trader-1"),
        })
        .await
        .unwrap()
        .transaction_id
}

fn debit_row(amount: i64, at: DateTime<Utc>) -> ExternalTransaction {
    ExternalTransaction {
        external_id: None,
        amount: Decimal::from(-amount),
        currency: Currency::USD,
        timestamp: at,
    }
}

fn engine(
    ledger: Arc<Ledger>,
    feed: impl ExternalFeed + 'static,
    config: ReconciliationConfig,
) -> ReconciliationEngine {
    ReconciliationEngine::new(ledger, Arc::new(feed), config)
}

#[tokio::test]
async fn three_local_two_matched_one_synthesized() {
    let (ledger, _tmp) = open_ledger().await;
    let account = funded_account(&ledger, ApprovalPolicy::default(), 1000).await;

    for amount in [100, 200, 300] {
        outgoing(&ledger, account, amount).await;
    }
    assert_eq!(ledger.account(&account).unwrap().balance, Decimal::from(400));

    let now = Utc::now();
    let feed = StaticFeed::new(vec![
        debit_row(100, now),
        debit_row(200, now),
        ExternalTransaction {
            external_id: Some("ex-new".to_string()),
            amount: Decimal::from(50),
            currency: Currency::USD,
            timestamp: now,
        },
    ]);
    let engine = engine(ledger.clone(), feed, ReconciliationConfig::default());

    let result = engine
        .reconcile(account, now - Duration::hours(1), now + Duration::hours(1))
        .await
        .unwrap();

    assert_eq!(result.matched.len(), 2);
    assert_eq!(result.local_only.len(), 1);
    assert_eq!(result.external_only.len(), 1);
    assert!(result.disputed.is_empty());

    // Conservation: every local and every external row is accounted for
    assert_eq!(result.matched.len() + result.local_only.len(), 3);
    assert_eq!(result.matched.len() + result.external_only.len(), 3);

    // The external-only credit was synthesized as a completed transaction
    let synthesized = ledger.transaction(result.external_only[0]).unwrap();
    assert_eq!(synthesized.status, TransactionStatus::Completed);
    assert_eq!(synthesized.external_ref.as_deref(), Some("ex-new"));
    assert_eq!(ledger.account(&account).unwrap().balance, Decimal::from(450));
}

#[tokio::test]
async fn rerun_after_convergence_synthesizes_nothing() {
    let (ledger, _tmp) = open_ledger().await;
    let account = funded_account(&ledger, ApprovalPolicy::default(), 1000).await;
    outgoing(&ledger, account, 100).await;

    let now = Utc::now();
    let rows = vec![
        debit_row(100, now),
        ExternalTransaction {
            external_id: Some("ex-new".to_string()),
            amount: Decimal::from(50),
            currency: Currency::USD,
            timestamp: now,
        },
        // No stable id: matched via the deterministic synthetic reference
        ExternalTransaction {
            external_id: None,
            amount: Decimal::from(25),
            currency: Currency::USD,
            timestamp: now,
        },
    ];
    let engine = engine(
        ledger.clone(),
        StaticFeed::new(rows),
        ReconciliationConfig::default(),
    );

    let from = now - Duration::hours(1);
    let to = now + Duration::hours(1);

    let first = engine.reconcile(account, from, to).await.unwrap();
    assert_eq!(first.external_only.len(), 2);
    let balance_after_first = ledger.account(&account).unwrap().balance;

    let second = engine.reconcile(account, from, to).await.unwrap();
    assert!(second.external_only.is_empty());
    assert!(second.local_only.is_empty());
    assert_eq!(second.matched.len(), 3);
    assert!(second.converged());

    // Conservation: the second run moved no money
    assert_eq!(ledger.account(&account).unwrap().balance, balance_after_first);
    assert_eq!(ledger.transactions(&account, None, None).unwrap().len(), 3);
}

#[tokio::test]
async fn pending_past_grace_is_disputed() {
    let (ledger, _tmp) = open_ledger().await;
    let account = funded_account(&ledger, ApprovalPolicy::quorum_of(2), 1000).await;
    let txn_id = outgoing(&ledger, account, 100).await;
    assert_eq!(
        ledger.transaction(txn_id).unwrap().status,
        TransactionStatus::Pending
    );

    let config = ReconciliationConfig {
        dispute_grace_secs: 0,
        ..Default::default()
    };
    let engine = engine(ledger.clone(), StaticFeed::new(vec![]), config);

    let now = Utc::now();
    let result = engine
        .reconcile(account, now - Duration::hours(1), now + Duration::hours(1))
        .await
        .unwrap();

    assert_eq!(result.local_only, vec![txn_id]);
    assert_eq!(result.disputed, vec![txn_id]);

    let disputed = ledger.transaction(txn_id).unwrap();
    assert_eq!(disputed.status, TransactionStatus::Disputed);

    // Dispute keeps the reservation for manual resolution
    assert_eq!(ledger.account(&account).unwrap().reserved, Decimal::from(100));
}

#[tokio::test]
async fn pending_within_grace_left_alone() {
    let (ledger, _tmp) = open_ledger().await;
    let account = funded_account(&ledger, ApprovalPolicy::quorum_of(2), 1000).await;
    let txn_id = outgoing(&ledger, account, 100).await;

    let engine = engine(
        ledger.clone(),
        StaticFeed::new(vec![]),
        ReconciliationConfig::default(),
    );

    let now = Utc::now();
    let result = engine
        .reconcile(account, now - Duration::hours(1), now + Duration::hours(1))
        .await
        .unwrap();

    assert_eq!(result.local_only, vec![txn_id]);
    assert!(result.disputed.is_empty());
    assert_eq!(
        ledger.transaction(txn_id).unwrap().status,
        TransactionStatus::Pending
    );
}

#[tokio::test]
async fn unavailable_feed_touches_nothing() {
    let (ledger, _tmp) = open_ledger().await;
    let account = funded_account(&ledger, ApprovalPolicy::quorum_of(2), 1000).await;
    outgoing(&ledger, account, 100).await;

    let config = ReconciliationConfig {
        dispute_grace_secs: 0,
        ..Default::default()
    };
    let engine = engine(ledger.clone(), StaticFeed::unavailable(), config);

    let now = Utc::now();
    let err = engine
        .reconcile(account, now - Duration::hours(1), now + Duration::hours(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ReconciliationError::SourceUnavailable(_)));

    // Grace period had expired, but the failed fetch must leave every local
    // record untouched
    let transactions = ledger.transactions(&account, None, None).unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].status, TransactionStatus::Pending);
}

struct SlowFeed;

#[async_trait]
impl ExternalFeed for SlowFeed {
    async fn fetch(
        &self,
        _account_id: AccountId,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> reconciliation::Result<Vec<ExternalTransaction>> {
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        Ok(vec![])
    }
}

#[tokio::test]
async fn slow_feed_counts_as_unavailable() {
    let (ledger, _tmp) = open_ledger().await;
    let account = funded_account(&ledger, ApprovalPolicy::default(), 100).await;

    let config = ReconciliationConfig {
        feed_timeout_ms: 50,
        ..Default::default()
    };
    let engine = engine(ledger.clone(), SlowFeed, config);

    let now = Utc::now();
    let err = engine
        .reconcile(account, now - Duration::hours(1), now)
        .await
        .unwrap_err();
    assert!(matches!(err, ReconciliationError::SourceUnavailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn timestamp_outside_tolerance_does_not_match() {
    let (ledger, _tmp) = open_ledger().await;
    let account = funded_account(&ledger, ApprovalPolicy::default(), 1000).await;
    outgoing(&ledger, account, 100).await;

    let now = Utc::now();
    // Same amount and currency, but reported far outside the tolerance
    let feed = StaticFeed::new(vec![debit_row(100, now + Duration::hours(2))]);
    let config = ReconciliationConfig {
        match_tolerance_secs: 300,
        ..Default::default()
    };
    let engine = engine(ledger.clone(), feed, config);

    let result = engine
        .reconcile(account, now - Duration::hours(3), now + Duration::hours(3))
        .await
        .unwrap();

    assert!(result.matched.is_empty());
    assert_eq!(result.local_only.len(), 1);
    // The stray external debit is synthesized; the local 100 stays unmatched
    assert_eq!(result.external_only.len(), 1);
}
