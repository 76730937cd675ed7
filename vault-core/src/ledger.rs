//! Main ledger orchestration layer
//!
//! `LedgerCore` holds the business rules and runs inside the single-writer
//! actor; `Ledger` is the public async front. Every status change funnels
//! through [`LedgerCore::transition`], which enforces the terminal-state
//! guard: once a transaction leaves `Pending` it never transitions again.
//!
//! # Example
//!
//! ```no_run
//! use vault_core::{Config, Ledger};
//!
//! #[tokio::main]
//! async fn main() -> vault_core::Result<()> {
//!     let config = Config::default();
//!     let ledger = Ledger::open(config).await?;
//!
//!     // let vault = ledger.create_vault(owner, "treasury", policy).await?;
//!
//!     ledger.shutdown().await
//! }
//! ```

use crate::{
    actor::{spawn_ledger_actor, LedgerHandle},
    balance::{self, BalanceDelta},
    events::{LedgerNotification, NoopSink, NotificationKind, NotificationSink},
    metrics::Metrics,
    query::{self, TransactionFilter, TransactionPage},
    types::{
        Account, AccountId, ActorId, ApprovalVote, Approver, BalanceSnapshot, Currency, Party,
        Transaction, TransactionStatus, Vault, VaultId, VaultStatus,
    },
    Config, Error, Result, Storage,
};
use approval_engine::{ApprovalPolicy, ApprovalStatus, QuorumTracker, VoteDecision, VoteOutcome};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Transfer request: the only write entry point for money movement
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Source ledger account (funds are reserved here)
    pub source: AccountId,

    /// Destination endpoint
    pub destination: Party,

    /// Amount (must be positive)
    pub amount: Decimal,

    /// Actor requesting the transfer
    pub initiated_by: ActorId,
}

/// Direction of an externally reported movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDirection {
    /// Funds arrived at the local account
    Credit,
    /// Funds left the local account
    Debit,
}

/// Externally reported movement to be recorded as a local transaction
///
/// Reconciliation synthesizes these for external-only rows so the ledger
/// converges toward the external source of truth.
#[derive(Debug, Clone)]
pub struct ExternalEntry {
    /// Local account the movement applies to
    pub account_id: AccountId,

    /// Credit or debit from the local account's perspective
    pub direction: EntryDirection,

    /// Amount (must be positive)
    pub amount: Decimal,

    /// Currency as reported by the feed
    pub currency: Currency,

    /// Stable external identifier, kept for idempotent re-runs
    pub external_ref: String,

    /// When the movement happened according to the feed
    pub occurred_at: DateTime<Utc>,
}

/// Business logic core, owned by the single-writer actor
pub struct LedgerCore {
    storage: Arc<Storage>,
    sink: Arc<dyn NotificationSink>,
    metrics: Metrics,
}

impl std::fmt::Debug for LedgerCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerCore").finish_non_exhaustive()
    }
}

impl LedgerCore {
    /// Create the core over opened storage
    pub fn new(storage: Arc<Storage>, sink: Arc<dyn NotificationSink>, metrics: Metrics) -> Self {
        Self {
            storage,
            sink,
            metrics,
        }
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    // Vault operations

    /// Create a vault
    pub fn create_vault(
        &self,
        owner: ActorId,
        name: String,
        policy: ApprovalPolicy,
    ) -> Result<Vault> {
        let now = Utc::now();
        let vault = Vault {
            vault_id: VaultId::generate(),
            owner,
            name,
            status: VaultStatus::Active,
            policy,
            created_at: now,
            updated_at: now,
        };
        self.storage.put_vault(&vault)?;

        tracing::info!(vault_id = %vault.vault_id, owner = %vault.owner, "Vault created");
        Ok(vault)
    }

    /// Change a vault's status; `Closed` is permanent
    pub fn set_vault_status(&self, vault_id: &VaultId, status: VaultStatus) -> Result<Vault> {
        let mut vault = self.storage.get_vault(vault_id)?;

        if vault.status == VaultStatus::Closed {
            return Err(Error::VaultInactive(format!(
                "vault {} is closed and cannot change status",
                vault_id
            )));
        }

        vault.status = status;
        vault.updated_at = Utc::now();
        self.storage.put_vault(&vault)?;

        tracing::info!(vault_id = %vault_id, status = ?status, "Vault status changed");
        Ok(vault)
    }

    /// Replace a vault's approval policy
    ///
    /// Applies to future transactions only; pending transactions keep the
    /// quorum snapshotted at creation.
    pub fn update_policy(&self, vault_id: &VaultId, policy: ApprovalPolicy) -> Result<Vault> {
        let mut vault = self.storage.get_vault(vault_id)?;
        vault.policy = policy;
        vault.updated_at = Utc::now();
        self.storage.put_vault(&vault)?;

        tracing::info!(vault_id = %vault_id, quorum = vault.policy.quorum, "Policy updated");
        Ok(vault)
    }

    /// Grant approver standing on a vault
    pub fn add_approver(&self, vault_id: &VaultId, actor: ActorId) -> Result<Approver> {
        // Vault must exist
        self.storage.get_vault(vault_id)?;

        let approver = Approver {
            vault_id: *vault_id,
            actor,
            added_at: Utc::now(),
        };
        self.storage.put_approver(&approver)?;

        tracing::info!(vault_id = %vault_id, actor = %approver.actor, "Approver added");
        Ok(approver)
    }

    // Account operations

    /// Create an account, optionally funded with an opening balance
    pub fn create_account(
        &self,
        vault_id: &VaultId,
        currency: Currency,
        initial_balance: Decimal,
    ) -> Result<Account> {
        if initial_balance < Decimal::ZERO {
            return Err(Error::InvalidAmount(format!(
                "initial balance must be non-negative, got {}",
                initial_balance
            )));
        }

        let vault = self.storage.get_vault(vault_id)?;
        if vault.status == VaultStatus::Closed {
            return Err(Error::VaultInactive(format!("vault {} is closed", vault_id)));
        }

        let now = Utc::now();
        let account = Account {
            account_id: AccountId::generate(),
            vault_id: *vault_id,
            currency,
            balance: initial_balance,
            reserved: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };

        // Opening balance is a mutation like any other: it gets a history row
        let snapshot = BalanceSnapshot::of(&account);
        self.storage.put_account_with_snapshot(&account, &snapshot)?;
        self.metrics.history_snapshots.inc();

        tracing::info!(
            account_id = %account.account_id,
            vault_id = %vault_id,
            currency = %currency,
            "Account created"
        );
        Ok(account)
    }

    // Transaction operations

    /// Create a transfer: validate, reserve source funds, route through the
    /// approval policy
    pub fn create_transaction(&self, request: TransferRequest) -> Result<Transaction> {
        if request.amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(format!(
                "transfer amount must be positive, got {}",
                request.amount
            )));
        }

        let source = self.storage.get_account(&request.source)?;
        let vault = self.storage.get_vault(&source.vault_id)?;

        if !vault.accepts_transfers() {
            return Err(Error::VaultInactive(format!(
                "vault {} does not accept new transfers",
                vault.vault_id
            )));
        }

        match &request.destination {
            Party::Account(dest_id) => {
                if *dest_id == request.source {
                    return Err(Error::InvalidAmount(
                        "source and destination must differ".to_string(),
                    ));
                }
                let dest = self.storage.get_account(dest_id)?;
                if dest.currency != source.currency {
                    return Err(Error::CurrencyMismatch {
                        expected: source.currency,
                        found: dest.currency,
                    });
                }
            }
            Party::Vault(dest_vault) => {
                // Vault-level reference must at least resolve
                self.storage.get_vault(dest_vault)?;
            }
            Party::External(_) => {}
        }

        // Fails clean on InsufficientFunds: no state written
        let reserved = balance::reserve(&source, request.amount)?;
        let snapshot = BalanceSnapshot::of(&reserved);

        let requires_approval = vault.policy.requires_approval();
        let now = Utc::now();
        let transaction = Transaction {
            transaction_id: Uuid::now_v7(),
            source: Party::Account(request.source),
            destination: request.destination,
            amount: request.amount,
            currency: source.currency,
            initiated_by: request.initiated_by,
            status: TransactionStatus::Pending,
            approvals_required: if requires_approval { vault.policy.quorum } else { 0 },
            approvals_current: 0,
            approval_status: if requires_approval {
                ApprovalStatus::Pending
            } else {
                ApprovalStatus::NotRequired
            },
            external_ref: None,
            reason: None,
            destination_credited: false,
            created_at: now,
            updated_at: now,
        };

        self.storage
            .create_transaction_atomic(&transaction, Some((&reserved, &snapshot)))?;
        self.metrics.transactions_created.inc();
        self.metrics.history_snapshots.inc();
        self.notify(NotificationKind::TransactionCreated, &transaction);

        tracing::info!(
            transaction_id = %transaction.transaction_id,
            amount = %transaction.amount,
            currency = %transaction.currency,
            requires_approval,
            "Transaction created"
        );

        if requires_approval {
            Ok(transaction)
        } else {
            // No sign-off needed: complete immediately
            self.complete(transaction, None)
        }
    }

    /// Cast an approval vote on a pending transaction
    ///
    /// The quorum tally is rebuilt from the durable vote log on every call;
    /// the new vote row and the resulting transition land in one batch.
    pub fn cast_vote(
        &self,
        transaction_id: Uuid,
        voter: &ActorId,
        decision: VoteDecision,
    ) -> Result<Transaction> {
        let mut transaction = self.storage.get_transaction(transaction_id)?;

        if transaction.is_terminal() {
            return Err(Error::AlreadyTerminal(transaction_id.to_string()));
        }

        let source_id = transaction.source.account_id().copied().ok_or_else(|| {
            Error::Other("approval votes apply to account-sourced transfers".to_string())
        })?;
        let vault = self
            .storage
            .get_vault(&self.storage.get_account(&source_id)?.vault_id)?;

        let prior_votes = self.storage.votes(transaction_id)?;

        // Eligibility is checked against current standing, widened by actors
        // whose votes are already on record (standing may have been revoked
        // since they voted; their votes stand).
        let mut eligible: HashSet<String> = self
            .storage
            .approvers(&vault.vault_id)?
            .into_iter()
            .map(|a| a.actor.as_str().to_string())
            .collect();
        for vote in &prior_votes {
            eligible.insert(vote.approver.as_str().to_string());
        }

        let policy = ApprovalPolicy {
            quorum: transaction.approvals_required,
            rejection: vault.policy.rejection,
        };
        let mut tracker = QuorumTracker::new(&policy, eligible)?;
        for vote in &prior_votes {
            tracker.record(vote.approver.as_str(), vote.decision)?;
        }

        let outcome = tracker.record(voter.as_str(), decision)?;

        let vote = ApprovalVote {
            vote_id: Uuid::now_v7(),
            transaction_id,
            vault_id: vault.vault_id,
            approver: voter.clone(),
            decision,
            voted_at: Utc::now(),
        };

        transaction.approvals_current = tracker.approvals();
        transaction.updated_at = vote.voted_at;

        let transaction = match outcome {
            VoteOutcome::Pending => {
                self.storage
                    .update_transaction_atomic(&transaction, &[], Some(&vote))?;
                self.notify(NotificationKind::VoteRecorded, &transaction);
                transaction
            }
            VoteOutcome::Approved => {
                transaction.approval_status = ApprovalStatus::Approved;
                self.notify(NotificationKind::VoteRecorded, &transaction);
                // Quorum crossed: debit, terminal transition, and the vote
                // row commit together
                self.complete(transaction, Some(&vote))?
            }
            VoteOutcome::Rejected => {
                transaction.approval_status = ApprovalStatus::Rejected;
                self.notify(NotificationKind::VoteRecorded, &transaction);
                self.fail(transaction, "rejected by approval vote".to_string(), Some(&vote))?
            }
        };

        self.metrics.votes_cast.inc();
        Ok(transaction)
    }

    /// Cancel a pending transaction
    pub fn cancel(&self, transaction_id: Uuid, actor: &ActorId) -> Result<Transaction> {
        let transaction = self.storage.get_transaction(transaction_id)?;
        if transaction.is_terminal() {
            return Err(Error::AlreadyTerminal(transaction_id.to_string()));
        }
        self.fail(transaction, format!("cancelled by {}", actor), None)
    }

    /// Fail a pending transaction, releasing its reservation
    pub fn mark_failed(&self, transaction_id: Uuid, reason: String) -> Result<Transaction> {
        let transaction = self.storage.get_transaction(transaction_id)?;
        if transaction.is_terminal() {
            return Err(Error::AlreadyTerminal(transaction_id.to_string()));
        }
        self.fail(transaction, reason, None)
    }

    /// Flag a pending transaction as disputed
    ///
    /// Terminal pending manual resolution. The reservation is kept: the
    /// funds stay earmarked until an operator resolves the dispute.
    pub fn mark_disputed(&self, transaction_id: Uuid, reason: String) -> Result<Transaction> {
        let mut transaction = self.storage.get_transaction(transaction_id)?;
        self.transition(&mut transaction, TransactionStatus::Disputed)?;
        transaction.reason = Some(reason);

        self.storage
            .update_transaction_atomic(&transaction, &[], None)?;
        self.metrics.transactions_disputed.inc();
        self.notify(NotificationKind::TransactionDisputed, &transaction);

        tracing::warn!(
            transaction_id = %transaction_id,
            reason = transaction.reason.as_deref().unwrap_or(""),
            "Transaction disputed"
        );
        Ok(transaction)
    }

    /// Retry the destination-side credit of a completed transaction
    ///
    /// Idempotent keyed by transaction id: a no-op once
    /// `destination_credited` is set. Safe for at-least-once crash recovery.
    pub fn settle_destination(&self, transaction_id: Uuid) -> Result<Transaction> {
        let transaction = self.storage.get_transaction(transaction_id)?;
        if transaction.status != TransactionStatus::Completed {
            return Err(Error::Other(format!(
                "transaction {} is not completed; nothing to settle",
                transaction_id
            )));
        }
        self.credit_destination(transaction)
    }

    /// Record an externally reported movement as a local transaction
    ///
    /// Credits apply directly. Debits the local balance cannot cover are
    /// recorded as disputed rows without touching the balance.
    pub fn record_external(&self, entry: ExternalEntry) -> Result<Transaction> {
        if entry.amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(format!(
                "external amount must be positive, got {}",
                entry.amount
            )));
        }

        let account = self.storage.get_account(&entry.account_id)?;
        if account.currency != entry.currency {
            return Err(Error::CurrencyMismatch {
                expected: account.currency,
                found: entry.currency,
            });
        }

        let now = Utc::now();
        let mut transaction = Transaction {
            transaction_id: Uuid::now_v7(),
            source: Party::External(entry.external_ref.clone()),
            destination: Party::Account(entry.account_id),
            amount: entry.amount,
            currency: entry.currency,
            initiated_by: ActorId::new("reconciliation"),
            status: TransactionStatus::Completed,
            approvals_required: 0,
            approvals_current: 0,
            approval_status: ApprovalStatus::NotRequired,
            external_ref: Some(entry.external_ref.clone()),
            reason: None,
            destination_credited: true,
            // Feed timestamp, so window queries re-find this row
            created_at: entry.occurred_at,
            updated_at: now,
        };

        let mutated = match entry.direction {
            EntryDirection::Credit => balance::commit(&account, BalanceDelta::Credit(entry.amount))
                .map(Some)?,
            EntryDirection::Debit => {
                transaction.source = Party::Account(entry.account_id);
                transaction.destination = Party::External(entry.external_ref.clone());

                match balance::reserve(&account, entry.amount)
                    .and_then(|a| balance::commit(&a, BalanceDelta::Debit(entry.amount)))
                {
                    Ok(account) => Some(account),
                    Err(Error::InsufficientFunds { requested, available }) => {
                        transaction.status = TransactionStatus::Disputed;
                        transaction.destination_credited = false;
                        transaction.reason = Some(format!(
                            "external debit of {} exceeds available balance {}",
                            requested, available
                        ));
                        None
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        let snapshot = mutated.as_ref().map(BalanceSnapshot::of);
        self.storage.create_transaction_atomic(
            &transaction,
            mutated.as_ref().zip(snapshot.as_ref()),
        )?;

        self.metrics.transactions_created.inc();
        match transaction.status {
            TransactionStatus::Completed => {
                self.metrics.transactions_completed.inc();
                self.metrics.history_snapshots.inc();
                self.notify(NotificationKind::TransactionCompleted, &transaction);
            }
            _ => {
                self.metrics.transactions_disputed.inc();
                self.notify(NotificationKind::TransactionDisputed, &transaction);
            }
        }

        tracing::info!(
            transaction_id = %transaction.transaction_id,
            external_ref = %entry.external_ref,
            direction = ?entry.direction,
            status = ?transaction.status,
            "External movement recorded"
        );
        Ok(transaction)
    }

    // Internal transitions

    /// The single choke point for status changes
    ///
    /// Terminal states admit no further transitions; completion and failure
    /// paths that race resolve here, exactly once.
    fn transition(&self, transaction: &mut Transaction, to: TransactionStatus) -> Result<()> {
        if transaction.is_terminal() {
            return Err(Error::AlreadyTerminal(transaction.transaction_id.to_string()));
        }
        transaction.status = to;
        transaction.updated_at = Utc::now();
        Ok(())
    }

    /// Source-side commit and terminal transition, then destination credit
    fn complete(
        &self,
        mut transaction: Transaction,
        vote: Option<&ApprovalVote>,
    ) -> Result<Transaction> {
        self.transition(&mut transaction, TransactionStatus::Completed)?;

        let mut accounts = Vec::new();
        if let Some(source_id) = transaction.source.account_id() {
            let account = self.storage.get_account(source_id)?;
            let debited = balance::commit(&account, BalanceDelta::Debit(transaction.amount))?;
            let snapshot = BalanceSnapshot::of(&debited);
            accounts.push((debited, snapshot));
        }

        let refs: Vec<(&Account, &BalanceSnapshot)> =
            accounts.iter().map(|(a, s)| (a, s)).collect();
        self.storage
            .update_transaction_atomic(&transaction, &refs, vote)?;

        self.metrics.transactions_completed.inc();
        self.metrics.history_snapshots.inc();
        self.notify(NotificationKind::TransactionCompleted, &transaction);

        tracing::info!(
            transaction_id = %transaction.transaction_id,
            amount = %transaction.amount,
            "Transaction completed"
        );

        // Second atomic step of the cross-account commit; recoverable via
        // settle_destination if we crash before it lands
        self.credit_destination(transaction)
    }

    /// Destination-side credit, guarded by the durable marker
    fn credit_destination(&self, mut transaction: Transaction) -> Result<Transaction> {
        if transaction.destination_credited {
            return Ok(transaction);
        }

        transaction.destination_credited = true;
        transaction.updated_at = Utc::now();

        match transaction.destination.account_id().copied() {
            Some(dest_id) => {
                let account = self.storage.get_account(&dest_id)?;
                let credited = balance::commit(&account, BalanceDelta::Credit(transaction.amount))?;
                let snapshot = BalanceSnapshot::of(&credited);
                self.storage.update_transaction_atomic(
                    &transaction,
                    &[(&credited, &snapshot)],
                    None,
                )?;
                self.metrics.history_snapshots.inc();
            }
            None => {
                // External or vault-level destination: no local balance effect
                self.storage
                    .update_transaction_atomic(&transaction, &[], None)?;
            }
        }

        Ok(transaction)
    }

    /// Release the reservation and fail, in one batch
    fn fail(
        &self,
        mut transaction: Transaction,
        reason: String,
        vote: Option<&ApprovalVote>,
    ) -> Result<Transaction> {
        self.transition(&mut transaction, TransactionStatus::Failed)?;
        transaction.reason = Some(reason);

        let mut accounts = Vec::new();
        if let Some(source_id) = transaction.source.account_id() {
            let account = self.storage.get_account(source_id)?;
            let released = balance::release(&account, transaction.amount)?;
            let snapshot = BalanceSnapshot::of(&released);
            accounts.push((released, snapshot));
        }

        let refs: Vec<(&Account, &BalanceSnapshot)> =
            accounts.iter().map(|(a, s)| (a, s)).collect();
        self.storage
            .update_transaction_atomic(&transaction, &refs, vote)?;

        self.metrics.transactions_failed.inc();
        if !refs.is_empty() {
            self.metrics.history_snapshots.inc();
        }
        self.notify(NotificationKind::TransactionFailed, &transaction);

        tracing::info!(
            transaction_id = %transaction.transaction_id,
            reason = transaction.reason.as_deref().unwrap_or(""),
            "Transaction failed"
        );
        Ok(transaction)
    }

    fn notify(&self, kind: NotificationKind, transaction: &Transaction) {
        self.sink
            .publish(LedgerNotification::for_transaction(kind, transaction));
    }
}

/// Main ledger interface
///
/// Mutations funnel through the single-writer actor; reads hit storage
/// directly and never block the writer.
pub struct Ledger {
    /// Actor handle for mutations
    handle: LedgerHandle,

    /// Direct storage access (for reads)
    storage: Arc<Storage>,

    /// Metrics collector
    metrics: Metrics,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").finish_non_exhaustive()
    }
}

impl Ledger {
    /// Open ledger with configuration and a no-op notification sink
    pub async fn open(config: Config) -> Result<Self> {
        Self::open_with_sink(config, Arc::new(NoopSink)).await
    }

    /// Open ledger with a notification sink
    pub async fn open_with_sink(config: Config, sink: Arc<dyn NotificationSink>) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);
        let metrics = Metrics::new().map_err(|e| Error::Config(e.to_string()))?;

        let core = LedgerCore::new(storage.clone(), sink, metrics.clone());
        let handle = spawn_ledger_actor(core);

        Ok(Self {
            handle,
            storage,
            metrics,
        })
    }

    // Mutations (serialized through the actor)

    /// Create a vault
    pub async fn create_vault(
        &self,
        owner: ActorId,
        name: impl Into<String>,
        policy: ApprovalPolicy,
    ) -> Result<Vault> {
        self.handle.create_vault(owner, name.into(), policy).await
    }

    /// Change a vault's status
    pub async fn set_vault_status(&self, vault_id: VaultId, status: VaultStatus) -> Result<Vault> {
        self.handle.set_vault_status(vault_id, status).await
    }

    /// Replace a vault's approval policy (future transactions only)
    pub async fn update_policy(&self, vault_id: VaultId, policy: ApprovalPolicy) -> Result<Vault> {
        self.handle.update_policy(vault_id, policy).await
    }

    /// Grant approver standing on a vault
    pub async fn add_approver(&self, vault_id: VaultId, actor: ActorId) -> Result<Approver> {
        self.handle.add_approver(vault_id, actor).await
    }

    /// Create an account within a vault
    pub async fn create_account(
        &self,
        vault_id: VaultId,
        currency: Currency,
        initial_balance: Decimal,
    ) -> Result<Account> {
        self.handle
            .create_account(vault_id, currency, initial_balance)
            .await
    }

    /// Create a transfer
    pub async fn create_transaction(&self, request: TransferRequest) -> Result<Transaction> {
        self.handle.create_transaction(request).await
    }

    /// Record an externally reported movement
    pub async fn record_external(&self, entry: ExternalEntry) -> Result<Transaction> {
        self.handle.record_external(entry).await
    }

    /// Cast an approval vote
    pub async fn cast_vote(
        &self,
        transaction_id: Uuid,
        voter: ActorId,
        decision: VoteDecision,
    ) -> Result<Transaction> {
        self.handle.cast_vote(transaction_id, voter, decision).await
    }

    /// Cancel a pending transaction
    pub async fn cancel(&self, transaction_id: Uuid, actor: ActorId) -> Result<Transaction> {
        self.handle.cancel(transaction_id, actor).await
    }

    /// Fail a pending transaction
    pub async fn mark_failed(
        &self,
        transaction_id: Uuid,
        reason: impl Into<String>,
    ) -> Result<Transaction> {
        self.handle.mark_failed(transaction_id, reason.into()).await
    }

    /// Flag a pending transaction as disputed
    pub async fn mark_disputed(
        &self,
        transaction_id: Uuid,
        reason: impl Into<String>,
    ) -> Result<Transaction> {
        self.handle.mark_disputed(transaction_id, reason.into()).await
    }

    /// Retry the destination-side credit of a completed transaction
    pub async fn settle_destination(&self, transaction_id: Uuid) -> Result<Transaction> {
        self.handle.settle_destination(transaction_id).await
    }

    // Reads (direct storage, snapshot semantics)

    /// Get vault by ID
    pub fn vault(&self, vault_id: &VaultId) -> Result<Vault> {
        self.storage.get_vault(vault_id)
    }

    /// Get account by ID
    pub fn account(&self, account_id: &AccountId) -> Result<Account> {
        self.storage.get_account(account_id)
    }

    /// Get transaction by ID
    pub fn transaction(&self, transaction_id: Uuid) -> Result<Transaction> {
        self.storage.get_transaction(transaction_id)
    }

    /// Full vote log for a transaction
    pub fn votes(&self, transaction_id: Uuid) -> Result<Vec<ApprovalVote>> {
        self.storage.votes(transaction_id)
    }

    /// All approvers for a vault
    pub fn approvers(&self, vault_id: &VaultId) -> Result<Vec<Approver>> {
        self.storage.approvers(vault_id)
    }

    /// Ordered balance history for an account
    pub fn history(
        &self,
        account_id: &AccountId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<BalanceSnapshot>> {
        self.storage.history(account_id, from, to)
    }

    /// Transactions touching an account within a window, ordered by creation
    pub fn transactions(
        &self,
        account_id: &AccountId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Transaction>> {
        self.storage.account_transactions(account_id, from, to)
    }

    /// Filtered, paginated transaction listing for an account
    pub fn find_transactions(
        &self,
        account_id: &AccountId,
        filter: &TransactionFilter,
        page: query::Page,
    ) -> Result<TransactionPage> {
        let all = self
            .storage
            .account_transactions(account_id, filter.from, filter.to)?;
        Ok(query::paginate(
            query::apply_filter(all, account_id, filter),
            page,
        ))
    }

    /// Export the filtered transaction set as CSV
    pub fn export_csv(
        &self,
        account_id: &AccountId,
        filter: &TransactionFilter,
    ) -> Result<String> {
        let all = self
            .storage
            .account_transactions(account_id, filter.from, filter.to)?;
        query::export_csv(&query::apply_filter(all, account_id, filter))
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Shutdown the writer actor
    pub async fn shutdown(&self) -> Result<()> {
        self.handle.shutdown().await
    }
}
