//! Actor-based concurrency for the ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! one logical writer task serializes every ledger mutation, which makes
//! per-account updates race-free without row locks. Reads bypass the actor
//! and hit storage directly.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │        Callers (API surface, reconciliation)          │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends commands to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │        LedgerCore -> Storage (atomic batches)         │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::ledger::{ExternalEntry, LedgerCore, TransferRequest};
use crate::types::{
    Account, ActorId, Approver, Currency, Transaction, Vault, VaultId, VaultStatus,
};
use crate::{Error, Result};
use approval_engine::{ApprovalPolicy, VoteDecision};
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Command sent to the ledger actor
pub enum LedgerCommand {
    /// Create a vault
    CreateVault {
        /// Owner identity
        owner: ActorId,
        /// Human-readable name
        name: String,
        /// Approval policy for outgoing transfers
        policy: ApprovalPolicy,
        /// Response channel
        response: oneshot::Sender<Result<Vault>>,
    },

    /// Change a vault's status
    SetVaultStatus {
        /// Vault to update
        vault_id: VaultId,
        /// New status
        status: VaultStatus,
        /// Response channel
        response: oneshot::Sender<Result<Vault>>,
    },

    /// Replace a vault's approval policy (future transactions only)
    UpdatePolicy {
        /// Vault to update
        vault_id: VaultId,
        /// New policy
        policy: ApprovalPolicy,
        /// Response channel
        response: oneshot::Sender<Result<Vault>>,
    },

    /// Grant approver standing on a vault
    AddApprover {
        /// Vault the standing applies to
        vault_id: VaultId,
        /// Approver identity
        actor: ActorId,
        /// Response channel
        response: oneshot::Sender<Result<Approver>>,
    },

    /// Create an account within a vault
    CreateAccount {
        /// Owning vault
        vault_id: VaultId,
        /// Account currency (fixed at creation)
        currency: Currency,
        /// Opening balance
        initial_balance: Decimal,
        /// Response channel
        response: oneshot::Sender<Result<Account>>,
    },

    /// Create a transfer (the only write entry point for money movement)
    CreateTransaction {
        /// Transfer request
        request: TransferRequest,
        /// Response channel
        response: oneshot::Sender<Result<Transaction>>,
    },

    /// Record an externally reported movement as a local transaction
    RecordExternal {
        /// External movement
        entry: ExternalEntry,
        /// Response channel
        response: oneshot::Sender<Result<Transaction>>,
    },

    /// Cast an approval vote
    CastVote {
        /// Transaction voted on
        transaction_id: Uuid,
        /// Voting approver
        voter: ActorId,
        /// Decision
        decision: VoteDecision,
        /// Response channel
        response: oneshot::Sender<Result<Transaction>>,
    },

    /// Cancel a pending transaction
    Cancel {
        /// Transaction to cancel
        transaction_id: Uuid,
        /// Actor requesting cancellation
        actor: ActorId,
        /// Response channel
        response: oneshot::Sender<Result<Transaction>>,
    },

    /// Fail a pending transaction, releasing its reservation
    MarkFailed {
        /// Transaction to fail
        transaction_id: Uuid,
        /// Failure reason
        reason: String,
        /// Response channel
        response: oneshot::Sender<Result<Transaction>>,
    },

    /// Flag a pending transaction as disputed
    MarkDisputed {
        /// Transaction to flag
        transaction_id: Uuid,
        /// Dispute reason
        reason: String,
        /// Response channel
        response: oneshot::Sender<Result<Transaction>>,
    },

    /// Retry the destination-side credit of a completed transaction
    SettleDestination {
        /// Transaction to settle
        transaction_id: Uuid,
        /// Response channel
        response: oneshot::Sender<Result<Transaction>>,
    },

    /// Shutdown actor
    Shutdown,
}

impl std::fmt::Debug for LedgerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LedgerCommand::CreateVault { .. } => "CreateVault",
            LedgerCommand::SetVaultStatus { .. } => "SetVaultStatus",
            LedgerCommand::UpdatePolicy { .. } => "UpdatePolicy",
            LedgerCommand::AddApprover { .. } => "AddApprover",
            LedgerCommand::CreateAccount { .. } => "CreateAccount",
            LedgerCommand::CreateTransaction { .. } => "CreateTransaction",
            LedgerCommand::RecordExternal { .. } => "RecordExternal",
            LedgerCommand::CastVote { .. } => "CastVote",
            LedgerCommand::Cancel { .. } => "Cancel",
            LedgerCommand::MarkFailed { .. } => "MarkFailed",
            LedgerCommand::MarkDisputed { .. } => "MarkDisputed",
            LedgerCommand::SettleDestination { .. } => "SettleDestination",
            LedgerCommand::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}

/// Actor that processes ledger commands
#[derive(Debug)]
pub struct LedgerActor {
    /// Business logic core
    core: LedgerCore,

    /// Mailbox for incoming commands
    mailbox: mpsc::Receiver<LedgerCommand>,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(core: LedgerCore, mailbox: mpsc::Receiver<LedgerCommand>) -> Self {
        Self { core, mailbox }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(cmd) = self.mailbox.recv().await {
            if matches!(cmd, LedgerCommand::Shutdown) {
                tracing::info!("Ledger actor shutting down");
                break;
            }

            let started = std::time::Instant::now();
            self.handle_command(cmd);
            self.core
                .metrics()
                .record_mutation_duration(started.elapsed().as_secs_f64());
        }
    }

    /// Handle a single command
    ///
    /// Send failures mean the caller gave up waiting; the mutation has
    /// already been applied, so they are logged and dropped.
    fn handle_command(&mut self, cmd: LedgerCommand) {
        match cmd {
            LedgerCommand::CreateVault {
                owner,
                name,
                policy,
                response,
            } => {
                let _ = response.send(self.core.create_vault(owner, name, policy));
            }

            LedgerCommand::SetVaultStatus {
                vault_id,
                status,
                response,
            } => {
                let _ = response.send(self.core.set_vault_status(&vault_id, status));
            }

            LedgerCommand::UpdatePolicy {
                vault_id,
                policy,
                response,
            } => {
                let _ = response.send(self.core.update_policy(&vault_id, policy));
            }

            LedgerCommand::AddApprover {
                vault_id,
                actor,
                response,
            } => {
                let _ = response.send(self.core.add_approver(&vault_id, actor));
            }

            LedgerCommand::CreateAccount {
                vault_id,
                currency,
                initial_balance,
                response,
            } => {
                let _ = response.send(self.core.create_account(&vault_id, currency, initial_balance));
            }

            LedgerCommand::CreateTransaction { request, response } => {
                let _ = response.send(self.core.create_transaction(request));
            }

            LedgerCommand::RecordExternal { entry, response } => {
                let _ = response.send(self.core.record_external(entry));
            }

            LedgerCommand::CastVote {
                transaction_id,
                voter,
                decision,
                response,
            } => {
                let _ = response.send(self.core.cast_vote(transaction_id, &voter, decision));
            }

            LedgerCommand::Cancel {
                transaction_id,
                actor,
                response,
            } => {
                let _ = response.send(self.core.cancel(transaction_id, &actor));
            }

            LedgerCommand::MarkFailed {
                transaction_id,
                reason,
                response,
            } => {
                let _ = response.send(self.core.mark_failed(transaction_id, reason));
            }

            LedgerCommand::MarkDisputed {
                transaction_id,
                reason,
                response,
            } => {
                let _ = response.send(self.core.mark_disputed(transaction_id, reason));
            }

            LedgerCommand::SettleDestination {
                transaction_id,
                response,
            } => {
                let _ = response.send(self.core.settle_destination(transaction_id));
            }

            LedgerCommand::Shutdown => {
                // Handled in main loop
            }
        }
    }
}

/// Handle for sending commands to the actor
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerCommand>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerCommand>) -> Self {
        Self { sender }
    }

    async fn call<T>(
        &self,
        cmd: LedgerCommand,
        rx: oneshot::Receiver<Result<T>>,
    ) -> Result<T> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Create a vault
    pub async fn create_vault(
        &self,
        owner: ActorId,
        name: String,
        policy: ApprovalPolicy,
    ) -> Result<Vault> {
        let (tx, rx) = oneshot::channel();
        self.call(
            LedgerCommand::CreateVault {
                owner,
                name,
                policy,
                response: tx,
            },
            rx,
        )
        .await
    }

    /// Change a vault's status
    pub async fn set_vault_status(&self, vault_id: VaultId, status: VaultStatus) -> Result<Vault> {
        let (tx, rx) = oneshot::channel();
        self.call(
            LedgerCommand::SetVaultStatus {
                vault_id,
                status,
                response: tx,
            },
            rx,
        )
        .await
    }

    /// Replace a vault's approval policy
    pub async fn update_policy(&self, vault_id: VaultId, policy: ApprovalPolicy) -> Result<Vault> {
        let (tx, rx) = oneshot::channel();
        self.call(
            LedgerCommand::UpdatePolicy {
                vault_id,
                policy,
                response: tx,
            },
            rx,
        )
        .await
    }

    /// Grant approver standing on a vault
    pub async fn add_approver(&self, vault_id: VaultId, actor: ActorId) -> Result<Approver> {
        let (tx, rx) = oneshot::channel();
        self.call(
            LedgerCommand::AddApprover {
                vault_id,
                actor,
                response: tx,
            },
            rx,
        )
        .await
    }

    /// Create an account within a vault
    pub async fn create_account(
        &self,
        vault_id: VaultId,
        currency: Currency,
        initial_balance: Decimal,
    ) -> Result<Account> {
        let (tx, rx) = oneshot::channel();
        self.call(
            LedgerCommand::CreateAccount {
                vault_id,
                currency,
                initial_balance,
                response: tx,
            },
            rx,
        )
        .await
    }

    /// Create a transfer
    pub async fn create_transaction(&self, request: TransferRequest) -> Result<Transaction> {
        let (tx, rx) = oneshot::channel();
        self.call(LedgerCommand::CreateTransaction { request, response: tx }, rx)
            .await
    }

    /// Record an externally reported movement
    pub async fn record_external(&self, entry: ExternalEntry) -> Result<Transaction> {
        let (tx, rx) = oneshot::channel();
        self.call(LedgerCommand::RecordExternal { entry, response: tx }, rx)
            .await
    }

    /// Cast an approval vote
    pub async fn cast_vote(
        &self,
        transaction_id: Uuid,
        voter: ActorId,
        decision: VoteDecision,
    ) -> Result<Transaction> {
        let (tx, rx) = oneshot::channel();
        self.call(
            LedgerCommand::CastVote {
                transaction_id,
                voter,
                decision,
                response: tx,
            },
            rx,
        )
        .await
    }

    /// Cancel a pending transaction
    pub async fn cancel(&self, transaction_id: Uuid, actor: ActorId) -> Result<Transaction> {
        let (tx, rx) = oneshot::channel();
        self.call(
            LedgerCommand::Cancel {
                transaction_id,
                actor,
                response: tx,
            },
            rx,
        )
        .await
    }

    /// Fail a pending transaction
    pub async fn mark_failed(&self, transaction_id: Uuid, reason: String) -> Result<Transaction> {
        let (tx, rx) = oneshot::channel();
        self.call(
            LedgerCommand::MarkFailed {
                transaction_id,
                reason,
                response: tx,
            },
            rx,
        )
        .await
    }

    /// Flag a pending transaction as disputed
    pub async fn mark_disputed(&self, transaction_id: Uuid, reason: String) -> Result<Transaction> {
        let (tx, rx) = oneshot::channel();
        self.call(
            LedgerCommand::MarkDisputed {
                transaction_id,
                reason,
                response: tx,
            },
            rx,
        )
        .await
    }

    /// Retry the destination-side credit of a completed transaction
    pub async fn settle_destination(&self, transaction_id: Uuid) -> Result<Transaction> {
        let (tx, rx) = oneshot::channel();
        self.call(
            LedgerCommand::SettleDestination {
                transaction_id,
                response: tx,
            },
            rx,
        )
        .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerCommand::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(core: LedgerCore) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(1000); // Bounded channel for backpressure
    let actor = LedgerActor::new(core, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}
