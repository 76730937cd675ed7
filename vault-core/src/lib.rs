//! VaultLedger Core
//!
//! Durable vault ledger: accounts with live and reserved balances, quorum
//! approval of outgoing transfers, an append-only balance history, and typed
//! event publication on every transaction status change.
//!
//! # Architecture
//!
//! - **Single Writer**: all mutations funnel through one actor task
//! - **Atomic units of work**: a balance mutation and its history snapshot
//!   land in one RocksDB write batch
//! - **Choke-point transitions**: every status change runs through one
//!   transition function enforcing the terminal-state guard
//!
//! # Invariants
//!
//! - `0 <= reserved <= balance` for every account at every observable point
//! - Transactions transition only `pending -> {completed, failed, disputed}`
//! - History and vote logs are append-only: never modified, never deleted

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod balance;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod metrics;
pub mod query;
pub mod storage;
pub mod types;

// Re-exports
pub use approval_engine::{ApprovalPolicy, ApprovalStatus, RejectionRule, VoteDecision};
pub use config::Config;
pub use error::{Error, Result};
pub use events::{LedgerNotification, NotificationKind, NotificationSink};
pub use ledger::{EntryDirection, ExternalEntry, Ledger, TransferRequest};
pub use query::{DirectionFilter, Page, TransactionFilter, TransactionPage};
pub use storage::Storage;
pub use types::{
    Account, AccountId, ActorId, ApprovalVote, Approver, BalanceSnapshot, Currency, Party,
    Transaction, TransactionStatus, Vault, VaultId, VaultStatus,
};
