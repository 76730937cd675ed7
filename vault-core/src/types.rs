//! Core types for the vault ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (Decimal for money)
//! - Append-only audit records (votes, balance snapshots)

use approval_engine::{ApprovalStatus, VoteDecision};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Vault identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VaultId(Uuid);

impl VaultId {
    /// Wrap an existing UUID
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Raw key bytes for storage
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for VaultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Wrap an existing UUID
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Raw key bytes for storage
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External identity acting on the ledger (vault owner, approver, initiator)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(String);

impl ActorId {
    /// Create from any string-like identity
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supported currencies (fixed per account at creation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Currency {
    /// US Dollar
    USD,
    /// Euro
    EUR,
    /// USD Coin
    USDC,
    /// Tether
    USDT,
    /// Bitcoin
    BTC,
    /// Ether
    ETH,
}

impl Currency {
    /// Canonical code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::USDC => "USDC",
            Currency::USDT => "USDT",
            Currency::BTC => "BTC",
            Currency::ETH => "ETH",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "USDC" => Some(Currency::USDC),
            "USDT" => Some(Currency::USDT),
            "BTC" => Some(Currency::BTC),
            "ETH" => Some(Currency::ETH),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Vault status (soft transitions only; vaults are never hard-deleted)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum VaultStatus {
    /// Accepting transfers
    Active = 1,
    /// New outgoing transfers refused
    Paused = 2,
    /// Permanently retired
    Closed = 3,
}

/// Top-level ownership and policy boundary for a set of accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vault {
    /// Vault ID
    pub vault_id: VaultId,

    /// Owner identity
    pub owner: ActorId,

    /// Human-readable name
    pub name: String,

    /// Status
    pub status: VaultStatus,

    /// Approval policy for outgoing transfers
    pub policy: approval_engine::ApprovalPolicy,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Vault {
    /// Whether the vault accepts new outgoing transfers
    pub fn accepts_transfers(&self) -> bool {
        self.status == VaultStatus::Active
    }
}

/// Balance-holding entity within a vault, denominated in one currency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Account ID
    pub account_id: AccountId,

    /// Owning vault
    pub vault_id: VaultId,

    /// Currency (fixed at creation)
    pub currency: Currency,

    /// Total funds credited
    pub balance: Decimal,

    /// Funds earmarked for in-flight transactions
    pub reserved: Decimal,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Funds eligible for new reservations
    pub fn available(&self) -> Decimal {
        self.balance - self.reserved
    }

    /// Verify `0 <= reserved <= balance`
    pub fn check_invariants(&self) -> Result<()> {
        if self.reserved < Decimal::ZERO {
            return Err(Error::InvariantViolation(format!(
                "account {} reserved is negative: {}",
                self.account_id, self.reserved
            )));
        }
        if self.reserved > self.balance {
            return Err(Error::InvariantViolation(format!(
                "account {} reserved {} exceeds balance {}",
                self.account_id, self.reserved, self.balance
            )));
        }
        Ok(())
    }
}

/// Transaction endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Party {
    /// Ledger account
    Account(AccountId),
    /// External address (exchange deposit address, on-chain address, ...)
    External(String),
    /// Vault-level reference without balance effect
    Vault(VaultId),
}

impl Party {
    /// Account ID if this endpoint is a ledger account
    pub fn account_id(&self) -> Option<&AccountId> {
        match self {
            Party::Account(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::Account(id) => write!(f, "account:{}", id),
            Party::External(addr) => write!(f, "external:{}", addr),
            Party::Vault(id) => write!(f, "vault:{}", id),
        }
    }
}

/// Transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransactionStatus {
    /// Awaiting approval or settlement
    Pending = 1,
    /// Funds moved (terminal)
    Completed = 2,
    /// Rejected, cancelled, or errored (terminal)
    Failed = 3,
    /// Flagged by reconciliation, awaiting manual resolution (terminal)
    Disputed = 4,
}

impl TransactionStatus {
    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

/// First-class ledger fact recording one money movement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID
    pub transaction_id: Uuid,

    /// Source endpoint
    pub source: Party,

    /// Destination endpoint
    pub destination: Party,

    /// Amount (always positive)
    pub amount: Decimal,

    /// Currency
    pub currency: Currency,

    /// Actor that requested the transfer
    pub initiated_by: ActorId,

    /// Status
    pub status: TransactionStatus,

    /// Approval quorum required by the source vault's policy
    pub approvals_required: u32,

    /// Approve votes recorded so far
    pub approvals_current: u32,

    /// Approval status
    pub approval_status: ApprovalStatus,

    /// External feed identifier, set by reconciliation matching/synthesis
    pub external_ref: Option<String>,

    /// Failure/dispute reason
    pub reason: Option<String>,

    /// Durable marker: destination-side credit has been applied
    pub destination_credited: bool,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Check if the transaction is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Account IDs referenced by this transaction
    pub fn account_ids(&self) -> Vec<AccountId> {
        let mut ids = Vec::new();
        if let Some(id) = self.source.account_id() {
            ids.push(*id);
        }
        if let Some(id) = self.destination.account_id() {
            ids.push(*id);
        }
        ids
    }
}

/// (Vault, Identity) pair granting vote authority
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Approver {
    /// Vault the standing applies to
    pub vault_id: VaultId,

    /// Approver identity
    pub actor: ActorId,

    /// When standing was granted
    pub added_at: DateTime<Utc>,
}

/// Immutable audit row for one approve/reject action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalVote {
    /// Vote ID
    pub vote_id: Uuid,

    /// Transaction voted on
    pub transaction_id: Uuid,

    /// Vault whose policy governs the vote
    pub vault_id: VaultId,

    /// Voting approver
    pub approver: ActorId,

    /// Decision
    pub decision: VoteDecision,

    /// When the vote was cast
    pub voted_at: DateTime<Utc>,
}

/// Immutable post-mutation balance snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Account
    pub account_id: AccountId,

    /// Total balance after the mutation
    pub balance: Decimal,

    /// Reserved after the mutation
    pub reserved: Decimal,

    /// Derived available balance
    pub available: Decimal,

    /// Currency
    pub currency: Currency,

    /// Snapshot timestamp
    pub recorded_at: DateTime<Utc>,
}

impl BalanceSnapshot {
    /// Snapshot the current state of an account
    pub fn of(account: &Account) -> Self {
        Self {
            account_id: account.account_id,
            balance: account.balance,
            reserved: account.reserved,
            available: account.available(),
            currency: account.currency,
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_account(balance: i64, reserved: i64) -> Account {
        Account {
            account_id: AccountId::generate(),
            vault_id: VaultId::generate(),
            currency: Currency::USD,
            balance: Decimal::from(balance),
            reserved: Decimal::from(reserved),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(Currency::from_str("USDC"), Some(Currency::USDC));
        assert_eq!(Currency::from_str("BTC"), Some(Currency::BTC));
        assert_eq!(Currency::from_str("DOGE"), None);
    }

    #[test]
    fn test_available_balance() {
        let account = test_account(1000, 300);
        assert_eq!(account.available(), Decimal::from(700));
    }

    #[test]
    fn test_invariant_check() {
        assert!(test_account(1000, 0).check_invariants().is_ok());
        assert!(test_account(1000, 1000).check_invariants().is_ok());
        assert!(test_account(1000, 1001).check_invariants().is_err());
        assert!(test_account(1000, -1).check_invariants().is_err());
    }

    #[test]
    fn test_status_terminal() {
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Completed.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
        assert!(TransactionStatus::Disputed.is_terminal());
    }

    #[test]
    fn test_snapshot_of_account() {
        let account = test_account(500, 200);
        let snapshot = BalanceSnapshot::of(&account);
        assert_eq!(snapshot.balance, Decimal::from(500));
        assert_eq!(snapshot.reserved, Decimal::from(200));
        assert_eq!(snapshot.available, Decimal::from(300));
    }
}
