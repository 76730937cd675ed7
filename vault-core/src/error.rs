//! Error types for the vault ledger
//!
//! Every user-visible failure is a structured code plus a human-readable
//! message; no raw storage or serialization errors cross the ledger boundary.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::Currency;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Amount is zero or negative
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Reservation exceeds available balance
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Amount requested
        requested: Decimal,
        /// Available balance at the time of the request
        available: Decimal,
    },

    /// Balance/reserved corruption; aborts the mutation, never repaired silently
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Transaction currency disagrees with the account currency
    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch {
        /// Account currency
        expected: Currency,
        /// Requested currency
        found: Currency,
    },

    /// Actor lacks approver standing on the vault
    #[error("Not an approver: {0}")]
    NotAnApprover(String),

    /// Approver has already voted on this transaction
    #[error("Already voted: {0}")]
    AlreadyVoted(String),

    /// Operation targets a transaction in a terminal state
    #[error("Transaction already terminal: {0}")]
    AlreadyTerminal(String),

    /// Vault is paused or closed
    #[error("Vault inactive: {0}")]
    VaultInactive(String),

    /// Vault not found
    #[error("Vault not found: {0}")]
    VaultNotFound(String),

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Transaction not found
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidAmount(_) => "INVALID_AMOUNT",
            Error::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Error::InvariantViolation(_) => "INVARIANT_VIOLATION",
            Error::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Error::NotAnApprover(_) => "NOT_AN_APPROVER",
            Error::AlreadyVoted(_) => "ALREADY_VOTED",
            Error::AlreadyTerminal(_) => "ALREADY_TERMINAL",
            Error::VaultInactive(_) => "VAULT_INACTIVE",
            Error::VaultNotFound(_) => "VAULT_NOT_FOUND",
            Error::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Error::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Error::Storage(_) => "STORAGE",
            Error::Serialization(_) => "SERIALIZATION",
            Error::Concurrency(_) => "CONCURRENCY",
            Error::Config(_) => "CONFIG",
            Error::Io(_) => "IO",
            Error::Other(_) => "OTHER",
        }
    }
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<approval_engine::ApprovalError> for Error {
    fn from(err: approval_engine::ApprovalError) -> Self {
        use approval_engine::ApprovalError;
        match err {
            ApprovalError::NotAnApprover(actor) => Error::NotAnApprover(actor),
            ApprovalError::AlreadyVoted(actor) => Error::AlreadyVoted(actor),
            ApprovalError::AlreadyDecided(msg) => Error::AlreadyTerminal(msg),
            ApprovalError::InvalidPolicy(msg) => Error::Config(msg),
        }
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_stable() {
        let err = Error::InsufficientFunds {
            requested: Decimal::from(500),
            available: Decimal::from(100),
        };
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");
        assert!(err.to_string().contains("500"));

        assert_eq!(Error::AlreadyVoted("alice".into()).code(), "ALREADY_VOTED");
    }

    #[test]
    fn test_approval_error_mapping() {
        let err: Error = approval_engine::ApprovalError::NotAnApprover("bob".into()).into();
        assert_eq!(err.code(), "NOT_AN_APPROVER");
    }
}
