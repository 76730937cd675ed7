//! Error types for the approval engine

use thiserror::Error;

/// Result type for approval operations
pub type Result<T> = std::result::Result<T, ApprovalError>;

/// Approval errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApprovalError {
    /// Actor has no approver standing on the vault
    #[error("Not an approver: {0}")]
    NotAnApprover(String),

    /// Approver has already voted on this transaction
    #[error("Already voted: {0}")]
    AlreadyVoted(String),

    /// The tracker has already produced a terminal outcome
    #[error("Already decided: {0}")]
    AlreadyDecided(String),

    /// Policy is malformed (zero quorum tracker, rejection quorum of zero)
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),
}
