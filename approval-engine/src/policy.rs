//! Approval policy configuration
//!
//! A vault carries one `ApprovalPolicy`. A quorum of zero means outgoing
//! transfers complete without sign-off; any positive quorum routes them
//! through the quorum state machine.

use serde::{Deserialize, Serialize};

/// Per-vault approval policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    /// Number of distinct approve votes required for completion
    pub quorum: u32,

    /// Rule deciding when reject votes fail the transaction
    pub rejection: RejectionRule,
}

impl ApprovalPolicy {
    /// Policy requiring `quorum` approvals with single-rejection veto
    pub fn quorum_of(quorum: u32) -> Self {
        Self {
            quorum,
            rejection: RejectionRule::AnyReject,
        }
    }

    /// Whether transactions under this policy need sign-off at all
    pub fn requires_approval(&self) -> bool {
        self.quorum > 0
    }
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self {
            quorum: 0,
            rejection: RejectionRule::AnyReject,
        }
    }
}

/// Rejection rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionRule {
    /// A single reject vote fails the transaction
    AnyReject,
    /// Reject votes must themselves reach a quorum
    RejectQuorum(u32),
}

/// Approval status of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ApprovalStatus {
    /// Vault policy does not require sign-off
    NotRequired = 1,
    /// Waiting on votes
    Pending = 2,
    /// Quorum reached
    Approved = 3,
    /// Rejection rule met
    Rejected = 4,
}

/// A single approve/reject decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum VoteDecision {
    /// Vote in favor
    Approve = 1,
    /// Vote against
    Reject = 2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_requires_no_approval() {
        let policy = ApprovalPolicy::default();
        assert!(!policy.requires_approval());
    }

    #[test]
    fn test_quorum_of() {
        let policy = ApprovalPolicy::quorum_of(2);
        assert!(policy.requires_approval());
        assert_eq!(policy.quorum, 2);
        assert_eq!(policy.rejection, RejectionRule::AnyReject);
    }
}
