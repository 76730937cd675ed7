//! Quorum tracking state machine
//!
//! The tracker is rebuilt per vote from the durable vote log, so it carries no
//! state of its own between calls. The caller persists the vote and the
//! resulting transition atomically.

use crate::error::{ApprovalError, Result};
use crate::policy::{ApprovalPolicy, RejectionRule, VoteDecision};
use std::collections::HashSet;

/// Outcome of recording a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Quorum not yet met; transaction stays pending
    Pending,
    /// Approval quorum reached
    Approved,
    /// Rejection rule met
    Rejected,
}

/// Vote tally for one transaction
#[derive(Debug, Clone)]
pub struct QuorumTracker {
    required: u32,
    rejection: RejectionRule,
    eligible: HashSet<String>,
    voters: HashSet<String>,
    approvals: u32,
    rejections: u32,
}

impl QuorumTracker {
    /// Create a tracker for a policy and the vault's eligible approver set
    pub fn new(policy: &ApprovalPolicy, eligible: HashSet<String>) -> Result<Self> {
        if policy.quorum == 0 {
            return Err(ApprovalError::InvalidPolicy(
                "quorum tracker requires a positive quorum".to_string(),
            ));
        }
        if let RejectionRule::RejectQuorum(0) = policy.rejection {
            return Err(ApprovalError::InvalidPolicy(
                "rejection quorum must be positive".to_string(),
            ));
        }

        Ok(Self {
            required: policy.quorum,
            rejection: policy.rejection,
            eligible,
            voters: HashSet::new(),
            approvals: 0,
            rejections: 0,
        })
    }

    /// Record a vote and evaluate the outcome
    ///
    /// Fails with `NotAnApprover` for actors outside the eligible set and
    /// `AlreadyVoted` on duplicates; the tally is unchanged on failure.
    pub fn record(&mut self, voter: &str, decision: VoteDecision) -> Result<VoteOutcome> {
        if !self.eligible.contains(voter) {
            return Err(ApprovalError::NotAnApprover(voter.to_string()));
        }
        if !self.voters.insert(voter.to_string()) {
            return Err(ApprovalError::AlreadyVoted(voter.to_string()));
        }

        match decision {
            VoteDecision::Approve => self.approvals += 1,
            VoteDecision::Reject => self.rejections += 1,
        }

        let outcome = self.outcome();
        tracing::debug!(
            voter,
            approvals = self.approvals,
            rejections = self.rejections,
            required = self.required,
            ?outcome,
            "Vote recorded"
        );

        Ok(outcome)
    }

    /// Current outcome of the tally
    ///
    /// Rejection wins ties: a tally that satisfies both rules is rejected.
    pub fn outcome(&self) -> VoteOutcome {
        let rejected = match self.rejection {
            RejectionRule::AnyReject => self.rejections > 0,
            RejectionRule::RejectQuorum(n) => self.rejections >= n,
        };

        if rejected {
            VoteOutcome::Rejected
        } else if self.approvals >= self.required {
            VoteOutcome::Approved
        } else {
            VoteOutcome::Pending
        }
    }

    /// Approve votes recorded so far
    pub fn approvals(&self) -> u32 {
        self.approvals
    }

    /// Reject votes recorded so far
    pub fn rejections(&self) -> u32 {
        self.rejections
    }
}
