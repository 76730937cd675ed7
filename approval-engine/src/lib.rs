//! VaultLedger Approval Engine
//!
//! Quorum state machine gating transactions that require multi-party sign-off.
//!
//! # Architecture
//!
//! - **Pure state machine**: no storage, no I/O; the ledger crate feeds it the
//!   eligible approver set and the prior vote log and persists the outcome
//! - **One vote per approver**: duplicate votes are rejected, never counted
//! - **Single decision point**: an outcome is produced at most once per
//!   transaction; the caller guards the terminal transition

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod error;
pub mod policy;
pub mod quorum;

// Re-exports
pub use error::{ApprovalError, Result};
pub use policy::{ApprovalPolicy, ApprovalStatus, RejectionRule, VoteDecision};
pub use quorum::{QuorumTracker, VoteOutcome};
