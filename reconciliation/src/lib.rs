//! VaultLedger Reconciliation
//!
//! Converges the local ledger with externally reported transactions, per
//! account and time window:
//!
//! - **Matched**: local transactions with an external counterpart
//! - **Local-only**: no counterpart; pending ones past the grace period are
//!   flagged as disputed
//! - **External-only**: no local record; a completed local transaction is
//!   synthesized so the ledger converges toward the external source of truth
//!
//! The engine is fetch-first: if the external feed is unavailable or times
//! out, the whole attempt fails with `SourceUnavailable` and the ledger is
//! left untouched.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, missing_debug_implementations)]

pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod scheduler;
pub mod types;

// Re-exports
pub use config::ReconciliationConfig;
pub use engine::ReconciliationEngine;
pub use error::{ReconciliationError, Result};
pub use feed::{ExternalFeed, StaticFeed};
pub use scheduler::ReconciliationScheduler;
pub use types::{ExternalTransaction, ReconciliationResult};
