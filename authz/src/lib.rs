//! VaultLedger Authorization
//!
//! Actor-level permission checks in front of the ledger's write surface.
//! The ledger itself enforces money invariants and approver standing on
//! votes; this crate decides *who* may manage a vault, open accounts, and
//! initiate or cancel transfers.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod guard;

// Re-exports
pub use error::{AuthzError, Result};
pub use guard::AuthorizedLedger;
