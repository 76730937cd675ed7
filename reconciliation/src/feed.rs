//! External feed seam
//!
//! Exchange or custodian API clients implement [`ExternalFeed`]; the engine
//! only sees reported rows. Feed failures surface as `SourceUnavailable`.

use crate::error::{ReconciliationError, Result};
use crate::types::ExternalTransaction;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vault_core::AccountId;

/// Source of externally reported transactions for an account
#[async_trait]
pub trait ExternalFeed: Send + Sync {
    /// Reported transactions for one account within `[from, to]`
    async fn fetch(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ExternalTransaction>>;
}

/// Fixed in-memory feed
///
/// Serves a pre-loaded row set filtered to the requested window. Used in
/// tests and demos standing in for a live exchange client.
#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    rows: Vec<ExternalTransaction>,
    unavailable: bool,
}

impl StaticFeed {
    /// Feed serving the given rows
    pub fn new(rows: Vec<ExternalTransaction>) -> Self {
        Self {
            rows,
            unavailable: false,
        }
    }

    /// Feed that fails every fetch
    pub fn unavailable() -> Self {
        Self {
            rows: Vec::new(),
            unavailable: true,
        }
    }
}

#[async_trait]
impl ExternalFeed for StaticFeed {
    async fn fetch(
        &self,
        _account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ExternalTransaction>> {
        if self.unavailable {
            return Err(ReconciliationError::SourceUnavailable(
                "static feed marked unavailable".to_string(),
            ));
        }

        Ok(self
            .rows
            .iter()
            .filter(|row| row.timestamp >= from && row.timestamp <= to)
            .cloned()
            .collect())
    }
}
