//! Reconciliation data types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vault_core::Currency;

/// One transaction as reported by the external source
///
/// The amount is signed from the local account's perspective: positive for
/// funds arriving, negative for funds leaving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalTransaction {
    /// Stable identifier assigned by the external source, when it has one
    pub external_id: Option<String>,

    /// Signed amount
    pub amount: Decimal,

    /// Currency
    pub currency: Currency,

    /// When the movement happened according to the source
    pub timestamp: DateTime<Utc>,
}

impl ExternalTransaction {
    /// Absolute amount
    pub fn magnitude(&self) -> Decimal {
        self.amount.abs()
    }

    /// Whether funds arrived at the local account
    pub fn is_credit(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Identifier used when recording this row locally: the source's own id,
    /// or a deterministic synthetic one so re-runs match the same row
    pub fn reference(&self) -> String {
        match &self.external_id {
            Some(id) => id.clone(),
            None => format!(
                "ext:{}:{}:{}",
                self.amount,
                self.currency.code(),
                self.timestamp.timestamp()
            ),
        }
    }
}

/// Outcome of one reconciliation run over one account and window
#[derive(Debug, Clone, Default)]
pub struct ReconciliationResult {
    /// Local transactions with an external counterpart
    pub matched: Vec<Uuid>,

    /// Local transactions with no external counterpart
    pub local_only: Vec<Uuid>,

    /// Local-only transactions flagged as disputed this run
    pub disputed: Vec<Uuid>,

    /// Transactions synthesized from external-only rows
    pub external_only: Vec<Uuid>,
}

impl ReconciliationResult {
    /// Whether the ledger and the external source agree over the window
    pub fn converged(&self) -> bool {
        self.local_only.is_empty() && self.external_only.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_reference_is_deterministic() {
        let ts = Utc::now();
        let a = ExternalTransaction {
            external_id: None,
            amount: Decimal::from(-75),
            currency: Currency::USD,
            timestamp: ts,
        };
        let b = a.clone();
        assert_eq!(a.reference(), b.reference());
        assert!(a.reference().starts_with("ext:"));
    }

    #[test]
    fn test_source_id_wins() {
        let row = ExternalTransaction {
            external_id: Some("exch-42".to_string()),
            amount: Decimal::from(10),
            currency: Currency::BTC,
            timestamp: Utc::now(),
        };
        assert_eq!(row.reference(), "exch-42");
        assert!(row.is_credit());
    }
}
