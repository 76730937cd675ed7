//! Transaction listing: filters, pagination, CSV export
//!
//! Pure functions over transaction sets fetched by the storage layer. The
//! dashboard-facing query surface composes these with the time-ordered
//! account index.

use crate::error::{Error, Result};
use crate::types::{AccountId, Transaction, TransactionStatus};
use chrono::{DateTime, Utc};

/// Direction of a transaction relative to the queried account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionFilter {
    /// Account is the destination
    Incoming,
    /// Account is the source
    Outgoing,
}

/// Listing filter; `None` fields match everything
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Direction relative to the queried account
    pub direction: Option<DirectionFilter>,

    /// Status
    pub status: Option<TransactionStatus>,

    /// Window start (inclusive)
    pub from: Option<DateTime<Utc>>,

    /// Window end (inclusive)
    pub to: Option<DateTime<Utc>>,

    /// Case-insensitive free-text search over ids, parties, refs, reasons
    pub search: Option<String>,
}

/// Pagination request
#[derive(Debug, Clone, Copy)]
pub struct Page {
    /// Rows to skip
    pub offset: usize,

    /// Maximum rows to return
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// One page of a filtered listing
#[derive(Debug, Clone)]
pub struct TransactionPage {
    /// Rows in this page
    pub items: Vec<Transaction>,

    /// Total rows matching the filter
    pub total: usize,

    /// Offset this page starts at
    pub offset: usize,

    /// Requested page size
    pub limit: usize,
}

/// Apply a filter to a transaction set
///
/// The window bounds are assumed already applied by the index scan; this
/// handles direction, status, and free-text search.
pub fn apply_filter(
    transactions: Vec<Transaction>,
    account_id: &AccountId,
    filter: &TransactionFilter,
) -> Vec<Transaction> {
    let needle = filter.search.as_ref().map(|s| s.to_lowercase());

    transactions
        .into_iter()
        .filter(|txn| match filter.direction {
            Some(DirectionFilter::Incoming) => txn.destination.account_id() == Some(account_id),
            Some(DirectionFilter::Outgoing) => txn.source.account_id() == Some(account_id),
            None => true,
        })
        .filter(|txn| filter.status.map_or(true, |s| txn.status == s))
        .filter(|txn| needle.as_ref().map_or(true, |n| matches_search(txn, n)))
        .collect()
}

fn matches_search(txn: &Transaction, needle: &str) -> bool {
    txn.transaction_id.to_string().contains(needle)
        || txn.source.to_string().to_lowercase().contains(needle)
        || txn.destination.to_string().to_lowercase().contains(needle)
        || txn.initiated_by.as_str().to_lowercase().contains(needle)
        || txn
            .external_ref
            .as_deref()
            .map_or(false, |r| r.to_lowercase().contains(needle))
        || txn
            .reason
            .as_deref()
            .map_or(false, |r| r.to_lowercase().contains(needle))
}

/// Slice a filtered set into one page
pub fn paginate(transactions: Vec<Transaction>, page: Page) -> TransactionPage {
    let total = transactions.len();
    let items = transactions
        .into_iter()
        .skip(page.offset)
        .take(page.limit)
        .collect();

    TransactionPage {
        items,
        total,
        offset: page.offset,
        limit: page.limit,
    }
}

/// Render a transaction set as CSV for offline analysis
pub fn export_csv(transactions: &[Transaction]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record([
            "transaction_id",
            "source",
            "destination",
            "amount",
            "currency",
            "status",
            "approval_status",
            "approvals_current",
            "approvals_required",
            "initiated_by",
            "external_ref",
            "reason",
            "created_at",
        ])
        .map_err(|e| Error::Other(format!("CSV write failed: {}", e)))?;

    for txn in transactions {
        writer
            .write_record([
                txn.transaction_id.to_string(),
                txn.source.to_string(),
                txn.destination.to_string(),
                txn.amount.to_string(),
                txn.currency.code().to_string(),
                format!("{:?}", txn.status).to_lowercase(),
                format!("{:?}", txn.approval_status).to_lowercase(),
                txn.approvals_current.to_string(),
                txn.approvals_required.to_string(),
                txn.initiated_by.to_string(),
                txn.external_ref.clone().unwrap_or_default(),
                txn.reason.clone().unwrap_or_default(),
                txn.created_at.to_rfc3339(),
            ])
            .map_err(|e| Error::Other(format!("CSV write failed: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Other(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Other(format!("CSV not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActorId, Currency, Party};
    use approval_engine::ApprovalStatus;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn txn(
        account: AccountId,
        outgoing: bool,
        status: TransactionStatus,
        reason: Option<&str>,
    ) -> Transaction {
        let other = AccountId::generate();
        Transaction {
            transaction_id: Uuid::new_v4(),
            source: if outgoing {
                Party::Account(account)
            } else {
                Party::Account(other)
            },
            destination: if outgoing {
                Party::Account(other)
            } else {
                Party::Account(account)
            },
            amount: Decimal::from(100),
            currency: Currency::USD,
            initiated_by: ActorId::new("trader-1"),
            status,
            approvals_required: 0,
            approvals_current: 0,
            approval_status: ApprovalStatus::NotRequired,
            external_ref: None,
            reason: reason.map(String::from),
            destination_credited: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_direction_filter() {
        let account = AccountId::generate();
        let set = vec![
            txn(account, true, TransactionStatus::Completed, None),
            txn(account, false, TransactionStatus::Completed, None),
            txn(account, true, TransactionStatus::Pending, None),
        ];

        let filter = TransactionFilter {
            direction: Some(DirectionFilter::Outgoing),
            ..Default::default()
        };
        assert_eq!(apply_filter(set.clone(), &account, &filter).len(), 2);

        let filter = TransactionFilter {
            direction: Some(DirectionFilter::Incoming),
            ..Default::default()
        };
        assert_eq!(apply_filter(set, &account, &filter).len(), 1);
    }

    #[test]
    fn test_status_and_search_filters() {
        let account = AccountId::generate();
        let set = vec![
            txn(account, true, TransactionStatus::Failed, Some("cancelled by ops")),
            txn(account, true, TransactionStatus::Completed, None),
        ];

        let filter = TransactionFilter {
            status: Some(TransactionStatus::Failed),
            ..Default::default()
        };
        assert_eq!(apply_filter(set.clone(), &account, &filter).len(), 1);

        let filter = TransactionFilter {
            search: Some("CANCELLED".to_string()),
            ..Default::default()
        };
        let hits = apply_filter(set, &account, &filter);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].status, TransactionStatus::Failed);
    }

    #[test]
    fn test_pagination() {
        let account = AccountId::generate();
        let set: Vec<_> = (0..5)
            .map(|_| txn(account, true, TransactionStatus::Completed, None))
            .collect();

        let page = paginate(set, Page { offset: 2, limit: 2 });
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.offset, 2);
    }

    #[test]
    fn test_csv_export() {
        let account = AccountId::generate();
        let set = vec![txn(account, true, TransactionStatus::Completed, None)];

        let csv = export_csv(&set).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("transaction_id,"));
        assert!(lines.next().unwrap().contains("completed"));
        assert!(lines.next().is_none());
    }
}
