//! Balance store transitions
//!
//! Pure reserve/release/commit transitions over an account. The ledger core
//! composes these with the storage layer so the mutated account row and its
//! history snapshot land in one atomic write; failures leave the caller's
//! account untouched.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::types::Account;

/// Balance delta applied at commit time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceDelta {
    /// Convert a reservation into a real balance decrease
    Debit(Decimal),
    /// Increase the balance directly
    Credit(Decimal),
}

fn require_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    Ok(())
}

/// Earmark funds for an in-flight transaction
///
/// Fails with `InsufficientFunds` if `amount` exceeds the available balance.
pub fn reserve(account: &Account, amount: Decimal) -> Result<Account> {
    require_positive(amount)?;

    let available = account.available();
    if amount > available {
        return Err(Error::InsufficientFunds {
            requested: amount,
            available,
        });
    }

    let mut next = account.clone();
    next.reserved += amount;
    next.updated_at = Utc::now();
    next.check_invariants()?;
    Ok(next)
}

/// Return earmarked funds; clamps at zero, never drives `reserved` negative
pub fn release(account: &Account, amount: Decimal) -> Result<Account> {
    require_positive(amount)?;

    let mut next = account.clone();
    next.reserved -= amount.min(next.reserved);
    next.updated_at = Utc::now();
    next.check_invariants()?;
    Ok(next)
}

/// Apply a committed balance delta
///
/// A debit consumes an existing reservation; a credit increases the balance
/// directly. Fails with `InvariantViolation` rather than corrupt
/// `0 <= reserved <= balance`.
pub fn commit(account: &Account, delta: BalanceDelta) -> Result<Account> {
    let mut next = account.clone();

    match delta {
        BalanceDelta::Debit(amount) => {
            require_positive(amount)?;
            if amount > next.reserved {
                return Err(Error::InvariantViolation(format!(
                    "commit debit {} exceeds reservation {} on account {}",
                    amount, next.reserved, next.account_id
                )));
            }
            next.balance -= amount;
            next.reserved -= amount;
        }
        BalanceDelta::Credit(amount) => {
            require_positive(amount)?;
            next.balance += amount;
        }
    }

    next.updated_at = Utc::now();
    next.check_invariants()?;
    Ok(next)
}
