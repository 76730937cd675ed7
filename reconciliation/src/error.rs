//! Reconciliation error types

use thiserror::Error;

/// Reconciliation errors
#[derive(Error, Debug)]
pub enum ReconciliationError {
    /// External feed unavailable or timed out; retryable, nothing was touched
    #[error("External source unavailable: {0}")]
    SourceUnavailable(String),

    /// Ledger error during convergence
    #[error("Ledger error: {0}")]
    Ledger(#[from] vault_core::Error),
}

impl ReconciliationError {
    /// Stable error code for the structured API boundary
    pub fn code(&self) -> &'static str {
        match self {
            ReconciliationError::SourceUnavailable(_) => "SOURCE_UNAVAILABLE",
            ReconciliationError::Ledger(e) => e.code(),
        }
    }

    /// Whether the caller should retry on its own schedule
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReconciliationError::SourceUnavailable(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ReconciliationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_unavailable_is_retryable() {
        let err = ReconciliationError::SourceUnavailable("timeout".to_string());
        assert!(err.is_retryable());
        assert_eq!(err.code(), "SOURCE_UNAVAILABLE");
    }

    #[test]
    fn test_ledger_error_code_passthrough() {
        let err = ReconciliationError::Ledger(vault_core::Error::InvalidAmount("0".to_string()));
        assert!(!err.is_retryable());
        assert_eq!(err.code(), "INVALID_AMOUNT");
    }
}
