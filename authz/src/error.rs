//! Authorization error types

use thiserror::Error;

/// Authorization errors
#[derive(Error, Debug)]
pub enum AuthzError {
    /// Actor lacks the required permission
    #[error("Permission denied: {0}")]
    Denied(String),

    /// Ledger error from the delegated operation
    #[error(transparent)]
    Ledger(#[from] vault_core::Error),
}

impl AuthzError {
    /// Stable error code for the structured API boundary
    pub fn code(&self) -> &'static str {
        match self {
            AuthzError::Denied(_) => "PERMISSION_DENIED",
            AuthzError::Ledger(e) => e.code(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(AuthzError::Denied("x".to_string()).code(), "PERMISSION_DENIED");
        let wrapped: AuthzError = vault_core::Error::NotAnApprover("a".to_string()).into();
        assert_eq!(wrapped.code(), "NOT_AN_APPROVER");
    }
}
