//! Error types for ledger operations.

use saldo_shared::types::MinorUnits;
use thiserror::Error;

/// Errors that can occur while mutating or replaying account balances.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Available balance cannot cover the requested amount.
    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Available balance at the time of the attempt.
        available: MinorUnits,
        /// Amount that was requested.
        requested: MinorUnits,
    },

    /// The ledger was asked to do something its own bookkeeping forbids,
    /// e.g. releasing more than is reserved. A programming error in the
    /// caller, not a user error.
    #[error("invalid ledger state: {0}")]
    InvalidState(String),

    /// A movement carried an amount outside its kind's convention
    /// (wrong sign or zero).
    #[error("invalid movement amount: {0}")]
    InvalidAmount(String),

    /// Balance invariant violation. Fatal: processing for the affected
    /// account must halt and alert, never silently continue.
    #[error("ledger corruption: {0}")]
    Corruption(String),
}

impl LedgerError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InsufficientFunds { .. } => 422,
            Self::InvalidAmount(_) => 400,
            Self::InvalidState(_) | Self::Corruption(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidState(_) => "INVALID_LEDGER_STATE",
            Self::Corruption(_) => "LEDGER_CORRUPTION",
        }
    }

    /// Returns true if this error means the account must be halted.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Corruption(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_message() {
        let err = LedgerError::InsufficientFunds {
            available: MinorUnits::new(300),
            requested: MinorUnits::new(700),
        };
        assert_eq!(
            err.to_string(),
            "insufficient funds: available 300, requested 700"
        );
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "INSUFFICIENT_FUNDS");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_corruption_is_fatal() {
        let err = LedgerError::Corruption("replay mismatch".into());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "LEDGER_CORRUPTION");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_invalid_state_is_internal() {
        let err = LedgerError::InvalidState("release exceeds reserved".into());
        assert_eq!(err.status_code(), 500);
        assert!(!err.is_fatal());
    }
}
