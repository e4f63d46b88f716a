//! Anticipation error types.

use thiserror::Error;

use saldo_shared::types::{AnticipationId, MinorUnits};

use crate::anticipation::types::AnticipationStatus;
use crate::fee::FeeError;
use crate::ledger::LedgerError;

/// Errors that can occur during anticipation operations.
#[derive(Debug, Error)]
pub enum AnticipationError {
    /// Attempted an invalid status transition.
    ///
    /// Covers the double-approval race: approving a non-pending
    /// anticipation errors here, it never silently succeeds or credits
    /// twice.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: AnticipationStatus,
        /// The attempted target status.
        to: AnticipationStatus,
    },

    /// Refusal requires a non-empty reason.
    #[error("refusal reason is required")]
    RefusalReasonRequired,

    /// The requested amount must be strictly positive.
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(MinorUnits),

    /// The account lacks enough anticipatable receivables.
    #[error("insufficient anticipatable receivables for {requested}")]
    InsufficientReceivables {
        /// Amount that was requested.
        requested: MinorUnits,
    },

    /// Fee computation rejected the amount.
    #[error(transparent)]
    Fee(#[from] FeeError),

    /// Ledger operation failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Actor lacks the admin capability.
    #[error("role {role} may not administer anticipations")]
    NotAuthorized {
        /// The actor's role.
        role: String,
    },

    /// Anticipation not found.
    #[error("anticipation {0} not found")]
    NotFound(AnticipationId),

    /// An external collaborator is unreachable.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl AnticipationError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. } => 409,
            Self::RefusalReasonRequired | Self::NonPositiveAmount(_) => 400,
            Self::InsufficientReceivables { .. } | Self::Fee(_) => 422,
            Self::Ledger(e) => e.status_code(),
            Self::NotAuthorized { .. } => 403,
            Self::NotFound(_) => 404,
            Self::Unavailable(_) => 503,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::RefusalReasonRequired => "REFUSAL_REASON_REQUIRED",
            Self::NonPositiveAmount(_) => "VALIDATION_ERROR",
            Self::InsufficientReceivables { .. } => "INSUFFICIENT_RECEIVABLES",
            Self::Fee(FeeError::AmountTooSmall { .. }) => "AMOUNT_TOO_SMALL",
            Self::Fee(FeeError::NonPositiveAmount { .. }) => "VALIDATION_ERROR",
            Self::Ledger(e) => e.error_code(),
            Self::NotAuthorized { .. } => "NOT_AUTHORIZED",
            Self::NotFound(_) => "ANTICIPATION_NOT_FOUND",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}
