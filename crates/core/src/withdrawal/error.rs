//! Withdrawal error types.

use thiserror::Error;

use saldo_shared::types::{MinorUnits, PixKeyId, WithdrawalId};

use crate::fee::FeeError;
use crate::ledger::LedgerError;
use crate::withdrawal::types::WithdrawalStatus;

/// Errors that can occur during withdrawal operations.
#[derive(Debug, Error)]
pub enum WithdrawalError {
    /// Attempted an invalid status transition.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: WithdrawalStatus,
        /// The attempted target status.
        to: WithdrawalStatus,
    },

    /// Denial requires a non-empty reason.
    #[error("denial reason is required")]
    DenialReasonRequired,

    /// Marking a rail payout done requires the rail's end-to-end id.
    #[error("end-to-end id is required")]
    EndToEndIdRequired,

    /// The requested amount must be strictly positive.
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(MinorUnits),

    /// The PIX key is not verified or does not belong to the account.
    #[error("PIX key {pix_key_id} is not verified for this account")]
    PixKeyNotVerified {
        /// The offending key.
        pix_key_id: PixKeyId,
    },

    /// Fee computation rejected the amount.
    #[error(transparent)]
    Fee(#[from] FeeError),

    /// Ledger operation failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Actor lacks the admin capability.
    #[error("role {role} may not administer withdrawals")]
    NotAuthorized {
        /// The actor's role.
        role: String,
    },

    /// Withdrawal not found.
    #[error("withdrawal {0} not found")]
    NotFound(WithdrawalId),

    /// An external collaborator is unreachable.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl WithdrawalError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. } => 409,
            Self::DenialReasonRequired
            | Self::EndToEndIdRequired
            | Self::NonPositiveAmount(_) => 400,
            Self::PixKeyNotVerified { .. } => 422,
            Self::Fee(_) => 422,
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
            Self::DenialReasonRequired => "DENIAL_REASON_REQUIRED",
            Self::EndToEndIdRequired => "END_TO_END_ID_REQUIRED",
            Self::NonPositiveAmount(_) => "VALIDATION_ERROR",
            Self::PixKeyNotVerified { .. } => "PIX_KEY_NOT_VERIFIED",
            Self::Fee(FeeError::AmountTooSmall { .. }) => "AMOUNT_TOO_SMALL",
            Self::Fee(FeeError::NonPositiveAmount { .. }) => "VALIDATION_ERROR",
            Self::Ledger(e) => e.error_code(),
            Self::NotAuthorized { .. } => "NOT_AUTHORIZED",
            Self::NotFound(_) => "WITHDRAWAL_NOT_FOUND",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}
