//! Stateless anticipation transition validation.

use chrono::Utc;

use saldo_shared::types::{ActorId, MinorUnits};

use crate::anticipation::error::AnticipationError;
use crate::anticipation::types::{AnticipationAction, AnticipationStatus};

/// Stateless service for anticipation state transitions.
pub struct AnticipationService;

impl AnticipationService {
    /// Validates the amount of a new anticipation request.
    ///
    /// # Errors
    ///
    /// Returns `AnticipationError::NonPositiveAmount` for zero or negative
    /// amounts.
    pub fn validate_create(amount: MinorUnits) -> Result<(), AnticipationError> {
        if !amount.is_positive() {
            return Err(AnticipationError::NonPositiveAmount(amount));
        }
        Ok(())
    }

    /// Approve a pending anticipation.
    ///
    /// This is the one transition that credits available balance
    /// immediately: approval means the platform has advanced the funds.
    ///
    /// # Errors
    ///
    /// Returns `AnticipationError::InvalidTransition` if not in Pending —
    /// including re-approval of an already approved request.
    pub fn approve(
        current_status: AnticipationStatus,
        approved_by: ActorId,
    ) -> Result<AnticipationAction, AnticipationError> {
        match current_status {
            AnticipationStatus::Pending => Ok(AnticipationAction::Approve {
                new_status: AnticipationStatus::Approved,
                approved_by,
                approved_at: Utc::now(),
            }),
            _ => Err(AnticipationError::InvalidTransition {
                from: current_status,
                to: AnticipationStatus::Approved,
            }),
        }
    }

    /// Refuse a pending anticipation.
    ///
    /// # Errors
    ///
    /// - `AnticipationError::RefusalReasonRequired` if the reason is empty
    /// - `AnticipationError::InvalidTransition` if not in Pending
    pub fn deny(
        current_status: AnticipationStatus,
        reason: String,
        denied_by: ActorId,
    ) -> Result<AnticipationAction, AnticipationError> {
        if reason.trim().is_empty() {
            return Err(AnticipationError::RefusalReasonRequired);
        }

        match current_status {
            AnticipationStatus::Pending => Ok(AnticipationAction::Deny {
                new_status: AnticipationStatus::Refused,
                reason,
                denied_by,
                denied_at: Utc::now(),
            }),
            _ => Err(AnticipationError::InvalidTransition {
                from: current_status,
                to: AnticipationStatus::Refused,
            }),
        }
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: AnticipationStatus, to: AnticipationStatus) -> bool {
        matches!(
            (from, to),
            (
                AnticipationStatus::Pending,
                AnticipationStatus::Approved | AnticipationStatus::Refused
            )
        )
    }
}
