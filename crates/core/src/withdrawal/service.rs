//! Stateless withdrawal transition validation.
//!
//! All methods are associated functions that validate a transition against
//! the current status and return a [`WithdrawalAction`] carrying the audit
//! data to persist. The repository layer re-reads the status under a row
//! lock before calling in, so a stale caller loses here with
//! `InvalidTransition` rather than overwriting a concurrent winner.

use chrono::Utc;

use saldo_shared::types::{ActorId, MinorUnits};

use crate::withdrawal::error::WithdrawalError;
use crate::withdrawal::types::{WithdrawalAction, WithdrawalStatus};

/// Stateless service for withdrawal state transitions.
pub struct WithdrawalService;

impl WithdrawalService {
    /// Validates the amount of a new withdrawal request.
    ///
    /// # Errors
    ///
    /// Returns `WithdrawalError::NonPositiveAmount` for zero or negative
    /// amounts.
    pub fn validate_create(amount: MinorUnits) -> Result<(), WithdrawalError> {
        if !amount.is_positive() {
            return Err(WithdrawalError::NonPositiveAmount(amount));
        }
        Ok(())
    }

    /// Approve a pending withdrawal.
    ///
    /// Approval authorizes a later payout attempt; funds stay reserved and
    /// no balance moves.
    ///
    /// # Errors
    ///
    /// Returns `WithdrawalError::InvalidTransition` if not in Pending.
    pub fn approve(
        current_status: WithdrawalStatus,
        approved_by: ActorId,
    ) -> Result<WithdrawalAction, WithdrawalError> {
        match current_status {
            WithdrawalStatus::Pending => Ok(WithdrawalAction::Approve {
                new_status: WithdrawalStatus::Approved,
                approved_by,
                approved_at: Utc::now(),
            }),
            _ => Err(WithdrawalError::InvalidTransition {
                from: current_status,
                to: WithdrawalStatus::Approved,
            }),
        }
    }

    /// Deny a pending or approved withdrawal.
    ///
    /// # Errors
    ///
    /// - `WithdrawalError::DenialReasonRequired` if the reason is empty
    /// - `WithdrawalError::InvalidTransition` from any terminal status
    pub fn deny(
        current_status: WithdrawalStatus,
        reason: String,
        denied_by: ActorId,
    ) -> Result<WithdrawalAction, WithdrawalError> {
        if reason.trim().is_empty() {
            return Err(WithdrawalError::DenialReasonRequired);
        }

        match current_status {
            WithdrawalStatus::Pending | WithdrawalStatus::Approved => Ok(WithdrawalAction::Deny {
                new_status: WithdrawalStatus::Cancelled,
                reason,
                denied_by,
                denied_at: Utc::now(),
            }),
            _ => Err(WithdrawalError::InvalidTransition {
                from: current_status,
                to: WithdrawalStatus::Cancelled,
            }),
        }
    }

    /// Record a rail-confirmed payout for an approved withdrawal.
    ///
    /// # Errors
    ///
    /// - `WithdrawalError::EndToEndIdRequired` if the rail id is empty
    /// - `WithdrawalError::InvalidTransition` if not in Approved
    pub fn mark_done(
        current_status: WithdrawalStatus,
        end_to_end_id: String,
        marked_by: ActorId,
    ) -> Result<WithdrawalAction, WithdrawalError> {
        if end_to_end_id.trim().is_empty() {
            return Err(WithdrawalError::EndToEndIdRequired);
        }

        match current_status {
            WithdrawalStatus::Approved => Ok(WithdrawalAction::MarkDone {
                new_status: WithdrawalStatus::Done,
                end_to_end_id: Some(end_to_end_id),
                marked_by,
                paid_at: Utc::now(),
            }),
            _ => Err(WithdrawalError::InvalidTransition {
                from: current_status,
                to: WithdrawalStatus::Done,
            }),
        }
    }

    /// Record a manually settled payout for an approved withdrawal.
    ///
    /// # Errors
    ///
    /// Returns `WithdrawalError::InvalidTransition` if not in Approved.
    pub fn mark_done_manual(
        current_status: WithdrawalStatus,
        marked_by: ActorId,
    ) -> Result<WithdrawalAction, WithdrawalError> {
        match current_status {
            WithdrawalStatus::Approved => Ok(WithdrawalAction::MarkDone {
                new_status: WithdrawalStatus::DoneManual,
                end_to_end_id: None,
                marked_by,
                paid_at: Utc::now(),
            }),
            _ => Err(WithdrawalError::InvalidTransition {
                from: current_status,
                to: WithdrawalStatus::DoneManual,
            }),
        }
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: WithdrawalStatus, to: WithdrawalStatus) -> bool {
        matches!(
            (from, to),
            (
                WithdrawalStatus::Pending,
                WithdrawalStatus::Approved | WithdrawalStatus::Cancelled
            ) | (
                WithdrawalStatus::Approved,
                WithdrawalStatus::Done
                    | WithdrawalStatus::DoneManual
                    | WithdrawalStatus::Cancelled
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor() -> ActorId {
        ActorId::new()
    }

    #[test]
    fn test_validate_create_positive_amount() {
        assert!(WithdrawalService::validate_create(MinorUnits::new(1_000)).is_ok());
    }

    #[test]
    fn test_validate_create_rejects_zero_and_negative() {
        assert!(matches!(
            WithdrawalService::validate_create(MinorUnits::ZERO),
            Err(WithdrawalError::NonPositiveAmount(_))
        ));
        assert!(matches!(
            WithdrawalService::validate_create(MinorUnits::new(-5)),
            Err(WithdrawalError::NonPositiveAmount(_))
        ));
    }

    #[test]
    fn test_approve_from_pending() {
        let action = WithdrawalService::approve(WithdrawalStatus::Pending, actor()).unwrap();
        assert_eq!(action.new_status(), WithdrawalStatus::Approved);
    }

    #[test]
    fn test_approve_from_non_pending_fails() {
        for status in [
            WithdrawalStatus::Approved,
            WithdrawalStatus::Done,
            WithdrawalStatus::DoneManual,
            WithdrawalStatus::Cancelled,
        ] {
            assert!(matches!(
                WithdrawalService::approve(status, actor()),
                Err(WithdrawalError::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn test_deny_from_pending_and_approved() {
        for status in [WithdrawalStatus::Pending, WithdrawalStatus::Approved] {
            let action =
                WithdrawalService::deny(status, "key mismatch".to_string(), actor()).unwrap();
            assert_eq!(action.new_status(), WithdrawalStatus::Cancelled);
        }
    }

    #[test]
    fn test_deny_empty_reason_fails() {
        assert!(matches!(
            WithdrawalService::deny(WithdrawalStatus::Pending, String::new(), actor()),
            Err(WithdrawalError::DenialReasonRequired)
        ));
    }

    #[test]
    fn test_deny_whitespace_reason_fails() {
        assert!(matches!(
            WithdrawalService::deny(WithdrawalStatus::Pending, "   ".to_string(), actor()),
            Err(WithdrawalError::DenialReasonRequired)
        ));
    }

    #[test]
    fn test_deny_from_terminal_fails() {
        for status in [
            WithdrawalStatus::Done,
            WithdrawalStatus::DoneManual,
            WithdrawalStatus::Cancelled,
        ] {
            assert!(matches!(
                WithdrawalService::deny(status, "reason".to_string(), actor()),
                Err(WithdrawalError::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn test_mark_done_from_approved() {
        let action = WithdrawalService::mark_done(
            WithdrawalStatus::Approved,
            "E2E123456".to_string(),
            actor(),
        )
        .unwrap();
        assert_eq!(action.new_status(), WithdrawalStatus::Done);
        match action {
            WithdrawalAction::MarkDone { end_to_end_id, .. } => {
                assert_eq!(end_to_end_id.as_deref(), Some("E2E123456"));
            }
            _ => panic!("expected MarkDone action"),
        }
    }

    #[test]
    fn test_mark_done_requires_end_to_end_id() {
        assert!(matches!(
            WithdrawalService::mark_done(WithdrawalStatus::Approved, "  ".to_string(), actor()),
            Err(WithdrawalError::EndToEndIdRequired)
        ));
    }

    #[test]
    fn test_mark_done_from_pending_fails() {
        assert!(matches!(
            WithdrawalService::mark_done(WithdrawalStatus::Pending, "E2E1".to_string(), actor()),
            Err(WithdrawalError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_mark_done_manual_from_approved() {
        let action =
            WithdrawalService::mark_done_manual(WithdrawalStatus::Approved, actor()).unwrap();
        assert_eq!(action.new_status(), WithdrawalStatus::DoneManual);
        match action {
            WithdrawalAction::MarkDone { end_to_end_id, .. } => {
                assert_eq!(end_to_end_id, None);
            }
            _ => panic!("expected MarkDone action"),
        }
    }

    #[test]
    fn test_no_transition_out_of_terminal() {
        for terminal in [
            WithdrawalStatus::Done,
            WithdrawalStatus::DoneManual,
            WithdrawalStatus::Cancelled,
        ] {
            for target in [
                WithdrawalStatus::Pending,
                WithdrawalStatus::Approved,
                WithdrawalStatus::Done,
                WithdrawalStatus::DoneManual,
                WithdrawalStatus::Cancelled,
            ] {
                assert!(!WithdrawalService::is_valid_transition(terminal, target));
            }
        }
    }

    #[test]
    fn test_is_valid_transition_matrix() {
        assert!(WithdrawalService::is_valid_transition(
            WithdrawalStatus::Pending,
            WithdrawalStatus::Approved
        ));
        assert!(WithdrawalService::is_valid_transition(
            WithdrawalStatus::Pending,
            WithdrawalStatus::Cancelled
        ));
        assert!(WithdrawalService::is_valid_transition(
            WithdrawalStatus::Approved,
            WithdrawalStatus::Done
        ));
        assert!(WithdrawalService::is_valid_transition(
            WithdrawalStatus::Approved,
            WithdrawalStatus::DoneManual
        ));
        assert!(WithdrawalService::is_valid_transition(
            WithdrawalStatus::Approved,
            WithdrawalStatus::Cancelled
        ));

        assert!(!WithdrawalService::is_valid_transition(
            WithdrawalStatus::Pending,
            WithdrawalStatus::Done
        ));
        assert!(!WithdrawalService::is_valid_transition(
            WithdrawalStatus::Approved,
            WithdrawalStatus::Pending
        ));
    }
}
