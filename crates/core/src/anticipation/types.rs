//! Anticipation domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use saldo_shared::types::ActorId;

/// Anticipation request status.
///
/// The valid transitions are:
/// - Pending → Approved (approve; credits the net amount)
/// - Pending → Refused (deny)
///
/// `Approved` and `Refused` are terminal: settlement of the advanced
/// receivables happens outside this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnticipationStatus {
    /// Requested; the receivables are locked with the receivables ledger.
    Pending,
    /// The platform advanced the funds; net amount was credited.
    Approved,
    /// Denied; the receivables lock was released.
    Refused,
}

impl AnticipationStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Refused => "refused",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "refused" => Some(Self::Refused),
            _ => None,
        }
    }

    /// Returns true if no further transition is permitted.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Refused)
    }
}

impl fmt::Display for AnticipationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated anticipation transition with audit data.
#[derive(Debug, Clone)]
pub enum AnticipationAction {
    /// Advance the funds: credit the net amount to available balance.
    Approve {
        /// The new status after approval.
        new_status: AnticipationStatus,
        /// The admin who approved the request.
        approved_by: ActorId,
        /// When the request was approved.
        approved_at: DateTime<Utc>,
    },
    /// Refuse the request and release the receivables lock.
    Deny {
        /// The new status after refusal (Refused).
        new_status: AnticipationStatus,
        /// The mandatory reason for the refusal.
        reason: String,
        /// The admin who refused the request.
        denied_by: ActorId,
        /// When the request was refused.
        denied_at: DateTime<Utc>,
    },
}

impl AnticipationAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> AnticipationStatus {
        match self {
            Self::Approve { new_status, .. } | Self::Deny { new_status, .. } => *new_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str_roundtrip() {
        for status in [
            AnticipationStatus::Pending,
            AnticipationStatus::Approved,
            AnticipationStatus::Refused,
        ] {
            assert_eq!(AnticipationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AnticipationStatus::parse("cancelled"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!AnticipationStatus::Pending.is_terminal());
        assert!(AnticipationStatus::Approved.is_terminal());
        assert!(AnticipationStatus::Refused.is_terminal());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", AnticipationStatus::Refused), "refused");
    }
}
