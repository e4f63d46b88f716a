//! Withdrawal domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use saldo_shared::types::ActorId;

/// Withdrawal request status.
///
/// The valid transitions are:
/// - Pending → Approved (approve)
/// - Pending → Cancelled (deny)
/// - Approved → Done (mark paid, with an end-to-end id from the rail)
/// - Approved → DoneManual (mark paid, settled outside the rail)
/// - Approved → Cancelled (deny)
///
/// `Done`, `DoneManual`, and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    /// Requested by the holder; gross amount is reserved.
    Pending,
    /// Authorized for payout; funds remain reserved.
    Approved,
    /// Paid out through the payment rail.
    Done,
    /// Settled manually by an operator.
    DoneManual,
    /// Denied; reserved funds were returned.
    Cancelled,
}

impl WithdrawalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Done => "done",
            Self::DoneManual => "done_manual",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "done" => Some(Self::Done),
            "done_manual" => Some(Self::DoneManual),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if no further transition is permitted.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::DoneManual | Self::Cancelled)
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated withdrawal transition with audit data.
#[derive(Debug, Clone)]
pub enum WithdrawalAction {
    /// Authorize a pending withdrawal for payout.
    Approve {
        /// The new status after approval.
        new_status: WithdrawalStatus,
        /// The admin who approved the request.
        approved_by: ActorId,
        /// When the request was approved.
        approved_at: DateTime<Utc>,
    },
    /// Deny a pending or approved withdrawal.
    Deny {
        /// The new status after denial (Cancelled).
        new_status: WithdrawalStatus,
        /// The mandatory reason for the denial.
        reason: String,
        /// The admin who denied the request.
        denied_by: ActorId,
        /// When the request was denied.
        denied_at: DateTime<Utc>,
    },
    /// Record a completed payout.
    MarkDone {
        /// `Done` or `DoneManual`.
        new_status: WithdrawalStatus,
        /// Rail-assigned end-to-end identifier, absent for manual settlement.
        end_to_end_id: Option<String>,
        /// The admin who recorded the payout.
        marked_by: ActorId,
        /// When the payout was recorded.
        paid_at: DateTime<Utc>,
    },
}

impl WithdrawalAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> WithdrawalStatus {
        match self {
            Self::Approve { new_status, .. }
            | Self::Deny { new_status, .. }
            | Self::MarkDone { new_status, .. } => *new_status,
        }
    }
}
