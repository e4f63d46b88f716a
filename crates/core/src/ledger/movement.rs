//! Ledger movement types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use saldo_shared::types::{AccountId, MinorUnits, MovementId};

/// Kind of a ledger movement.
///
/// The kind determines which balance buckets a movement touches and the
/// sign its stored amount must carry:
///
/// | kind                  | buckets                  | stored sign |
/// |-----------------------|--------------------------|-------------|
/// | `reserve_hold`        | available -> reserved    | positive    |
/// | `reserve_release`     | reserved -> available    | negative    |
/// | `withdrawal_debit`    | reserved -> out          | negative    |
/// | `fee_debit`           | available -> out         | negative    |
/// | `anticipation_credit` | in -> available          | positive    |
/// | `withdrawal_reversal` | in -> available          | positive    |
///
/// For the two reserve kinds the sign tracks the flow into the reserved
/// bucket and the account total is unchanged; for all other kinds the sign
/// is the movement's effect on the account total, so summing them yields
/// `available + reserved + pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Funds realized out of the reservation when a withdrawal is paid.
    WithdrawalDebit,
    /// Funds returned to available after a failed or reversed payout.
    WithdrawalReversal,
    /// Net anticipation proceeds credited to available balance.
    AnticipationCredit,
    /// Fee charged against available balance.
    FeeDebit,
    /// Provisional hold moving funds from available to reserved.
    ReserveHold,
    /// A hold returned from reserved to available.
    ReserveRelease,
}

impl MovementKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WithdrawalDebit => "withdrawal_debit",
            Self::WithdrawalReversal => "withdrawal_reversal",
            Self::AnticipationCredit => "anticipation_credit",
            Self::FeeDebit => "fee_debit",
            Self::ReserveHold => "reserve_hold",
            Self::ReserveRelease => "reserve_release",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "withdrawal_debit" => Some(Self::WithdrawalDebit),
            "withdrawal_reversal" => Some(Self::WithdrawalReversal),
            "anticipation_credit" => Some(Self::AnticipationCredit),
            "fee_debit" => Some(Self::FeeDebit),
            "reserve_hold" => Some(Self::ReserveHold),
            "reserve_release" => Some(Self::ReserveRelease),
            _ => None,
        }
    }

    /// Returns true if this kind changes the account total.
    ///
    /// Reserve holds and releases shuffle value between buckets and leave
    /// the total untouched.
    #[must_use]
    pub const fn affects_total(&self) -> bool {
        !matches!(self, Self::ReserveHold | Self::ReserveRelease)
    }

    /// Converts a positive magnitude into the signed amount this kind
    /// stores in the movement log.
    #[must_use]
    pub const fn signed_amount(&self, magnitude: MinorUnits) -> MinorUnits {
        match self {
            Self::AnticipationCredit | Self::WithdrawalReversal | Self::ReserveHold => magnitude,
            Self::WithdrawalDebit | Self::FeeDebit | Self::ReserveRelease => magnitude.negate(),
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable ledger entry.
///
/// Movements are append-only: they are never mutated or deleted, and the
/// balance triple of an account is always reproducible by replaying them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    /// Unique identifier.
    pub id: MovementId,
    /// The account this movement touches.
    pub account_id: AccountId,
    /// Signed amount per the kind's convention.
    pub amount: MinorUnits,
    /// Movement kind.
    pub kind: MovementKind,
    /// The withdrawal or anticipation that originated this movement.
    pub reference_id: Uuid,
    /// When the movement was committed.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_as_str_roundtrip() {
        for kind in [
            MovementKind::WithdrawalDebit,
            MovementKind::WithdrawalReversal,
            MovementKind::AnticipationCredit,
            MovementKind::FeeDebit,
            MovementKind::ReserveHold,
            MovementKind::ReserveRelease,
        ] {
            assert_eq!(MovementKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MovementKind::parse("unknown"), None);
    }

    #[test]
    fn test_affects_total() {
        assert!(MovementKind::WithdrawalDebit.affects_total());
        assert!(MovementKind::FeeDebit.affects_total());
        assert!(MovementKind::AnticipationCredit.affects_total());
        assert!(MovementKind::WithdrawalReversal.affects_total());
        assert!(!MovementKind::ReserveHold.affects_total());
        assert!(!MovementKind::ReserveRelease.affects_total());
    }

    #[test]
    fn test_signed_amount_direction() {
        let magnitude = MinorUnits::new(500);

        assert_eq!(
            MovementKind::AnticipationCredit.signed_amount(magnitude),
            MinorUnits::new(500)
        );
        assert_eq!(
            MovementKind::ReserveHold.signed_amount(magnitude),
            MinorUnits::new(500)
        );
        assert_eq!(
            MovementKind::WithdrawalDebit.signed_amount(magnitude),
            MinorUnits::new(-500)
        );
        assert_eq!(
            MovementKind::FeeDebit.signed_amount(magnitude),
            MinorUnits::new(-500)
        );
        assert_eq!(
            MovementKind::ReserveRelease.signed_amount(magnitude),
            MinorUnits::new(-500)
        );
    }

    #[test]
    fn test_kind_display_matches_wire_format() {
        assert_eq!(MovementKind::ReserveHold.to_string(), "reserve_hold");
        assert_eq!(
            serde_json::to_string(&MovementKind::WithdrawalDebit).unwrap(),
            "\"withdrawal_debit\""
        );
    }
}
