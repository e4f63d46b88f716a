//! `SeaORM` active enums mirroring the database enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of a ledger movement (`movement_kind` database enum).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "movement_kind")]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Funds realized out of the reservation when a withdrawal is paid.
    #[sea_orm(string_value = "withdrawal_debit")]
    WithdrawalDebit,
    /// Funds returned to available after a failed or reversed payout.
    #[sea_orm(string_value = "withdrawal_reversal")]
    WithdrawalReversal,
    /// Net anticipation proceeds credited to available balance.
    #[sea_orm(string_value = "anticipation_credit")]
    AnticipationCredit,
    /// Fee charged against available balance.
    #[sea_orm(string_value = "fee_debit")]
    FeeDebit,
    /// Provisional hold moving funds from available to reserved.
    #[sea_orm(string_value = "reserve_hold")]
    ReserveHold,
    /// A hold returned from reserved to available.
    #[sea_orm(string_value = "reserve_release")]
    ReserveRelease,
}

/// Withdrawal status (`withdrawal_status` database enum).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "withdrawal_status")]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    /// Requested; gross amount is reserved.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Authorized for payout; funds remain reserved.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Paid out through the payment rail.
    #[sea_orm(string_value = "done")]
    Done,
    /// Settled manually by an operator.
    #[sea_orm(string_value = "done_manual")]
    DoneManual,
    /// Denied; reserved funds were returned.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Anticipation status (`anticipation_status` database enum).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "anticipation_status")]
#[serde(rename_all = "snake_case")]
pub enum AnticipationStatus {
    /// Requested; receivables are locked.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Funds advanced; net amount credited.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Denied; receivables lock released.
    #[sea_orm(string_value = "refused")]
    Refused,
}
