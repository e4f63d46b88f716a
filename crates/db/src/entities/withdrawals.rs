//! `SeaORM` Entity for the withdrawals table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::WithdrawalStatus;

/// A withdrawal request.
///
/// Rows are never deleted; `status` conveys the lifecycle and the row is
/// the immutable audit trail of the request.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "withdrawals")]
pub struct Model {
    /// Withdrawal identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// The account being debited.
    pub account_id: Uuid,
    /// Gross amount requested, in minor units.
    pub requested_amount: i64,
    /// Fee charged, in minor units.
    pub fee_amount: i64,
    /// Amount the holder receives: requested minus fee.
    pub net_amount: i64,
    /// Lifecycle status.
    pub status: WithdrawalStatus,
    /// The PIX key the payout targets.
    pub pix_key_id: Uuid,
    /// Holder-supplied description.
    pub description: String,
    /// Mandatory reason recorded on denial.
    pub reason_for_denial: Option<String>,
    /// Rail-assigned end-to-end identifier, set when marked done.
    pub end_to_end_id: Option<String>,
    /// When the request was created.
    pub created_at: DateTimeWithTimeZone,
    /// When the request last changed.
    pub updated_at: DateTimeWithTimeZone,
    /// When the payout was recorded.
    pub paid_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
