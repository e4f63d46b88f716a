//! `SeaORM` Entity for the anticipations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::AnticipationStatus;

/// An anticipation-of-receivables request.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "anticipations")]
pub struct Model {
    /// Anticipation identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// The account receiving the advance.
    pub account_id: Uuid,
    /// Gross receivable amount being anticipated, in minor units.
    pub requested_amount: i64,
    /// Time-value discount fee, in minor units.
    pub fee_amount: i64,
    /// Amount credited on approval: requested minus fee.
    pub net_amount: i64,
    /// Lifecycle status.
    pub status: AnticipationStatus,
    /// Mandatory reason recorded on refusal.
    pub refused_reason: Option<String>,
    /// Lock held on the receivables ledger while pending.
    pub receivable_lock_id: Option<Uuid>,
    /// When the request was created.
    pub created_at: DateTimeWithTimeZone,
    /// When the request last changed.
    pub updated_at: DateTimeWithTimeZone,
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
