//! `SeaORM` Entity for the movements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::MovementKind;

/// An immutable ledger entry.
///
/// Rows are append-only (a database trigger rejects UPDATE and DELETE);
/// the sign of `amount` follows the kind's convention so replaying the log
/// reproduces the balance triple.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    /// Movement identifier (UUID v7, time-ordered).
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// The account this movement touches.
    pub account_id: Uuid,
    /// Signed amount in minor units.
    pub amount: i64,
    /// Movement kind.
    pub kind: MovementKind,
    /// The withdrawal or anticipation that originated this movement.
    pub reference_id: Uuid,
    /// When the movement was committed.
    pub created_at: DateTimeWithTimeZone,
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
