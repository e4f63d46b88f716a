//! `SeaORM` Entity for the accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A wallet account with its balance triple.
///
/// Balances are integer minor currency units, all non-negative (enforced
/// by database checks). `version` increments on every balance mutation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Account identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Funds the holder can spend or reserve.
    pub available_balance: i64,
    /// Funds held for pending withdrawals.
    pub reserved_balance: i64,
    /// Funds announced but not yet settled.
    pub pending_balance: i64,
    /// Monotonically increasing mutation counter.
    pub version: i64,
    /// When the account was implicitly created.
    pub created_at: DateTimeWithTimeZone,
    /// When a balance last changed.
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movements::Entity")]
    Movements,
    #[sea_orm(has_many = "super::withdrawals::Entity")]
    Withdrawals,
    #[sea_orm(has_many = "super::anticipations::Entity")]
    Anticipations,
}

impl Related<super::movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl Related<super::withdrawals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Withdrawals.def()
    }
}

impl Related<super::anticipations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Anticipations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
