//! `SeaORM` entity definitions.

pub mod accounts;
pub mod anticipations;
pub mod movements;
pub mod sea_orm_active_enums;
pub mod withdrawals;
