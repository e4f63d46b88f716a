//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - The ledger store and the approval-gated workflow repositories
//! - Database migrations
//! - Bounded retry for idempotent reads

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod retry;

pub use repositories::{
    AnticipationRepository, ApprovalGate, LedgerRepository, WithdrawalRepository,
};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use saldo_shared::config::DatabaseConfig;

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(&config.url);
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections);
    Database::connect(options).await
}
