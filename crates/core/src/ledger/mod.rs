//! Movement kinds and balance arithmetic.
//!
//! This module implements the pure side of the ledger:
//! - Movement kinds and their sign conventions
//! - The per-account balance triple and its transition function
//! - Replay of a movement log for reconciliation
//! - Error types for ledger operations

pub mod balance;
pub mod error;
pub mod movement;

#[cfg(test)]
mod balance_props;

pub use balance::AccountBalances;
pub use error::LedgerError;
pub use movement::{Movement, MovementKind};
