//! Repository abstractions for data access.
//!
//! The ledger repository is the only place account balances are mutated;
//! the workflow repositories drive the withdrawal and anticipation state
//! machines through the approval gate.

pub mod anticipation;
pub mod gate;
pub mod ledger;
pub mod withdrawal;

pub use anticipation::AnticipationRepository;
pub use gate::ApprovalGate;
pub use ledger::{LedgerRepository, LedgerStoreError};
pub use withdrawal::WithdrawalRepository;
