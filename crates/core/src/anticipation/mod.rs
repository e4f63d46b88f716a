//! Anticipation request lifecycle.
//!
//! Anticipation advances the net present value of future receivables to
//! the account holder now, for a percentage fee. This module defines:
//! - Status enum and its valid transitions
//! - Action records carrying audit data for each transition
//! - Stateless transition validation
//! - Error types for anticipation operations

pub mod error;
pub mod service;
pub mod types;

pub use error::AnticipationError;
pub use service::AnticipationService;
pub use types::{AnticipationAction, AnticipationStatus};
