//! Actor roles and the admin capability check.
//!
//! Every state-changing admin action runs through the approval gate in the
//! persistence layer; this module owns the pure half of it, the role
//! model. Roles are ordered from lowest to highest privilege and higher
//! roles can perform all actions of lower roles.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use saldo_shared::Claims;
use saldo_shared::types::{AccountId, ActorId};

/// Actor role in the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    /// Account holder: may create requests and read their own data.
    Merchant = 0,
    /// Platform support: may read any account's data.
    Support = 1,
    /// Platform admin: may approve, deny, and settle requests.
    Admin = 2,
}

impl ActorRole {
    /// Parse a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "merchant" => Some(Self::Merchant),
            "support" => Some(Self::Support),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merchant => "merchant",
            Self::Support => "support",
            Self::Admin => "admin",
        }
    }

    /// Returns true if this role may execute gate-protected transitions.
    #[must_use]
    pub fn can_administer(&self) -> bool {
        *self >= Self::Admin
    }

    /// Returns true if this role may read accounts other than its own.
    #[must_use]
    pub fn can_read_any_account(&self) -> bool {
        *self >= Self::Support
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated actor as seen by the gate.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    /// The actor's identifier.
    pub id: ActorId,
    /// The actor's role.
    pub role: ActorRole,
    /// The wallet account the actor operates, if any.
    pub account_id: Option<AccountId>,
}

impl Actor {
    /// Builds an actor from validated token claims.
    ///
    /// # Errors
    ///
    /// Returns `GateError::UnknownRole` if the role claim is not one of
    /// the closed set.
    pub fn from_claims(claims: &Claims) -> Result<Self, GateError> {
        let role = ActorRole::parse(&claims.role).ok_or_else(|| GateError::UnknownRole {
            role: claims.role.clone(),
        })?;
        Ok(Self {
            id: ActorId::from_uuid(claims.actor_id()),
            role,
            account_id: claims.account_id().map(AccountId::from_uuid),
        })
    }

    /// Checks the admin capability required for gate-protected transitions.
    ///
    /// # Errors
    ///
    /// Returns `GateError::AdminRequired` if the actor's role is below
    /// admin.
    pub fn require_admin(&self) -> Result<(), GateError> {
        if self.role.can_administer() {
            Ok(())
        } else {
            Err(GateError::AdminRequired {
                role: self.role.as_str().to_string(),
            })
        }
    }

    /// Checks that the actor may read the given account's data.
    ///
    /// # Errors
    ///
    /// Returns `GateError::AccountMismatch` when a merchant reaches for an
    /// account that is not their own.
    pub fn require_account_access(&self, account_id: AccountId) -> Result<(), GateError> {
        if self.role.can_read_any_account() || self.account_id == Some(account_id) {
            Ok(())
        } else {
            Err(GateError::AccountMismatch { account_id })
        }
    }
}

/// Errors from gate authorization checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// The role claim is outside the closed set.
    #[error("unknown role: {role}")]
    UnknownRole {
        /// The claimed role.
        role: String,
    },

    /// The action requires the admin capability.
    #[error("role {role} may not perform admin actions")]
    AdminRequired {
        /// The actor's role.
        role: String,
    },

    /// The actor may not touch this account.
    #[error("account {account_id} does not belong to this actor")]
    AccountMismatch {
        /// The account that was requested.
        account_id: AccountId,
    },
}
