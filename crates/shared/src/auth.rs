//! Authentication claims consumed by the engine.
//!
//! Authentication itself (login, sessions, credential storage) lives
//! outside this service; requests arrive carrying a signed token and the
//! engine only validates it and reads the actor identity out of the claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (actor ID).
    pub sub: Uuid,
    /// Wallet account the actor operates, if any.
    ///
    /// Merchant actors carry their own account here; platform operators
    /// (support, admin) may have no account of their own.
    pub acct: Option<Uuid>,
    /// Actor's role (`merchant`, `support`, `admin`).
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for an actor.
    #[must_use]
    pub fn new(
        actor_id: Uuid,
        account_id: Option<Uuid>,
        role: &str,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: actor_id,
            acct: account_id,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the actor ID from claims.
    #[must_use]
    pub const fn actor_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the actor's wallet account, if any.
    #[must_use]
    pub const fn account_id(&self) -> Option<Uuid> {
        self.acct
    }
}
