//! Caller identity types for JWT authentication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Platform role carried in an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Broker acting on behalf of asset holders; owns the lots it creates.
    Broker,
    /// Registry bot that verifies and moves lots through their lifecycle.
    Concierge,
    /// Bot that syncs lots with the auction module.
    Convoy,
    /// Platform administrator.
    Admin,
}

impl UserRole {
    /// Token value of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Broker => "broker",
            Self::Concierge => "concierge",
            Self::Convoy => "convoy",
            Self::Admin => "admin",
        }
    }

    /// Parse a role from its token value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "broker" => Some(Self::Broker),
            "concierge" => Some(Self::Concierge),
            "convoy" => Some(Self::Convoy),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: UserId,
    /// Platform role.
    pub role: UserRole,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: UserId, role: UserRole, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.sub
    }
}

/// The party issuing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    /// No credentials were presented.
    Anonymous,
    /// A caller with a valid access token.
    User {
        /// Authenticated user.
        user_id: UserId,
        /// Platform role from the token.
        role: UserRole,
    },
}

impl Principal {
    /// Returns the user ID, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::User { user_id, .. } => Some(*user_id),
        }
    }
}

impl From<&Claims> for Principal {
    fn from(claims: &Claims) -> Self {
        Self::User {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}
