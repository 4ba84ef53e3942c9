//! Lot-relative roles and permissions.

use oplots_shared::{Principal, UserRole};
use serde::{Deserialize, Serialize};

use super::error::DocumentError;
use crate::lot::Lot;

/// The caller's role relative to one lot.
///
/// Stored as the `author` of documents the caller uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticatedRole {
    /// Broker that owns the lot.
    LotOwner,
    /// Broker that does not own the lot.
    Broker,
    /// Registry bot.
    Concierge,
    /// Auction sync bot.
    Convoy,
    /// Platform administrator.
    Administrator,
    /// Caller without credentials.
    Anonymous,
}

impl AuthenticatedRole {
    /// Resolve the caller's role against `lot`.
    #[must_use]
    pub fn resolve(principal: &Principal, lot: &Lot) -> Self {
        match principal {
            Principal::Anonymous => Self::Anonymous,
            Principal::User { user_id, role } => match role {
                UserRole::Broker if *user_id == lot.owner_id => Self::LotOwner,
                UserRole::Broker => Self::Broker,
                UserRole::Concierge => Self::Concierge,
                UserRole::Convoy => Self::Convoy,
                UserRole::Admin => Self::Administrator,
            },
        }
    }

    /// Convert to database string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LotOwner => "lot_owner",
            Self::Broker => "broker",
            Self::Concierge => "concierge",
            Self::Convoy => "convoy",
            Self::Administrator => "administrator",
            Self::Anonymous => "anonymous",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lot_owner" => Some(Self::LotOwner),
            "broker" => Some(Self::Broker),
            "concierge" => Some(Self::Concierge),
            "convoy" => Some(Self::Convoy),
            "administrator" => Some(Self::Administrator),
            "anonymous" => Some(Self::Anonymous),
            _ => None,
        }
    }

    /// Whether this role holds `permission`.
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        match permission {
            Permission::ViewLot => true,
            Permission::UploadLotDocuments => matches!(self, Self::LotOwner | Self::Concierge),
        }
    }
}

impl std::fmt::Display for AuthenticatedRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named permission guarding a resource operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Read lot data.
    ViewLot,
    /// Upload and change lot documents.
    UploadLotDocuments,
}

impl Permission {
    /// Permission name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewLot => "view_lot",
            Self::UploadLotDocuments => "upload_lot_documents",
        }
    }
}

/// Require `permission` for `role`.
///
/// # Errors
///
/// Anonymous callers get `Unauthenticated`, everyone else `PermissionDenied`.
pub fn check_permission(
    role: AuthenticatedRole,
    permission: Permission,
) -> Result<(), DocumentError> {
    if role.has_permission(permission) {
        return Ok(());
    }
    if role == AuthenticatedRole::Anonymous {
        return Err(DocumentError::Unauthenticated);
    }
    Err(DocumentError::PermissionDenied {
        permission: permission.as_str(),
    })
}
