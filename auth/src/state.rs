//! Identity types shared by every authenticated operation.

use crate::error::{AuthError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    /// Generate a new random `UserId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| AuthError::InvalidInput(format!("invalid user id: {s}")))
    }
}

/// Authorization role.
///
/// Serialized exactly as `"Guest"` / `"Admin"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    /// Regular customer
    #[default]
    Guest,
    /// Back-office operator
    Admin,
}

impl Role {
    /// Wire and storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "Guest",
            Self::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    /// Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Guest" => Ok(Self::Guest),
            "Admin" => Ok(Self::Admin),
            other => Err(AuthError::InvalidRole(other.to_string())),
        }
    }
}

/// The authenticated caller, as proven by a verified session token.
///
/// Every service operation that depends on who is asking takes a `&Principal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// User id (`sub` claim)
    pub id: UserId,
    /// Email at token issue time
    pub email: String,
    /// Role at token issue time
    pub role: Role,
}

impl Principal {
    /// Returns `true` for administrators.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with `InsufficientPermissions` unless the principal is an admin.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InsufficientPermissions`] for non-admins.
    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AuthError::InsufficientPermissions {
                required: Role::Admin.to_string(),
            })
        }
    }

    /// Owner-or-admin check for user-owned resources.
    #[must_use]
    pub fn can_access(&self, owner: UserId) -> bool {
        self.id == owner || self.is_admin()
    }
}
