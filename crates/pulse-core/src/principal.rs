//! The authenticated identity attached to a connection.

use serde::{Deserialize, Serialize};

use crate::types::{SessionId, UserId};

/// Role granted to a principal at token issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular chat user.
    User,
    /// Administrative user (session monitoring, broadcast).
    Admin,
}

/// The resolved identity of a connection.
///
/// Produced exactly once at connect time by the connection authenticator
/// and carried in the connection context for its whole lifetime. Anonymous
/// principals exist only in development mode, where the gateway accepts
/// unauthenticated connections for local testing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User this principal represents.
    pub user_id: UserId,
    /// Authentication session the credential belongs to.
    pub session_id: SessionId,
    /// Roles granted at token issuance.
    pub roles: Vec<Role>,
    /// Whether this is a synthetic development-mode identity.
    pub anonymous: bool,
}

impl Principal {
    /// Create an authenticated principal.
    pub fn authenticated(user_id: UserId, session_id: SessionId, roles: Vec<Role>) -> Self {
        Self {
            user_id,
            session_id,
            roles,
            anonymous: false,
        }
    }

    /// Create a synthetic anonymous principal (development mode only).
    pub fn anonymous() -> Self {
        Self {
            user_id: UserId::new(),
            session_id: SessionId::new(),
            roles: vec![Role::User],
            anonymous: true,
        }
    }

    /// Whether the principal was produced from a validated credential.
    pub fn is_authenticated(&self) -> bool {
        !self.anonymous
    }

    /// Whether the principal carries the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
