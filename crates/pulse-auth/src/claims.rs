//! JWT claims structure used in access tokens.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pulse_core::principal::{Principal, Role};

/// JWT claims payload embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the user ID.
    pub sub: Uuid,
    /// Authentication session this token belongs to.
    pub sid: Uuid,
    /// Roles granted at token issuance.
    pub roles: Vec<Role>,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// Convert validated claims into a connection principal.
    pub fn into_principal(self) -> Principal {
        Principal::authenticated(self.sub.into(), self.sid.into(), self.roles)
    }
}
