//! Authenticated request context

use chrono::{DateTime, Utc};

use crate::domain::access::{decide, AccessDecision, Actor, Area, SessionRole};
use crate::domain::UserProfile;

/// Who is calling, resolved from a bearer token: the token verified, its
/// session not revoked and the profile loaded fresh from the store.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
    pub profile: UserProfile,
}

impl AuthContext {
    pub fn session_role(&self) -> SessionRole {
        SessionRole {
            role: self.profile.role,
            approval_status: self.profile.approval_status,
        }
    }

    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.profile.id,
            session: self.session_role(),
        }
    }

    pub fn decide(&self, area: Area) -> AccessDecision {
        decide(area, Some(self.session_role()))
    }
}
