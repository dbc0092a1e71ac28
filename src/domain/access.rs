//! Role-gated access decisions
//!
//! Every protected area asks the same question through [`decide`]:
//! signed-in users with the wrong role are sent to their own home area
//! instead of being refused.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::profile::{ApprovalStatus, UserRole};

/// Protected areas of the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    /// Driver dashboard: bookings, barcodes
    Driver,
    Owner,
    Admin,
    Profile,
}

impl Area {
    pub fn allows(&self, role: UserRole) -> bool {
        match self {
            Area::Driver | Area::Profile => true,
            Area::Owner => matches!(role, UserRole::Owner | UserRole::Admin),
            Area::Admin => role == UserRole::Admin,
        }
    }

    /// API path of the area's landing resource
    pub fn path(&self) -> &'static str {
        match self {
            Area::Driver => "/api/v1/bookings/mine",
            Area::Owner => "/api/v1/owner/dashboard",
            Area::Admin => "/api/v1/admin/overview",
            Area::Profile => "/api/v1/auth/session",
        }
    }
}

/// Where a role lands after sign-in
pub fn home_area(role: UserRole) -> Area {
    match role {
        UserRole::Admin => Area::Admin,
        UserRole::Owner => Area::Owner,
        UserRole::User => Area::Driver,
    }
}

/// The part of a session an access decision looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRole {
    pub role: UserRole,
    pub approval_status: ApprovalStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// No session: authenticate first
    SignIn,
    /// Signed in with the wrong role: go to the role's home area
    Redirect(Area),
}

pub fn decide(area: Area, session: Option<SessionRole>) -> AccessDecision {
    match session {
        None => AccessDecision::SignIn,
        Some(s) if area.allows(s.role) => AccessDecision::Allow,
        Some(s) => AccessDecision::Redirect(home_area(s.role)),
    }
}

/// Signed-in user as seen by the services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub session: SessionRole,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.session.role == UserRole::Admin
    }

    /// Owners manage their own locations; admins manage all of them.
    pub fn may_manage(&self, owner_id: Option<Uuid>) -> bool {
        self.is_admin() || owner_id == Some(self.user_id)
    }
}

/// Owner approval gate for listing new locations. Admins bypass it.
pub fn can_create_locations(session: SessionRole) -> bool {
    match session.role {
        UserRole::Admin => true,
        UserRole::Owner => session.approval_status == ApprovalStatus::Approved,
        UserRole::User => false,
    }
}

/// Login page a credential is presented at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Portal {
    #[default]
    Driver,
    Owner,
    Admin,
}

/// Whether a role may sign in at a portal. `Err` carries the message shown
/// to the user; no session is issued in that case.
pub fn check_portal(portal: Portal, role: Option<UserRole>) -> Result<(), &'static str> {
    match (portal, role) {
        (Portal::Driver, Some(UserRole::User) | None) => Ok(()),
        (Portal::Driver, Some(UserRole::Owner)) => {
            Err("This email is registered as an Owner. Please use the Owner Login.")
        }
        (Portal::Driver, Some(UserRole::Admin)) => Err("Please use the Admin Login."),

        (Portal::Owner, Some(UserRole::Owner)) => Ok(()),
        (Portal::Owner, Some(UserRole::Admin)) => {
            Err("This account is an Admin. Please use the Admin Login.")
        }
        (Portal::Owner, Some(UserRole::User)) => {
            Err("This email is registered as a User (Driver). Please use the main Login page.")
        }
        (Portal::Owner, None) => {
            Err("Login successful, but user profile is missing. Please contact support.")
        }

        (Portal::Admin, Some(UserRole::Admin)) => Ok(()),
        (Portal::Admin, _) => Err("This account does not have Admin access."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: UserRole) -> Option<SessionRole> {
        Some(SessionRole {
            role,
            approval_status: ApprovalStatus::None,
        })
    }

    #[test]
    fn only_the_owner_or_an_admin_manages_a_location() {
        let owner_id = Uuid::new_v4();
        let owner = Actor {
            user_id: owner_id,
            session: SessionRole {
                role: UserRole::Owner,
                approval_status: ApprovalStatus::Approved,
            },
        };
        let admin = Actor {
            user_id: Uuid::new_v4(),
            session: SessionRole {
                role: UserRole::Admin,
                approval_status: ApprovalStatus::None,
            },
        };
        assert!(owner.may_manage(Some(owner_id)));
        assert!(!owner.may_manage(Some(Uuid::new_v4())));
        assert!(!owner.may_manage(None));
        assert!(admin.may_manage(None));
    }

    #[test]
    fn anonymous_must_sign_in() {
        for area in [Area::Driver, Area::Owner, Area::Admin, Area::Profile] {
            assert_eq!(decide(area, None), AccessDecision::SignIn);
        }
    }

    #[test]
    fn wrong_role_is_redirected_home() {
        assert_eq!(
            decide(Area::Admin, session(UserRole::Owner)),
            AccessDecision::Redirect(Area::Owner)
        );
        assert_eq!(
            decide(Area::Owner, session(UserRole::User)),
            AccessDecision::Redirect(Area::Driver)
        );
        assert_eq!(
            decide(Area::Admin, session(UserRole::User)),
            AccessDecision::Redirect(Area::Driver)
        );
    }

    #[test]
    fn higher_roles_reach_lower_areas() {
        assert_eq!(decide(Area::Owner, session(UserRole::Admin)), AccessDecision::Allow);
        assert_eq!(decide(Area::Driver, session(UserRole::Owner)), AccessDecision::Allow);
        assert_eq!(decide(Area::Profile, session(UserRole::User)), AccessDecision::Allow);
    }

    #[test]
    fn approval_gate() {
        let owner = |approval_status| SessionRole {
            role: UserRole::Owner,
            approval_status,
        };
        assert!(can_create_locations(owner(ApprovalStatus::Approved)));
        assert!(!can_create_locations(owner(ApprovalStatus::Pending)));
        assert!(!can_create_locations(owner(ApprovalStatus::Rejected)));
        assert!(can_create_locations(SessionRole {
            role: UserRole::Admin,
            approval_status: ApprovalStatus::None
        }));
    }

    #[test]
    fn portal_mismatch_messages() {
        assert!(check_portal(Portal::Driver, Some(UserRole::User)).is_ok());
        assert_eq!(
            check_portal(Portal::Driver, Some(UserRole::Owner)).unwrap_err(),
            "This email is registered as an Owner. Please use the Owner Login."
        );
        assert_eq!(
            check_portal(Portal::Owner, Some(UserRole::User)).unwrap_err(),
            "This email is registered as a User (Driver). Please use the main Login page."
        );
        assert_eq!(
            check_portal(Portal::Admin, Some(UserRole::Owner)).unwrap_err(),
            "This account does not have Admin access."
        );
        assert!(check_portal(Portal::Admin, Some(UserRole::Admin)).is_ok());
    }
}
