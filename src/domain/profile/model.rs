use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Closed set of roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Owner,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Owner => "owner",
            Self::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "driver" => Some(Self::User),
            "owner" => Some(Self::Owner),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner approval state. Only meaningful for owners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    #[default]
    None,
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Some(Self::None),
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// User profile row
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub approval_status: ApprovalStatus,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(new: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(&new.email),
            name: new.name,
            role: new.role,
            approval_status: new.approval_status,
            password_hash: new.password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_approved_owner(&self) -> bool {
        self.role == UserRole::Owner && self.approval_status == ApprovalStatus::Approved
    }
}

/// Input for creating a profile. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub approval_status: ApprovalStatus,
    pub password_hash: String,
}

/// Business details captured by owner sign-up
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerProfile {
    /// Same as the owner's user id
    pub id: Uuid,
    pub company_name: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
}

/// Profile listing filter
#[derive(Debug, Clone, Default)]
pub struct ProfileQuery {
    pub role: Option<UserRole>,
    pub approval_status: Option<ApprovalStatus>,
}

impl ProfileQuery {
    pub fn matches(&self, profile: &UserProfile) -> bool {
        self.role.map_or(true, |r| r == profile.role)
            && self
                .approval_status
                .map_or(true, |s| s == profile.approval_status)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
