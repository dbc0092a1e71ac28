//! Authentication and profile DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::application::identity::{AuthSession, OwnerSignupRequest, ProfileUpdate, SignupRequest};
use crate::application::AuthContext;
use crate::domain::access::{home_area, Area, Portal};
use crate::domain::{ApprovalStatus, UserProfile, UserRole};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    /// Login page the credentials were entered on; defaults to `driver`
    #[serde(default)]
    pub portal: Portal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupBody {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "password must be 6–128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
}

impl From<SignupBody> for SignupRequest {
    fn from(b: SignupBody) -> Self {
        Self {
            email: b.email,
            password: b.password,
            name: b.name,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OwnerSignupBody {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "password must be 6–128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 200, message = "company name is required"))]
    pub company_name: String,
    #[validate(length(min = 1, max = 100, message = "city is required"))]
    pub city: String,
}

impl From<OwnerSignupBody> for OwnerSignupRequest {
    fn from(b: OwnerSignupBody) -> Self {
        Self {
            email: b.email,
            password: b.password,
            name: b.name,
            company_name: b.company_name,
            city: b.city,
        }
    }
}

/// Public part of a profile; never carries the password hash
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileDto {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub approval_status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
}

impl From<UserProfile> for ProfileDto {
    fn from(p: UserProfile) -> Self {
        Self {
            id: p.id,
            email: p.email,
            name: p.name,
            role: p.role,
            approval_status: p.approval_status,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionDto {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub profile: ProfileDto,
    /// Where the client should navigate after sign-in
    pub home: String,
}

impl From<AuthSession> for SessionDto {
    fn from(s: AuthSession) -> Self {
        Self {
            home: home_area(s.profile.role).path().to_string(),
            token: s.token,
            token_type: s.token_type,
            expires_in: s.expires_in,
            profile: s.profile.into(),
        }
    }
}

/// The signed-in session as seen by the server
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentSessionDto {
    pub profile: ProfileDto,
    pub expires_at: DateTime<Utc>,
    pub home: Area,
    pub home_path: String,
}

impl From<AuthContext> for CurrentSessionDto {
    fn from(ctx: AuthContext) -> Self {
        let home = home_area(ctx.profile.role);
        Self {
            profile: ctx.profile.into(),
            expires_at: ctx.expires_at,
            home,
            home_path: home.path().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    /// Must repeat `email` when changing it
    pub confirm_email: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(r: UpdateProfileRequest) -> Self {
        Self {
            name: r.name,
            email: r.email,
            confirm_email: r.confirm_email,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 6, max = 128, message = "new password must be 6–128 characters"))]
    pub password: String,
    pub confirm_password: String,
}
