//! Authentication service: sign-up, portal login, sessions and profile edits
//!
//! HTTP handlers should be thin wrappers that delegate to this service.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::context::AuthContext;
use super::session::SharedSessionStore;
use crate::domain::access::{check_portal, Portal};
use crate::domain::profile::normalize_email;
use crate::domain::{
    ApprovalStatus, DomainError, DomainResult, NewUser, OwnerProfile, ProfileQuery,
    RepositoryProvider, UserProfile, UserRole,
};
use crate::infrastructure::crypto::jwt::{create_token, verify_token, JwtConfig};
use crate::infrastructure::crypto::password::{hash_password, verify_password, DEFAULT_COST};

const MIN_PASSWORD_LEN: usize = 6;

/// Issued session returned after sign-up or login
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub profile: UserProfile,
}

#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct OwnerSignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub company_name: String,
    pub city: String,
}

/// Profile edit. A new email must be entered twice.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub confirm_email: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    repos: Arc<dyn RepositoryProvider>,
    jwt: JwtConfig,
    sessions: SharedSessionStore,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        jwt: JwtConfig,
        sessions: SharedSessionStore,
    ) -> Self {
        Self {
            repos,
            jwt,
            sessions,
            bcrypt_cost: DEFAULT_COST,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    // ── Registration ────────────────────────────────────────────

    /// Driver sign-up
    pub async fn signup(&self, req: SignupRequest) -> DomainResult<AuthSession> {
        let profile = self
            .register(&req.email, &req.password, &req.name, UserRole::User, ApprovalStatus::None)
            .await?;
        info!(user_id = %profile.id, "Driver registered");
        self.issue(profile)
    }

    /// Owner sign-up: the account waits for admin approval before it may
    /// list locations.
    pub async fn signup_owner(&self, req: OwnerSignupRequest) -> DomainResult<AuthSession> {
        if req.company_name.trim().is_empty() || req.city.trim().is_empty() {
            return Err(DomainError::Validation(
                "Company name and city are required".into(),
            ));
        }
        let profile = self
            .register(
                &req.email,
                &req.password,
                &req.name,
                UserRole::Owner,
                ApprovalStatus::Pending,
            )
            .await?;

        let business = OwnerProfile {
            id: profile.id,
            company_name: req.company_name.trim().to_string(),
            city: req.city.trim().to_string(),
            created_at: profile.created_at,
        };
        if let Err(e) = self.repos.users().create_owner_profile(business).await {
            warn!(user_id = %profile.id, error = %e, "Owner profile not saved; rolling back account");
            if let Err(e) = self.repos.users().delete(profile.id).await {
                warn!(user_id = %profile.id, error = %e, "Rollback of owner account failed");
            }
            return Err(DomainError::Storage(
                "Account could not be created because the owner profile details failed. Please try again.".into(),
            ));
        }

        info!(user_id = %profile.id, "Owner registered, pending approval");
        self.issue(profile)
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: UserRole,
        approval_status: ApprovalStatus,
    ) -> DomainResult<UserProfile> {
        validate_email(email)?;
        validate_password(password)?;
        if name.trim().is_empty() {
            return Err(DomainError::Validation("Name is required".into()));
        }
        if self.repos.users().find_by_email(email).await?.is_some() {
            return Err(DomainError::Conflict(
                "An account with this email already exists".into(),
            ));
        }

        let profile = UserProfile::new(NewUser {
            email: email.to_string(),
            name: name.trim().to_string(),
            role,
            approval_status,
            password_hash: self.hash(password)?,
        });
        self.repos.users().create(profile.clone()).await?;
        Ok(profile)
    }

    /// Create the configured admin account unless an admin already exists.
    pub async fn ensure_admin(&self, email: &str, password: &str, name: &str) -> DomainResult<bool> {
        let admins = self
            .repos
            .users()
            .count(ProfileQuery {
                role: Some(UserRole::Admin),
                ..Default::default()
            })
            .await?;
        if admins > 0 {
            return Ok(false);
        }
        let profile = self
            .register(email, password, name, UserRole::Admin, ApprovalStatus::None)
            .await?;
        info!(email = %profile.email, "Default admin created; change its password");
        Ok(true)
    }

    // ── Sessions ────────────────────────────────────────────────

    /// Sign in at a portal. A role that belongs to another portal gets no
    /// session and a message pointing to the right one.
    pub async fn login(&self, email: &str, password: &str, portal: Portal) -> DomainResult<AuthSession> {
        let invalid = || DomainError::Unauthorized("Invalid login credentials".into());

        let profile = self
            .repos
            .users()
            .find_by_email(email)
            .await?
            .ok_or_else(invalid)?;
        if !verify_password(password, &profile.password_hash).unwrap_or(false) {
            return Err(invalid());
        }

        if let Err(message) = check_portal(portal, Some(profile.role)) {
            info!(user_id = %profile.id, ?portal, role = %profile.role, "Login refused at portal");
            return Err(DomainError::Forbidden(message.into()));
        }

        info!(user_id = %profile.id, ?portal, "Signed in");
        self.issue(profile)
    }

    /// Resolve a bearer token into the caller's context.
    pub async fn authenticate(&self, token: &str) -> DomainResult<AuthContext> {
        let claims = verify_token(token, &self.jwt)
            .map_err(|_| DomainError::Unauthorized("Invalid or expired token".into()))?;
        if self.sessions.is_revoked(&claims.jti) {
            return Err(DomainError::Unauthorized("Session has been signed out".into()));
        }
        let user_id = claims
            .user_id()
            .ok_or_else(|| DomainError::Unauthorized("Invalid or expired token".into()))?;
        let profile = self
            .repos
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::MissingProfile { user_id })?;

        Ok(AuthContext {
            expires_at: claims.expires_at(),
            session_id: claims.jti,
            profile,
        })
    }

    pub fn sign_out(&self, ctx: &AuthContext) {
        self.sessions.revoke(&ctx.session_id, ctx.expires_at);
        let purged = self.sessions.purge_expired();
        info!(user_id = %ctx.profile.id, purged, "Signed out");
    }

    // ── Profile ─────────────────────────────────────────────────

    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> DomainResult<UserProfile> {
        let mut profile = self
            .repos
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", user_id))?;

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(DomainError::Validation("Name is required".into()));
            }
            profile.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            if update.confirm_email.as_deref().map(str::trim) != Some(email.trim()) {
                return Err(DomainError::Validation("Emails do not match".into()));
            }
            validate_email(&email)?;
            profile.email = normalize_email(&email);
        }

        self.repos.users().update(profile.clone()).await?;
        info!(%user_id, "Profile updated");
        Ok(profile)
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        password: &str,
        confirm_password: &str,
    ) -> DomainResult<()> {
        if password != confirm_password {
            return Err(DomainError::Validation("Passwords do not match".into()));
        }
        validate_password(password)?;
        let hash = self.hash(password)?;
        self.repos.users().update_password(user_id, &hash).await?;
        info!(%user_id, "Password changed");
        Ok(())
    }

    fn hash(&self, password: &str) -> DomainResult<String> {
        hash_password(password, self.bcrypt_cost)
            .map_err(|e| DomainError::Storage(format!("Failed to hash password: {e}")))
    }

    fn issue(&self, profile: UserProfile) -> DomainResult<AuthSession> {
        let (token, _) = create_token(profile.id, &profile.email, &self.jwt)
            .map_err(|e| DomainError::Storage(format!("Failed to create token: {e}")))?;
        Ok(AuthSession {
            token,
            token_type: "Bearer".into(),
            expires_in: self.jwt.expiration_hours * 3600,
            profile,
        })
    }
}

fn validate_email(email: &str) -> DomainResult<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(DomainError::Validation("Invalid email address".into())),
    }
}

fn validate_password(password: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
