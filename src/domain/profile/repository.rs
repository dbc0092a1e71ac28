//! Profile repository interface

use async_trait::async_trait;
use uuid::Uuid;

use super::model::{ApprovalStatus, OwnerProfile, ProfileQuery, UserProfile, UserRole};
use crate::domain::DomainResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create(&self, profile: UserProfile) -> DomainResult<()>;

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<UserProfile>>;

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<UserProfile>>;

    /// Update name, email, role and approval status.
    async fn update(&self, profile: UserProfile) -> DomainResult<()>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> DomainResult<()>;

    async fn set_role(
        &self,
        id: Uuid,
        role: UserRole,
        approval_status: ApprovalStatus,
    ) -> DomainResult<()>;

    async fn delete(&self, id: Uuid) -> DomainResult<()>;

    /// Newest first
    async fn list(&self, query: ProfileQuery) -> DomainResult<Vec<UserProfile>>;

    async fn count(&self, query: ProfileQuery) -> DomainResult<u64>;

    async fn create_owner_profile(&self, profile: OwnerProfile) -> DomainResult<()>;

    async fn find_owner_profile(&self, id: Uuid) -> DomainResult<Option<OwnerProfile>>;

    async fn delete_owner_profile(&self, id: Uuid) -> DomainResult<()>;
}
