//! Location repository interface

use async_trait::async_trait;
use uuid::Uuid;

use super::model::{Location, LocationQuery};
use crate::domain::DomainResult;

#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Save a new location
    async fn insert(&self, location: Location) -> DomainResult<()>;

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Location>>;

    /// Overwrite descriptive fields and capacity of an existing location
    async fn update(&self, location: Location) -> DomainResult<()>;

    /// Persist a recomputed availability counter
    async fn set_available_slots(&self, id: Uuid, available_slots: u32) -> DomainResult<()>;

    /// Newest first
    async fn list(&self, query: LocationQuery) -> DomainResult<Vec<Location>>;

    async fn delete(&self, id: Uuid) -> DomainResult<()>;

    async fn count(&self) -> DomainResult<u64>;
}
