//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::booking::BookingRepository;
use super::location::LocationRepository;
use super::profile::UserRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

// ── RepositoryProvider ──────────────────────────────────────────

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let loc = repos.locations().find_by_id(id).await?;
///     let active = repos.bookings().count_active(id).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn locations(&self) -> &dyn LocationRepository;
    fn bookings(&self) -> &dyn BookingRepository;
    fn users(&self) -> &dyn UserRepository;
}
