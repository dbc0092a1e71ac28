//! Admin console operations
//!
//! Owner approval, demotion and the cascading deletes. Cascades remove
//! child rows first (bookings, then locations, then the owner profile,
//! then the user) and reconcile every surviving location they touched.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::availability::AvailabilityReconciler;
use super::booking_lifecycle::{BookingLifecycle, TransitionOutcome};
use crate::application::events::{ChangeEvent, ChangeOp, SharedChangeBus};
use crate::domain::{
    ApprovalStatus, BookingDetails, BookingStatus, DomainError, DomainResult, Location,
    LocationQuery, OwnerProfile, ProfileQuery, RepositoryProvider, UserProfile, UserRole,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdminOverview {
    pub total_users: u64,
    pub total_owners: u64,
    pub pending_owners: u64,
    pub total_locations: u64,
    pub total_bookings: u64,
}

/// Owner row of the admin console with per-owner counts
#[derive(Debug, Clone)]
pub struct OwnerSummary {
    pub profile: UserProfile,
    pub business: Option<OwnerProfile>,
    pub properties: usize,
    pub bookings: usize,
}

/// Rows removed by a cascading delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub locations: usize,
    pub bookings: u64,
}

#[derive(Clone)]
pub struct AdminService {
    repos: Arc<dyn RepositoryProvider>,
    reconciler: AvailabilityReconciler,
    lifecycle: BookingLifecycle,
    events: SharedChangeBus,
}

impl AdminService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        reconciler: AvailabilityReconciler,
        lifecycle: BookingLifecycle,
        events: SharedChangeBus,
    ) -> Self {
        Self {
            repos,
            reconciler,
            lifecycle,
            events,
        }
    }

    pub async fn overview(&self) -> DomainResult<AdminOverview> {
        let users = self.repos.users();
        Ok(AdminOverview {
            total_users: users.count(ProfileQuery::default()).await?,
            total_owners: users
                .count(ProfileQuery {
                    role: Some(UserRole::Owner),
                    ..Default::default()
                })
                .await?,
            pending_owners: users
                .count(ProfileQuery {
                    role: Some(UserRole::Owner),
                    approval_status: Some(ApprovalStatus::Pending),
                })
                .await?,
            total_locations: self.repos.locations().count().await?,
            total_bookings: self.repos.bookings().count().await?,
        })
    }

    pub async fn pending_owners(&self) -> DomainResult<Vec<UserProfile>> {
        self.repos
            .users()
            .list(ProfileQuery {
                role: Some(UserRole::Owner),
                approval_status: Some(ApprovalStatus::Pending),
            })
            .await
    }

    /// Processed owners (anything but pending), newest first.
    pub async fn owners(&self) -> DomainResult<Vec<OwnerSummary>> {
        let owners = self
            .repos
            .users()
            .list(ProfileQuery {
                role: Some(UserRole::Owner),
                ..Default::default()
            })
            .await?;

        let mut rows = Vec::new();
        for profile in owners
            .into_iter()
            .filter(|p| p.approval_status != ApprovalStatus::Pending)
        {
            let locations = self.locations_of(profile.id).await?;
            let ids: Vec<Uuid> = locations.iter().map(|l| l.id).collect();
            let bookings = if ids.is_empty() {
                0
            } else {
                self.repos.bookings().list_for_locations(&ids).await?.len()
            };
            rows.push(OwnerSummary {
                business: self.repos.users().find_owner_profile(profile.id).await?,
                properties: locations.len(),
                bookings,
                profile,
            });
        }
        Ok(rows)
    }

    pub async fn approve_owner(&self, id: Uuid) -> DomainResult<UserProfile> {
        self.set_role(id, UserRole::Owner, ApprovalStatus::Approved)
            .await
    }

    pub async fn reject_owner(&self, id: Uuid) -> DomainResult<UserProfile> {
        let profile = self.profile(id).await?;
        self.set_role(id, profile.role, ApprovalStatus::Rejected)
            .await
    }

    /// Back to a regular driver account; existing locations stay listed.
    pub async fn demote_owner(&self, id: Uuid) -> DomainResult<UserProfile> {
        self.set_role(id, UserRole::User, ApprovalStatus::None).await
    }

    async fn set_role(
        &self,
        id: Uuid,
        role: UserRole,
        approval_status: ApprovalStatus,
    ) -> DomainResult<UserProfile> {
        let mut profile = self.profile(id).await?;
        if profile.role == UserRole::Admin {
            return Err(DomainError::Forbidden(
                "Admin accounts cannot be changed here".into(),
            ));
        }
        self.repos
            .users()
            .set_role(id, role, approval_status)
            .await?;
        profile.role = role;
        profile.approval_status = approval_status;

        self.events.publish(ChangeEvent::user(ChangeOp::Update, id));
        info!(user_id = %id, %role, approval = approval_status.as_str(), "Account role changed");
        Ok(profile)
    }

    pub async fn delete_owner(&self, id: Uuid) -> DomainResult<DeleteSummary> {
        let profile = self.profile(id).await?;
        if profile.role == UserRole::Admin {
            return Err(DomainError::Forbidden(
                "Admin accounts cannot be deleted here".into(),
            ));
        }

        let locations = self.locations_of(id).await?;
        let ids: Vec<Uuid> = locations.iter().map(|l| l.id).collect();

        // Bookings the owner made as a driver elsewhere go with the user row.
        let touched: BTreeSet<Uuid> = self
            .repos
            .bookings()
            .list_for_user(id)
            .await?
            .into_iter()
            .map(|b| b.booking.location_id)
            .filter(|loc| !ids.contains(loc))
            .collect();

        let mut summary = DeleteSummary::default();
        if !ids.is_empty() {
            summary.bookings = self.repos.bookings().delete_for_locations(&ids).await?;
            for location in &locations {
                self.repos.locations().delete(location.id).await?;
                self.events
                    .publish(ChangeEvent::location_deleted(location.id, location.owner_id));
            }
            summary.locations = locations.len();
        }

        self.repos.users().delete_owner_profile(id).await?;
        self.repos.users().delete(id).await?;
        self.events.publish(ChangeEvent::user(ChangeOp::Delete, id));

        for location_id in touched {
            if let Err(e) = self.reconciler.reconcile(location_id).await {
                warn!(%location_id, error = %e, "Reconciliation after owner delete failed");
            }
        }

        info!(
            user_id = %id,
            locations = summary.locations,
            bookings = summary.bookings,
            "Owner deleted"
        );
        Ok(summary)
    }

    pub async fn locations(&self) -> DomainResult<Vec<Location>> {
        self.repos.locations().list(LocationQuery::default()).await
    }

    pub async fn delete_location(&self, id: Uuid) -> DomainResult<DeleteSummary> {
        let location = self
            .repos
            .locations()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Location", id))?;

        let bookings = self.repos.bookings().delete_for_locations(&[id]).await?;
        self.repos.locations().delete(id).await?;
        self.events
            .publish(ChangeEvent::location_deleted(id, location.owner_id));

        info!(location_id = %id, bookings, "Location deleted");
        Ok(DeleteSummary {
            locations: 1,
            bookings,
        })
    }

    pub async fn bookings(&self, status: Option<BookingStatus>) -> DomainResult<Vec<BookingDetails>> {
        self.repos.bookings().list_all(status).await
    }

    pub async fn set_booking_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> DomainResult<TransitionOutcome> {
        self.lifecycle.transition(booking_id, status).await
    }

    async fn profile(&self, id: Uuid) -> DomainResult<UserProfile> {
        self.repos
            .users()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    async fn locations_of(&self, owner_id: Uuid) -> DomainResult<Vec<Location>> {
        self.repos
            .locations()
            .list(LocationQuery {
                owner_id: Some(owner_id),
                ..Default::default()
            })
            .await
    }
}
