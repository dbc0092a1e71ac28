//! Location catalogue and owner dashboard

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::availability::{AvailabilityReconciler, Reconciliation};
use super::booking_lifecycle::{BookingLifecycle, TransitionOutcome};
use crate::application::events::{ChangeEvent, ChangeOp, SharedChangeBus};
use crate::application::slots::{OccupancyResolver, SlotGridView};
use crate::domain::access::{can_create_locations, Actor};
use crate::domain::{
    BookingDetails, BookingStatus, DomainError, DomainResult, Location, LocationPatch,
    LocationQuery, NewLocation, RepositoryProvider,
};
use crate::domain::location::validate_price;
use crate::infrastructure::seed::{find_seed_location, seed_locations};

/// Figures shown at the top of the owner dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerDashboard {
    pub properties: usize,
    pub total_slots: u64,
    pub available_slots: u64,
    pub total_bookings: usize,
    pub active_bookings: usize,
    /// Sum of amounts over bookings that were not cancelled
    pub revenue: Decimal,
}

#[derive(Clone)]
pub struct LocationService {
    repos: Arc<dyn RepositoryProvider>,
    occupancy: OccupancyResolver,
    reconciler: AvailabilityReconciler,
    lifecycle: BookingLifecycle,
    events: SharedChangeBus,
    demo_catalogue: bool,
}

impl LocationService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        reconciler: AvailabilityReconciler,
        lifecycle: BookingLifecycle,
        events: SharedChangeBus,
    ) -> Self {
        Self {
            occupancy: OccupancyResolver::new(repos.clone()),
            repos,
            reconciler,
            lifecycle,
            events,
            demo_catalogue: true,
        }
    }

    /// Serve the sample catalogue when the store has no locations.
    pub fn with_demo_catalogue(mut self, enabled: bool) -> Self {
        self.demo_catalogue = enabled;
        self
    }

    // ── Public catalogue ────────────────────────────────────────

    pub async fn list(&self, query: LocationQuery) -> DomainResult<Vec<Location>> {
        let stored = self.repos.locations().list(query.clone()).await?;
        if !stored.is_empty() || !self.demo_catalogue {
            return Ok(stored);
        }
        if self.repos.locations().count().await? > 0 {
            // The store has locations, just none matching.
            return Ok(stored);
        }
        Ok(seed_locations()
            .into_iter()
            .filter(|l| l.matches(&query))
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<Location> {
        if let Some(location) = self.repos.locations().find_by_id(id).await? {
            return Ok(location);
        }
        if self.demo_catalogue {
            if let Some(location) = find_seed_location(id) {
                return Ok(location);
            }
        }
        Err(DomainError::not_found("Location", id))
    }

    pub async fn slots(&self, id: Uuid) -> DomainResult<SlotGridView> {
        let location = self.get(id).await?;
        Ok(self.occupancy.grid(&location).await)
    }

    // ── Owner operations ────────────────────────────────────────

    pub async fn create(&self, actor: Actor, new: NewLocation) -> DomainResult<Location> {
        if !can_create_locations(actor.session) {
            return Err(DomainError::Forbidden(
                "You must be approved by an admin to list properties.".into(),
            ));
        }
        validate_listing(&new.name, new.total_slots, new.price_per_hour)?;

        let location = Location::new(Uuid::new_v4(), Some(actor.user_id), new);
        self.repos.locations().insert(location.clone()).await?;
        self.events
            .publish(ChangeEvent::location(ChangeOp::Insert, &location));

        info!(location_id = %location.id, owner_id = %actor.user_id, "Location listed");
        Ok(location)
    }

    /// Edit a location, then recompute its counter against the new capacity.
    pub async fn update(
        &self,
        actor: Actor,
        id: Uuid,
        patch: LocationPatch,
    ) -> DomainResult<(Location, Option<Reconciliation>)> {
        let current = self.managed(actor, id).await?;
        let mut location = current.clone();
        location.apply(patch);
        validate_listing(&location.name, location.total_slots, location.price_per_hour)?;
        self.check_held_slots(&current, &location).await?;

        self.repos.locations().update(location.clone()).await?;
        self.events
            .publish(ChangeEvent::location(ChangeOp::Update, &location));

        let reconciliation = match self.reconciler.reconcile(id).await {
            Ok(r) => {
                location.available_slots = r.available_slots;
                Some(r)
            }
            Err(e) => {
                warn!(location_id = %id, error = %e, "Reconciliation after edit failed");
                None
            }
        };
        Ok((location, reconciliation))
    }

    /// Manual "sync slots": a failed write is reported to the owner.
    pub async fn sync(&self, actor: Actor, id: Uuid) -> DomainResult<Reconciliation> {
        self.managed(actor, id).await?;
        let r = self.reconciler.sync(id).await?;
        info!(
            location_id = %id,
            active = r.active_bookings,
            available = r.available_slots,
            "Slots synced"
        );
        Ok(r)
    }

    pub async fn owner_locations(&self, owner_id: Uuid) -> DomainResult<Vec<Location>> {
        self.repos
            .locations()
            .list(LocationQuery {
                owner_id: Some(owner_id),
                ..Default::default()
            })
            .await
    }

    pub async fn owner_bookings(&self, owner_id: Uuid) -> DomainResult<Vec<BookingDetails>> {
        let ids: Vec<Uuid> = self
            .owner_locations(owner_id)
            .await?
            .iter()
            .map(|l| l.id)
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.repos.bookings().list_for_locations(&ids).await
    }

    pub async fn dashboard(&self, owner_id: Uuid) -> DomainResult<OwnerDashboard> {
        let locations = self.owner_locations(owner_id).await?;
        let bookings = self.owner_bookings(owner_id).await?;

        let revenue = bookings
            .iter()
            .filter(|b| b.booking.status != BookingStatus::Cancelled)
            .map(|b| b.booking.amount)
            .sum();

        Ok(OwnerDashboard {
            properties: locations.len(),
            total_slots: locations.iter().map(|l| u64::from(l.total_slots)).sum(),
            available_slots: locations.iter().map(|l| u64::from(l.available_slots)).sum(),
            total_bookings: bookings.len(),
            active_bookings: bookings.iter().filter(|b| b.booking.is_active()).count(),
            revenue,
        })
    }

    /// Owner status override on a booking at one of their locations.
    pub async fn set_booking_status(
        &self,
        actor: Actor,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> DomainResult<TransitionOutcome> {
        let booking = self
            .repos
            .bookings()
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", booking_id))?;
        self.managed(actor, booking.location_id).await?;
        self.lifecycle.transition(booking_id, status).await
    }

    /// Active bookings must stay inside the slot space after an edit, so a
    /// kind change or shrink is refused while a held slot would fall out.
    async fn check_held_slots(&self, current: &Location, edited: &Location) -> DomainResult<()> {
        if edited.kind == current.kind && edited.total_slots >= current.total_slots {
            return Ok(());
        }
        let occupied = self.occupancy.resolve_occupied(current.id).await?;
        let stranded: Vec<String> = occupied
            .sorted()
            .into_iter()
            .filter(|slot| slot.belongs_to(current.kind, current.total_slots))
            .filter(|slot| !slot.belongs_to(edited.kind, edited.total_slots))
            .map(|slot| slot.to_string())
            .collect();
        if stranded.is_empty() {
            return Ok(());
        }
        Err(DomainError::Conflict(format!(
            "Active bookings hold {}; finish or cancel them before changing the slot layout",
            stranded.join(", ")
        )))
    }

    /// Load a stored location the actor may manage.
    async fn managed(&self, actor: Actor, id: Uuid) -> DomainResult<Location> {
        let location = self
            .repos
            .locations()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Location", id))?;
        if !actor.may_manage(location.owner_id) {
            return Err(DomainError::Forbidden(
                "You can only manage your own properties.".into(),
            ));
        }
        Ok(location)
    }
}

fn validate_listing(name: &str, total_slots: u32, price_per_hour: Decimal) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::Validation("Name is required".into()));
    }
    if total_slots == 0 {
        return Err(DomainError::Validation(
            "A location needs at least one slot".into(),
        ));
    }
    validate_price(price_per_hour)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::application::services::booking_lifecycle::{BookingOutcome, BookingRequest};
    use crate::application::services::testing::{fixture, Fixture};
    use crate::domain::access::SessionRole;
    use crate::domain::{ApprovalStatus, LocationKind, UserRole};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    fn service(fx: &Fixture) -> LocationService {
        let lifecycle =
            BookingLifecycle::new(fx.repos.clone(), fx.reconciler.clone(), fx.events.clone());
        LocationService::new(
            fx.repos.clone(),
            fx.reconciler.clone(),
            lifecycle,
            fx.events.clone(),
        )
    }

    fn actor(user_id: Uuid, role: UserRole, approval_status: ApprovalStatus) -> Actor {
        Actor {
            user_id,
            session: SessionRole {
                role,
                approval_status,
            },
        }
    }

    fn listing(total_slots: u32) -> NewLocation {
        NewLocation {
            name: "BKC Fast Charge Zone".into(),
            address: "G Block BKC".into(),
            city: "Mumbai".into(),
            kind: LocationKind::Ev,
            price_per_hour: Decimal::from(90),
            total_slots,
            description: None,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn unapproved_owner_cannot_list() {
        let fx = fixture(1).await;
        let svc = service(&fx);
        for status in [ApprovalStatus::Pending, ApprovalStatus::Rejected] {
            let err = svc
                .create(actor(Uuid::new_v4(), UserRole::Owner, status), listing(4))
                .await
                .unwrap_err();
            match err {
                DomainError::Forbidden(msg) => {
                    assert_eq!(msg, "You must be approved by an admin to list properties.")
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn approved_owner_lists_fully_available_location() {
        let fx = fixture(1).await;
        let svc = service(&fx);
        let owner = actor(Uuid::new_v4(), UserRole::Owner, ApprovalStatus::Approved);

        let loc = svc.create(owner, listing(6)).await.unwrap();
        assert_eq!(loc.available_slots, 6);
        assert_eq!(loc.owner_id, Some(owner.user_id));
        assert_eq!(svc.owner_locations(owner.user_id).await.unwrap().len(), 1);

        assert!(matches!(
            svc.create(owner, listing(0)).await,
            Err(DomainError::Validation(_))
        ));
        let sub_paisa = NewLocation {
            price_per_hour: Decimal::new(12345, 3),
            ..listing(2)
        };
        assert!(matches!(
            svc.create(owner, sub_paisa).await,
            Err(DomainError::Validation(_))
        ));
        assert_eq!(svc.owner_locations(owner.user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn edit_reconciles_against_new_capacity() {
        let fx = fixture(1).await;
        let svc = service(&fx);
        let owner = actor(Uuid::new_v4(), UserRole::Owner, ApprovalStatus::Approved);
        let loc = svc.create(owner, listing(6)).await.unwrap();
        for slot in ["C1", "C2", "C3"] {
            svc.lifecycle
                .create(BookingRequest {
                    location_id: loc.id,
                    user_id: fx.user.id,
                    selected_slot: slot.into(),
                    start_time: Utc::now(),
                    duration_hours: 1,
                })
                .await
                .unwrap();
        }

        let (edited, r) = svc
            .update(
                owner,
                loc.id,
                LocationPatch {
                    total_slots: Some(4),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(r.unwrap().available_slots, 1);
        assert_eq!(edited.available_slots, 1);
    }

    #[tokio::test]
    async fn edit_cannot_strand_active_bookings() {
        let fx = fixture(1).await;
        let svc = service(&fx);
        let owner = actor(Uuid::new_v4(), UserRole::Owner, ApprovalStatus::Approved);
        let loc = svc.create(owner, listing(3)).await.unwrap();
        for slot in ["C1", "C3"] {
            svc.lifecycle
                .create(BookingRequest {
                    location_id: loc.id,
                    user_id: fx.user.id,
                    selected_slot: slot.into(),
                    start_time: Utc::now(),
                    duration_hours: 1,
                })
                .await
                .unwrap();
        }

        let to_parking = LocationPatch {
            kind: Some(LocationKind::Parking),
            ..Default::default()
        };
        match svc.update(owner, loc.id, to_parking.clone()).await {
            Err(DomainError::Conflict(msg)) => assert!(msg.contains("C1, C3"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
        let shrink = LocationPatch {
            total_slots: Some(2),
            ..Default::default()
        };
        match svc.update(owner, loc.id, shrink).await {
            Err(DomainError::Conflict(msg)) => assert!(!msg.contains("C1") && msg.contains("C3")),
            other => panic!("unexpected {other:?}"),
        }

        let stored = svc.get(loc.id).await.unwrap();
        assert_eq!(stored.kind, LocationKind::Ev);
        assert_eq!(stored.total_slots, 3);

        // Growing keeps every held slot, so it goes through.
        let (grown, _) = svc
            .update(
                owner,
                loc.id,
                LocationPatch {
                    total_slots: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(grown.available_slots, 3);

        // Once the bookings are over the layout is free to change.
        let ids: Vec<Uuid> = svc
            .owner_bookings(owner.user_id)
            .await
            .unwrap()
            .iter()
            .map(|b| b.booking.id)
            .collect();
        assert_eq!(ids.len(), 2);
        for id in ids {
            svc.set_booking_status(owner, id, BookingStatus::Cancelled)
                .await
                .unwrap();
        }
        let (parking, _) = svc.update(owner, loc.id, to_parking).await.unwrap();
        assert_eq!(parking.kind, LocationKind::Parking);
        assert_eq!(parking.available_slots, 5);
    }

    #[tokio::test]
    async fn strangers_cannot_edit_or_sync() {
        let fx = fixture(1).await;
        let svc = service(&fx);
        let owner = actor(Uuid::new_v4(), UserRole::Owner, ApprovalStatus::Approved);
        let other = actor(Uuid::new_v4(), UserRole::Owner, ApprovalStatus::Approved);
        let loc = svc.create(owner, listing(2)).await.unwrap();

        assert!(matches!(
            svc.update(other, loc.id, LocationPatch::default()).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            svc.sync(other, loc.id).await,
            Err(DomainError::Forbidden(_))
        ));
        let admin = actor(Uuid::new_v4(), UserRole::Admin, ApprovalStatus::None);
        assert!(svc.sync(admin, loc.id).await.unwrap().persisted);
    }

    #[tokio::test]
    async fn dashboard_revenue_skips_cancelled() {
        let fx = fixture(1).await;
        let svc = service(&fx);
        let owner = actor(Uuid::new_v4(), UserRole::Owner, ApprovalStatus::Approved);
        let loc = svc.create(owner, listing(5)).await.unwrap();

        let mut ids = Vec::new();
        for slot in ["C1", "C2"] {
            let outcome = svc
                .lifecycle
                .create(BookingRequest {
                    location_id: loc.id,
                    user_id: fx.user.id,
                    selected_slot: slot.into(),
                    start_time: Utc::now(),
                    duration_hours: 2,
                })
                .await
                .unwrap();
            match outcome {
                BookingOutcome::Created(r) => ids.push(r.booking.id),
                other => panic!("unexpected {other:?}"),
            }
        }
        svc.set_booking_status(owner, ids[1], BookingStatus::Cancelled)
            .await
            .unwrap();

        let dash = svc.dashboard(owner.user_id).await.unwrap();
        assert_eq!(dash.properties, 1);
        assert_eq!(dash.total_bookings, 2);
        assert_eq!(dash.active_bookings, 1);
        assert_eq!(dash.revenue, Decimal::from(180));
        assert_eq!(dash.available_slots, 4);
    }

    #[tokio::test]
    async fn owner_cannot_change_foreign_booking() {
        let fx = fixture(3).await;
        let svc = service(&fx);
        let booking = fx.book("P1").await;
        let owner = actor(Uuid::new_v4(), UserRole::Owner, ApprovalStatus::Approved);
        assert!(matches!(
            svc.set_booking_status(owner, booking.id, BookingStatus::Started)
                .await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn empty_store_serves_the_sample_catalogue() {
        let fx = fixture(1).await;
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let lifecycle = BookingLifecycle::new(repos.clone(), fx.reconciler.clone(), fx.events.clone());
        let svc = LocationService::new(repos.clone(), fx.reconciler.clone(), lifecycle, fx.events.clone());

        let evs = svc
            .list(LocationQuery {
                kind: Some(LocationKind::Ev),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(evs.len(), 6);

        let id = evs[0].id;
        let grid = svc.slots(id).await.unwrap();
        assert!(grid.occupancy_known);
        assert!(grid.occupied.is_empty());

        let svc = svc.with_demo_catalogue(false);
        assert!(svc.list(LocationQuery::default()).await.unwrap().is_empty());
        assert!(matches!(svc.get(id).await, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn stored_locations_hide_the_catalogue() {
        let fx = fixture(2).await;
        let svc = service(&fx);
        let all = svc.list(LocationQuery::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        let none = svc
            .list(LocationQuery {
                city: Some("Thane".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
