//! Booking lifecycle
//!
//! Creates bookings and moves them through their status state machine.
//! Every write that can change the active count of a location is followed
//! by a reconciliation of that location.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::availability::{AvailabilityReconciler, Reconciliation};
use crate::application::events::{ChangeEvent, ChangeOp, SharedChangeBus};
use crate::application::slots::OccupancyResolver;
use crate::domain::access::Actor;
use crate::domain::{
    Booking, BookingDetails, BookingStatus, DomainError, DomainResult, Location,
    RepositoryProvider, SlotId, TransitionPolicy,
};
use crate::infrastructure::seed::find_seed_location;

/// Input of a new booking
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub location_id: Uuid,
    pub user_id: Uuid,
    pub selected_slot: String,
    pub start_time: DateTime<Utc>,
    pub duration_hours: u32,
}

/// How the booking reached the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatePath {
    /// Store procedure: insert and recompute in one transaction
    Atomic,
    /// Insert, then reconcile separately
    Fallback,
}

#[derive(Debug, Clone)]
pub struct BookingReceipt {
    pub booking: Booking,
    pub path: CreatePath,
    /// Counter after the booking; `None` when reconciliation could not run
    pub available_slots: Option<u32>,
    pub availability_persisted: bool,
}

#[derive(Debug, Clone)]
pub enum BookingOutcome {
    Created(BookingReceipt),
    /// The location only exists in the sample catalogue; nothing was stored.
    Demo(Booking),
}

#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub booking: Booking,
    pub previous: BookingStatus,
    pub changed: bool,
    pub reconciliation: Option<Reconciliation>,
}

#[derive(Clone)]
pub struct BookingLifecycle {
    repos: Arc<dyn RepositoryProvider>,
    occupancy: OccupancyResolver,
    reconciler: AvailabilityReconciler,
    events: SharedChangeBus,
    policy: TransitionPolicy,
    demo_catalogue: bool,
}

impl BookingLifecycle {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        reconciler: AvailabilityReconciler,
        events: SharedChangeBus,
    ) -> Self {
        Self {
            occupancy: OccupancyResolver::new(repos.clone()),
            repos,
            reconciler,
            events,
            policy: TransitionPolicy::default(),
            demo_catalogue: true,
        }
    }

    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Whether sample-catalogue locations accept (unsaved) demo bookings.
    pub fn with_demo_catalogue(mut self, enabled: bool) -> Self {
        self.demo_catalogue = enabled;
        self
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    fn demo_location(&self, location_id: Uuid) -> Option<Location> {
        if self.demo_catalogue {
            find_seed_location(location_id)
        } else {
            None
        }
    }

    pub async fn create(&self, request: BookingRequest) -> DomainResult<BookingOutcome> {
        let slot = SlotId::parse(&request.selected_slot).ok_or_else(|| {
            DomainError::Validation("Please select a parking slot or charger.".into())
        })?;

        let stored = self.repos.locations().find_by_id(request.location_id).await?;
        let location = match stored {
            Some(location) => location,
            None => {
                return match self.demo_location(request.location_id) {
                    Some(demo) => self.demo_booking(&demo, slot, &request),
                    None => Err(DomainError::not_found("Location", request.location_id)),
                };
            }
        };

        let booking = Booking::schedule(
            &location,
            request.user_id,
            slot,
            request.start_time,
            request.duration_hours,
        )?;

        let occupied = self.occupancy.resolve_occupied(location.id).await?;
        if occupied.contains(&booking.selected_slot) {
            return Err(DomainError::SlotTaken {
                location_id: location.id,
                slot: booking.selected_slot.to_string(),
            });
        }
        if occupied.len() as u64 >= u64::from(location.total_slots) {
            return Err(DomainError::Conflict(format!("{} is fully booked", location.name)));
        }

        let receipt = match self.repos.bookings().create_and_reconcile(booking.clone()).await {
            Ok(created) => BookingReceipt {
                booking: created.booking,
                path: CreatePath::Atomic,
                available_slots: Some(created.available_slots),
                availability_persisted: true,
            },
            Err(DomainError::ProcedureUnavailable(procedure)) => {
                warn!(procedure, location_id = %location.id, "Store procedure unavailable, using insert-then-reconcile");
                match self.insert_then_reconcile(booking).await {
                    Ok(receipt) => receipt,
                    Err(e) => return self.on_missing_location(e, &location, &request),
                }
            }
            Err(e) => return self.on_missing_location(e, &location, &request),
        };

        metrics::counter!(
            "bookings_created_total",
            "path" => match receipt.path {
                CreatePath::Atomic => "atomic",
                CreatePath::Fallback => "fallback",
            }
        )
        .increment(1);

        self.events.publish(ChangeEvent::booking(
            ChangeOp::Insert,
            &receipt.booking,
            location.owner_id,
        ));
        if receipt.path == CreatePath::Atomic {
            if let Some(available) = receipt.available_slots {
                self.events.publish(ChangeEvent::availability(
                    location.id,
                    location.owner_id,
                    available,
                ));
            }
        }

        info!(
            booking_id = %receipt.booking.id,
            location_id = %location.id,
            slot = %receipt.booking.selected_slot,
            path = ?receipt.path,
            "Booking created"
        );
        Ok(BookingOutcome::Created(receipt))
    }

    async fn insert_then_reconcile(&self, booking: Booking) -> DomainResult<BookingReceipt> {
        let location_id = booking.location_id;
        self.repos.bookings().insert(booking.clone()).await?;

        let (available_slots, availability_persisted) =
            match self.reconciler.reconcile(location_id).await {
                Ok(r) => (Some(r.available_slots), r.persisted),
                Err(e) => {
                    warn!(%location_id, error = %e, "Booking stored but availability not reconciled");
                    (None, false)
                }
            };

        Ok(BookingReceipt {
            booking,
            path: CreatePath::Fallback,
            available_slots,
            availability_persisted,
        })
    }

    /// The location vanished between lookup and insert: a catalogue
    /// location still yields a demo booking.
    fn on_missing_location(
        &self,
        error: DomainError,
        location: &Location,
        request: &BookingRequest,
    ) -> DomainResult<BookingOutcome> {
        if let DomainError::MissingLocation(id) = error {
            if let Some(demo) = self.demo_location(id) {
                let slot = SlotId::parse(&request.selected_slot)
                    .ok_or_else(|| DomainError::Validation("Missing slot".into()))?;
                return self.demo_booking(&demo, slot, request);
            }
            warn!(location_id = %location.id, "Location disappeared while booking");
        }
        Err(error)
    }

    fn demo_booking(
        &self,
        location: &Location,
        slot: SlotId,
        request: &BookingRequest,
    ) -> DomainResult<BookingOutcome> {
        let booking = Booking::schedule(
            location,
            request.user_id,
            slot,
            request.start_time,
            request.duration_hours,
        )?;
        info!(
            location_id = %location.id,
            booking_id = %booking.id,
            "Demo booking on a sample location; not stored"
        );
        Ok(BookingOutcome::Demo(booking))
    }

    /// The driver's own bookings, newest first
    pub async fn mine(&self, user_id: Uuid) -> DomainResult<Vec<BookingDetails>> {
        self.repos.bookings().list_for_user(user_id).await
    }

    /// A booking with the names printed on its barcode ticket. Drivers see
    /// their own; owners the ones at their locations; admins all of them.
    pub async fn ticket(&self, actor: Actor, booking_id: Uuid) -> DomainResult<BookingDetails> {
        let booking = self
            .repos
            .bookings()
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", booking_id))?;
        let location = self.repos.locations().find_by_id(booking.location_id).await?;

        let visible = booking.user_id == actor.user_id
            || actor.may_manage(location.as_ref().and_then(|l| l.owner_id));
        if !visible {
            // Indistinguishable from a missing booking
            return Err(DomainError::not_found("Booking", booking_id));
        }

        let user = self.repos.users().find_by_id(booking.user_id).await?;
        Ok(BookingDetails {
            location_name: location.map(|l| l.name),
            user_name: user.as_ref().map(|u| u.name.clone()),
            user_email: user.map(|u| u.email),
            booking,
        })
    }

    /// Move a booking to `status`, then reconcile its location.
    pub async fn transition(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> DomainResult<TransitionOutcome> {
        let mut booking = self
            .repos
            .bookings()
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", booking_id))?;

        let previous = booking.status;
        if previous == status {
            return Ok(TransitionOutcome {
                booking,
                previous,
                changed: false,
                reconciliation: None,
            });
        }

        if !self.policy.permits(previous, status) {
            return Err(DomainError::Conflict(format!(
                "Cannot move a {previous} booking to {status}"
            )));
        }
        if !previous.can_transition_to(status) {
            warn!(%booking_id, from = %previous, to = %status, "Status override outside the state machine");
        }

        self.repos.bookings().update_status(booking_id, status).await?;
        booking.status = status;
        booking.updated_at = Utc::now();

        let owner_id = self
            .repos
            .locations()
            .find_by_id(booking.location_id)
            .await
            .ok()
            .flatten()
            .and_then(|l| l.owner_id);
        self.events
            .publish(ChangeEvent::booking(ChangeOp::Update, &booking, owner_id));

        let reconciliation = match self.reconciler.reconcile(booking.location_id).await {
            Ok(r) => Some(r),
            Err(e) => {
                warn!(%booking_id, location_id = %booking.location_id, error = %e, "Reconciliation after transition failed");
                None
            }
        };

        info!(%booking_id, from = %previous, to = %status, "Booking status changed");
        Ok(TransitionOutcome {
            booking,
            previous,
            changed: true,
            reconciliation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::Table;
    use crate::application::services::testing::{fixture, FlakyRepos, Fixture};
    use crate::domain::LocationKind;
    use crate::shared::retry::RetryConfig;

    fn lifecycle(fx: &Fixture) -> BookingLifecycle {
        BookingLifecycle::new(fx.repos.clone(), fx.reconciler.clone(), fx.events.clone())
    }

    fn request(fx: &Fixture, slot: &str, hours: u32) -> BookingRequest {
        BookingRequest {
            location_id: fx.location.id,
            user_id: fx.user.id,
            selected_slot: slot.into(),
            start_time: Utc::now(),
            duration_hours: hours,
        }
    }

    fn created(outcome: BookingOutcome) -> BookingReceipt {
        match outcome {
            BookingOutcome::Created(r) => r,
            BookingOutcome::Demo(_) => panic!("expected a stored booking"),
        }
    }

    #[tokio::test]
    async fn scenario_first_booking_takes_one_slot() {
        let fx = fixture(5).await;
        let lc = lifecycle(&fx);
        fx.reconciler.reconcile(fx.location.id).await.unwrap();
        assert_eq!(fx.available().await, 5);

        let receipt = created(lc.create(request(&fx, "P1", 2)).await.unwrap());
        assert_eq!(receipt.path, CreatePath::Fallback);
        assert_eq!(receipt.available_slots, Some(4));
        assert!(receipt.availability_persisted);
        assert_eq!(receipt.booking.status, BookingStatus::Scheduled);
        assert_eq!(receipt.booking.amount, fx.location.price_per_hour * rust_decimal::Decimal::from(2));
        assert_eq!(fx.available().await, 4);
    }

    #[tokio::test]
    async fn scenario_completion_frees_a_slot() {
        let fx = fixture(3).await;
        let lc = lifecycle(&fx);
        let b = created(lc.create(request(&fx, "P2", 1)).await.unwrap()).booking;
        lc.transition(b.id, BookingStatus::Started).await.unwrap();
        assert_eq!(fx.available().await, 2);

        let out = lc.transition(b.id, BookingStatus::Completed).await.unwrap();
        assert!(out.changed);
        assert_eq!(out.reconciliation.unwrap().available_slots, 3);
        assert_eq!(fx.available().await, 3);
    }

    #[tokio::test]
    async fn scenario_second_booking_of_a_slot_is_rejected() {
        let fx = fixture(5).await;
        let lc = lifecycle(&fx);
        let a = lc.create(request(&fx, "P3", 1));
        let b = lc.create(request(&fx, "p3", 1));
        let (a, b) = tokio::join!(a, b);

        let results = [a, b];
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let taken = results
            .iter()
            .filter(|r| matches!(r, Err(DomainError::SlotTaken { .. })))
            .count();
        assert_eq!((ok, taken), (1, 1));
        assert_eq!(fx.available().await, 4);
    }

    #[tokio::test]
    async fn concurrent_creates_never_double_book() {
        let fx = fixture(5).await;
        let lc = lifecycle(&fx);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lc = lc.clone();
                let req = request(&fx, "P4", 1);
                tokio::spawn(async move { lc.create(req).await })
            })
            .collect();

        let mut ok = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => ok += 1,
                Err(DomainError::SlotTaken { .. }) => {}
                Err(e) => panic!("unexpected error {e}"),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(fx.repos.bookings().count_active(fx.location.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_occupancy_aborts_creation() {
        let fx = fixture(5).await;
        let flaky = Arc::new(FlakyRepos::wrap(fx.repos.clone()));
        flaky.fail_occupancy(true);
        let reconciler = AvailabilityReconciler::new(flaky.clone(), fx.events.clone());
        let lc = BookingLifecycle::new(flaky, reconciler, fx.events.clone());

        let err = lc.create(request(&fx, "P1", 1)).await.unwrap_err();
        assert!(matches!(err, DomainError::Storage(_)));
        assert_eq!(fx.repos.bookings().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let fx = fixture(2).await;
        let lc = lifecycle(&fx);
        for (slot, hours) in [("", 1), ("P1", 0), ("P9", 1), ("C1", 1)] {
            assert!(matches!(
                lc.create(request(&fx, slot, hours)).await,
                Err(DomainError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn missing_profile_has_remediation_message() {
        let fx = fixture(2).await;
        let lc = lifecycle(&fx);
        let mut req = request(&fx, "P1", 1);
        req.user_id = Uuid::new_v4();
        let err = lc.create(req).await.unwrap_err();
        assert!(matches!(err, DomainError::MissingProfile { .. }));
        assert!(err.to_string().contains("sign up with a new email"));
    }

    #[tokio::test]
    async fn sample_location_yields_demo_booking() {
        let fx = fixture(2).await;
        let lc = lifecycle(&fx);
        let seed = crate::infrastructure::seed::seed_locations()
            .into_iter()
            .find(|l| l.kind == LocationKind::Ev)
            .unwrap();
        let mut req = request(&fx, "C2", 3);
        req.location_id = seed.id;

        match lc.create(req.clone()).await.unwrap() {
            BookingOutcome::Demo(b) => {
                assert_eq!(b.location_id, seed.id);
                assert_eq!(b.amount, seed.price_per_hour * rust_decimal::Decimal::from(3));
            }
            BookingOutcome::Created(_) => panic!("demo bookings are not stored"),
        }
        assert_eq!(fx.repos.bookings().count().await.unwrap(), 0);

        let strict = lifecycle(&fx).with_demo_catalogue(false);
        assert!(matches!(strict.create(req).await, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn same_status_is_a_no_op() {
        let fx = fixture(2).await;
        let lc = lifecycle(&fx);
        let b = fx.book("P1").await;
        let out = lc.transition(b.id, BookingStatus::Scheduled).await.unwrap();
        assert!(!out.changed);
        assert!(out.reconciliation.is_none());
    }

    #[tokio::test]
    async fn every_transition_reconciles() {
        let fx = fixture(4).await;
        let lc = lifecycle(&fx);
        let b = fx.book("P1").await;
        // Counter still claims full availability until something reconciles.
        assert_eq!(fx.available().await, 4);
        let out = lc.transition(b.id, BookingStatus::Started).await.unwrap();
        assert_eq!(out.reconciliation.unwrap().available_slots, 3);
        assert_eq!(fx.available().await, 3);
    }

    #[tokio::test]
    async fn permissive_policy_allows_reopening() {
        let fx = fixture(2).await;
        let lc = lifecycle(&fx);
        let b = fx.book("P1").await;
        lc.transition(b.id, BookingStatus::Cancelled).await.unwrap();
        assert_eq!(fx.available().await, 2);

        lc.transition(b.id, BookingStatus::Scheduled).await.unwrap();
        assert_eq!(fx.available().await, 1);
    }

    #[tokio::test]
    async fn strict_policy_rejects_illegal_edges() {
        let fx = fixture(2).await;
        let lc = lifecycle(&fx).with_policy(TransitionPolicy::Strict);
        let b = fx.book("P1").await;
        assert!(matches!(
            lc.transition(b.id, BookingStatus::Completed).await,
            Err(DomainError::Conflict(_))
        ));
        lc.transition(b.id, BookingStatus::Started).await.unwrap();
        lc.transition(b.id, BookingStatus::Completed).await.unwrap();
        for next in [BookingStatus::Scheduled, BookingStatus::Started, BookingStatus::Cancelled] {
            assert!(lc.transition(b.id, next).await.is_err());
        }
        assert_eq!(fx.available().await, 2);
    }

    #[tokio::test]
    async fn failed_counter_write_does_not_fail_the_booking() {
        let fx = fixture(3).await;
        let flaky = Arc::new(FlakyRepos::wrap(fx.repos.clone()));
        flaky.fail_writes(true);
        let reconciler = AvailabilityReconciler::new(flaky.clone(), fx.events.clone())
            .with_retry(RetryConfig::none());
        let lc = BookingLifecycle::new(flaky, reconciler, fx.events.clone());

        let receipt = created(lc.create(request(&fx, "P1", 1)).await.unwrap());
        assert!(!receipt.availability_persisted);
        assert_eq!(receipt.available_slots, Some(2));
        assert_eq!(fx.repos.bookings().count_active(fx.location.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn creation_publishes_booking_insert() {
        let fx = fixture(3).await;
        let lc = lifecycle(&fx);
        let mut sub = fx.events.subscribe();
        let receipt = created(lc.create(request(&fx, "P1", 1)).await.unwrap());

        let mut saw_insert = false;
        while let Ok(Ok(msg)) =
            tokio::time::timeout(std::time::Duration::from_millis(50), sub.recv()).await
        {
            if msg.event.table == Table::Bookings && msg.event.op == ChangeOp::Insert {
                assert_eq!(msg.event.row_id, receipt.booking.id);
                saw_insert = true;
            }
        }
        assert!(saw_insert);
    }

    #[tokio::test]
    async fn tickets_are_private_to_driver_owner_and_admin() {
        use crate::application::services::testing::profile;
        use crate::domain::access::SessionRole;
        use crate::domain::{ApprovalStatus, UserRole};

        let fx = fixture(3).await;
        let lc = lifecycle(&fx);
        let b = created(lc.create(request(&fx, "P2", 1)).await.unwrap()).booking;

        let as_actor = |p: &crate::domain::UserProfile| Actor {
            user_id: p.id,
            session: SessionRole {
                role: p.role,
                approval_status: p.approval_status,
            },
        };

        let ticket = lc.ticket(as_actor(&fx.user), b.id).await.unwrap();
        assert_eq!(ticket.booking.barcode_value(), b.id.to_string());
        assert_eq!(ticket.location_name.as_deref(), Some(fx.location.name.as_str()));

        let stranger = profile("other@example.com", UserRole::User, ApprovalStatus::None);
        assert!(matches!(
            lc.ticket(as_actor(&stranger), b.id).await,
            Err(DomainError::NotFound { .. })
        ));

        let admin = profile("root@example.com", UserRole::Admin, ApprovalStatus::None);
        assert!(lc.ticket(as_actor(&admin), b.id).await.is_ok());

        assert_eq!(lc.mine(fx.user.id).await.unwrap().len(), 1);
        assert!(lc.mine(stranger.id).await.unwrap().is_empty());
    }
}
