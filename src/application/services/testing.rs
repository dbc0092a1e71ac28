//! Shared fixtures for service tests

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::availability::AvailabilityReconciler;
use crate::application::events::{create_change_bus, SharedChangeBus};
use crate::domain::{
    ApprovalStatus, Booking, BookingDetails, BookingRepository, BookingStatus, CreatedBooking,
    DomainError, DomainResult, Location, LocationKind, LocationQuery, LocationRepository,
    NewLocation, NewUser, RepositoryProvider, SlotId, UserProfile, UserRepository, UserRole,
};
use crate::infrastructure::storage::InMemoryRepositoryProvider;
use crate::shared::retry::RetryConfig;

pub(crate) struct Fixture {
    pub repos: Arc<dyn RepositoryProvider>,
    pub events: SharedChangeBus,
    pub reconciler: AvailabilityReconciler,
    pub location: Location,
    pub user: UserProfile,
}

impl Fixture {
    /// Insert an active booking directly, bypassing the lifecycle.
    pub async fn book(&self, slot: &str) -> Booking {
        let booking = Booking::schedule(
            &self.location,
            self.user.id,
            SlotId::parse(slot).expect("slot"),
            Utc::now(),
            2,
        )
        .expect("valid booking");
        self.repos
            .bookings()
            .insert(booking.clone())
            .await
            .expect("insert booking");
        booking
    }

    pub async fn available(&self) -> u32 {
        self.repos
            .locations()
            .find_by_id(self.location.id)
            .await
            .expect("read")
            .expect("location")
            .available_slots
    }
}

pub(crate) fn parking(total_slots: u32, owner_id: Option<Uuid>) -> Location {
    Location::new(
        Uuid::new_v4(),
        owner_id,
        NewLocation {
            name: "Powai Lake Parking".into(),
            address: "Powai Promenade".into(),
            city: "Mumbai".into(),
            kind: LocationKind::Parking,
            price_per_hour: Decimal::from(35),
            total_slots,
            description: None,
            image_url: None,
        },
    )
}

pub(crate) fn profile(email: &str, role: UserRole, approval_status: ApprovalStatus) -> UserProfile {
    UserProfile::new(NewUser {
        email: email.into(),
        name: email.split('@').next().unwrap_or("user").into(),
        role,
        approval_status,
        password_hash: "not-a-hash".into(),
    })
}

pub(crate) async fn fixture(total_slots: u32) -> Fixture {
    let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
    let events = create_change_bus();
    let user = profile("driver@example.com", UserRole::User, ApprovalStatus::None);
    repos.users().create(user.clone()).await.expect("user");
    let location = parking(total_slots, None);
    repos
        .locations()
        .insert(location.clone())
        .await
        .expect("location");

    Fixture {
        reconciler: AvailabilityReconciler::new(repos.clone(), events.clone())
            .with_retry(RetryConfig::none()),
        repos,
        events,
        location,
        user,
    }
}

/// Provider wrapper that injects storage failures.
pub(crate) struct FlakyRepos {
    inner: Arc<dyn RepositoryProvider>,
    fail_writes: AtomicBool,
    fail_next_writes: AtomicU32,
    fail_occupancy: AtomicBool,
    legacy_rows: Mutex<Option<Vec<Option<String>>>>,
}

impl FlakyRepos {
    pub fn wrap(inner: Arc<dyn RepositoryProvider>) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
            fail_next_writes: AtomicU32::new(0),
            fail_occupancy: AtomicBool::new(false),
            legacy_rows: Mutex::new(None),
        }
    }

    /// Every availability write fails while set.
    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    /// The next `n` availability writes fail.
    pub fn fail_next_writes(&self, n: u32) {
        self.fail_next_writes.store(n, Ordering::SeqCst);
    }

    pub fn fail_occupancy(&self, on: bool) {
        self.fail_occupancy.store(on, Ordering::SeqCst);
    }

    /// Serve these raw `selected_slot` values as the active bookings of
    /// every location, as rows written before slot uniqueness existed.
    pub fn serve_legacy_rows(&self, rows: Vec<Option<String>>) {
        *self.legacy_rows.lock().expect("lock") = Some(rows);
    }

    fn outage() -> DomainError {
        DomainError::Storage("connection reset by peer".into())
    }
}

impl RepositoryProvider for FlakyRepos {
    fn locations(&self) -> &dyn LocationRepository {
        self
    }

    fn bookings(&self) -> &dyn BookingRepository {
        self
    }

    fn users(&self) -> &dyn UserRepository {
        self.inner.users()
    }
}

#[async_trait]
impl LocationRepository for FlakyRepos {
    async fn insert(&self, location: Location) -> DomainResult<()> {
        self.inner.locations().insert(location).await
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Location>> {
        self.inner.locations().find_by_id(id).await
    }

    async fn update(&self, location: Location) -> DomainResult<()> {
        self.inner.locations().update(location).await
    }

    async fn set_available_slots(&self, id: Uuid, available_slots: u32) -> DomainResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        let pending = self.fail_next_writes.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_next_writes.store(pending - 1, Ordering::SeqCst);
            return Err(Self::outage());
        }
        self.inner
            .locations()
            .set_available_slots(id, available_slots)
            .await
    }

    async fn list(&self, query: LocationQuery) -> DomainResult<Vec<Location>> {
        self.inner.locations().list(query).await
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        self.inner.locations().delete(id).await
    }

    async fn count(&self) -> DomainResult<u64> {
        self.inner.locations().count().await
    }
}

#[async_trait]
impl BookingRepository for FlakyRepos {
    async fn insert(&self, booking: Booking) -> DomainResult<()> {
        self.inner.bookings().insert(booking).await
    }

    async fn create_and_reconcile(&self, booking: Booking) -> DomainResult<CreatedBooking> {
        self.inner.bookings().create_and_reconcile(booking).await
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Booking>> {
        self.inner.bookings().find_by_id(id).await
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> DomainResult<()> {
        self.inner.bookings().update_status(id, status).await
    }

    async fn occupied_slots(&self, location_id: Uuid) -> DomainResult<Vec<Option<String>>> {
        if self.fail_occupancy.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        if let Some(rows) = self.legacy_rows.lock().expect("lock").clone() {
            return Ok(rows);
        }
        self.inner.bookings().occupied_slots(location_id).await
    }

    async fn count_active(&self, location_id: Uuid) -> DomainResult<u64> {
        self.inner.bookings().count_active(location_id).await
    }

    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<BookingDetails>> {
        self.inner.bookings().list_for_user(user_id).await
    }

    async fn list_for_locations(&self, location_ids: &[Uuid]) -> DomainResult<Vec<BookingDetails>> {
        self.inner.bookings().list_for_locations(location_ids).await
    }

    async fn list_all(&self, status: Option<BookingStatus>) -> DomainResult<Vec<BookingDetails>> {
        self.inner.bookings().list_all(status).await
    }

    async fn delete_for_locations(&self, location_ids: &[Uuid]) -> DomainResult<u64> {
        self.inner.bookings().delete_for_locations(location_ids).await
    }

    async fn count(&self) -> DomainResult<u64> {
        self.inner.bookings().count().await
    }
}
