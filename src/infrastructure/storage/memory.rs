//! In-memory repositories for development and testing
//!
//! All three repositories share one set of tables so that bookings can
//! check their references and join location and user names. The
//! `active_slots` index plays the role of the SQL partial unique index on
//! `(location_id, selected_slot)` for active bookings.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::{
    ApprovalStatus, Booking, BookingDetails, BookingRepository, BookingStatus, DomainError,
    DomainResult, Location, LocationQuery, LocationRepository, OwnerProfile, ProfileQuery,
    RepositoryProvider, SlotId, UserProfile, UserRepository, UserRole,
};
use crate::domain::profile::model::normalize_email;

#[derive(Default)]
struct Tables {
    locations: DashMap<Uuid, Location>,
    bookings: DashMap<Uuid, Booking>,
    users: DashMap<Uuid, UserProfile>,
    emails: DashMap<String, Uuid>,
    owner_profiles: DashMap<Uuid, OwnerProfile>,
    /// `(location, slot)` → id of the active booking holding it
    active_slots: DashMap<(Uuid, SlotId), Uuid>,
}

impl Tables {
    fn claim_slot(&self, booking: &Booking) -> DomainResult<()> {
        match self
            .active_slots
            .entry((booking.location_id, booking.selected_slot.clone()))
        {
            Entry::Occupied(holder) if *holder.get() != booking.id => Err(DomainError::SlotTaken {
                location_id: booking.location_id,
                slot: booking.selected_slot.to_string(),
            }),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(v) => {
                v.insert(booking.id);
                Ok(())
            }
        }
    }

    fn release_slot(&self, booking: &Booking) {
        self.active_slots.remove_if(
            &(booking.location_id, booking.selected_slot.clone()),
            |_, holder| *holder == booking.id,
        );
    }

    fn details(&self, booking: Booking) -> BookingDetails {
        let location_name = self
            .locations
            .get(&booking.location_id)
            .map(|l| l.name.clone());
        let (user_name, user_email) = self
            .users
            .get(&booking.user_id)
            .map(|u| (Some(u.name.clone()), Some(u.email.clone())))
            .unwrap_or((None, None));

        BookingDetails {
            booking,
            location_name,
            user_name,
            user_email,
        }
    }

    fn bookings_where(&self, pred: impl Fn(&Booking) -> bool) -> Vec<BookingDetails> {
        let mut rows: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| pred(b.value()))
            .map(|b| b.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.into_iter().map(|b| self.details(b)).collect()
    }
}

// ── Locations ───────────────────────────────────────────────────

pub struct InMemoryLocationRepository {
    tables: Arc<Tables>,
}

#[async_trait]
impl LocationRepository for InMemoryLocationRepository {
    async fn insert(&self, location: Location) -> DomainResult<()> {
        match self.tables.locations.entry(location.id) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "Location {} already exists",
                location.id
            ))),
            Entry::Vacant(v) => {
                v.insert(location);
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Location>> {
        Ok(self.tables.locations.get(&id).map(|l| l.clone()))
    }

    async fn update(&self, location: Location) -> DomainResult<()> {
        let mut existing = self
            .tables
            .locations
            .get_mut(&location.id)
            .ok_or_else(|| DomainError::not_found("Location", location.id))?;
        let available_slots = existing.available_slots.min(location.total_slots);
        *existing = Location {
            available_slots,
            updated_at: Utc::now(),
            ..location
        };
        Ok(())
    }

    async fn set_available_slots(&self, id: Uuid, available_slots: u32) -> DomainResult<()> {
        let mut existing = self
            .tables
            .locations
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Location", id))?;
        existing.available_slots = available_slots;
        existing.updated_at = Utc::now();
        Ok(())
    }

    async fn list(&self, query: LocationQuery) -> DomainResult<Vec<Location>> {
        let mut rows: Vec<Location> = self
            .tables
            .locations
            .iter()
            .filter(|l| l.matches(&query))
            .map(|l| l.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        if self.tables.bookings.iter().any(|b| b.location_id == id) {
            return Err(DomainError::Conflict(format!(
                "Location {id} still has bookings"
            )));
        }
        self.tables
            .locations
            .remove(&id)
            .ok_or_else(|| DomainError::not_found("Location", id))?;
        Ok(())
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.tables.locations.len() as u64)
    }
}

// ── Bookings ────────────────────────────────────────────────────

/// Has no atomic create procedure: callers take the fallback path.
pub struct InMemoryBookingRepository {
    tables: Arc<Tables>,
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert(&self, booking: Booking) -> DomainResult<()> {
        if !self.tables.users.contains_key(&booking.user_id) {
            return Err(DomainError::MissingProfile {
                user_id: booking.user_id,
            });
        }
        if !self.tables.locations.contains_key(&booking.location_id) {
            return Err(DomainError::MissingLocation(booking.location_id));
        }
        if booking.is_active() {
            self.tables.claim_slot(&booking)?;
        }
        self.tables.bookings.insert(booking.id, booking);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Booking>> {
        Ok(self.tables.bookings.get(&id).map(|b| b.clone()))
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> DomainResult<()> {
        let mut booking = self
            .tables
            .bookings
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Booking", id))?;

        match (booking.is_active(), status.is_active()) {
            (false, true) => self.tables.claim_slot(&booking)?,
            (true, false) => self.tables.release_slot(&booking),
            _ => {}
        }
        booking.status = status;
        booking.updated_at = Utc::now();
        Ok(())
    }

    async fn occupied_slots(&self, location_id: Uuid) -> DomainResult<Vec<Option<String>>> {
        Ok(self
            .tables
            .bookings
            .iter()
            .filter(|b| b.location_id == location_id && b.is_active())
            .map(|b| Some(b.selected_slot.to_string()))
            .collect())
    }

    async fn count_active(&self, location_id: Uuid) -> DomainResult<u64> {
        Ok(self
            .tables
            .bookings
            .iter()
            .filter(|b| b.location_id == location_id && b.is_active())
            .count() as u64)
    }

    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<BookingDetails>> {
        Ok(self.tables.bookings_where(|b| b.user_id == user_id))
    }

    async fn list_for_locations(&self, location_ids: &[Uuid]) -> DomainResult<Vec<BookingDetails>> {
        Ok(self
            .tables
            .bookings_where(|b| location_ids.contains(&b.location_id)))
    }

    async fn list_all(&self, status: Option<BookingStatus>) -> DomainResult<Vec<BookingDetails>> {
        Ok(self
            .tables
            .bookings_where(|b| status.map_or(true, |s| b.status == s)))
    }

    async fn delete_for_locations(&self, location_ids: &[Uuid]) -> DomainResult<u64> {
        let doomed: Vec<Booking> = self
            .tables
            .bookings
            .iter()
            .filter(|b| location_ids.contains(&b.location_id))
            .map(|b| b.value().clone())
            .collect();

        for booking in &doomed {
            self.tables.release_slot(booking);
            self.tables.bookings.remove(&booking.id);
        }
        Ok(doomed.len() as u64)
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.tables.bookings.len() as u64)
    }
}

// ── Profiles ────────────────────────────────────────────────────

pub struct InMemoryUserRepository {
    tables: Arc<Tables>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, profile: UserProfile) -> DomainResult<()> {
        match self.tables.emails.entry(normalize_email(&profile.email)) {
            Entry::Occupied(_) => Err(DomainError::Conflict("Email already exists".into())),
            Entry::Vacant(v) => {
                v.insert(profile.id);
                self.tables.users.insert(profile.id, profile);
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<UserProfile>> {
        Ok(self.tables.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<UserProfile>> {
        let Some(id) = self.tables.emails.get(&normalize_email(email)).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.tables.users.get(&id).map(|u| u.clone()))
    }

    async fn update(&self, profile: UserProfile) -> DomainResult<()> {
        let email = normalize_email(&profile.email);
        let previous_email = self
            .tables
            .users
            .get(&profile.id)
            .map(|u| u.email.clone())
            .ok_or_else(|| DomainError::not_found("User", profile.id))?;

        if email != previous_email {
            match self.tables.emails.entry(email.clone()) {
                Entry::Occupied(_) => {
                    return Err(DomainError::Conflict("Email already exists".into()))
                }
                Entry::Vacant(v) => {
                    v.insert(profile.id);
                }
            }
            self.tables.emails.remove(&previous_email);
        }

        if let Some(mut existing) = self.tables.users.get_mut(&profile.id) {
            existing.email = email;
            existing.name = profile.name;
            existing.role = profile.role;
            existing.approval_status = profile.approval_status;
            existing.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> DomainResult<()> {
        let mut existing = self
            .tables
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("User", id))?;
        existing.password_hash = password_hash.to_string();
        existing.updated_at = Utc::now();
        Ok(())
    }

    async fn set_role(
        &self,
        id: Uuid,
        role: UserRole,
        approval_status: ApprovalStatus,
    ) -> DomainResult<()> {
        let mut existing = self
            .tables
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("User", id))?;
        existing.role = role;
        existing.approval_status = approval_status;
        existing.updated_at = Utc::now();
        Ok(())
    }

    /// Bookings made by the user go with the profile, like an
    /// `ON DELETE CASCADE` foreign key.
    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let (_, profile) = self
            .tables
            .users
            .remove(&id)
            .ok_or_else(|| DomainError::not_found("User", id))?;
        self.tables.emails.remove(&profile.email);
        self.tables.owner_profiles.remove(&id);

        let own: Vec<Booking> = self
            .tables
            .bookings
            .iter()
            .filter(|b| b.user_id == id)
            .map(|b| b.value().clone())
            .collect();
        for booking in &own {
            self.tables.release_slot(booking);
            self.tables.bookings.remove(&booking.id);
        }
        Ok(())
    }

    async fn list(&self, query: ProfileQuery) -> DomainResult<Vec<UserProfile>> {
        let mut rows: Vec<UserProfile> = self
            .tables
            .users
            .iter()
            .filter(|u| query.matches(u.value()))
            .map(|u| u.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn count(&self, query: ProfileQuery) -> DomainResult<u64> {
        Ok(self
            .tables
            .users
            .iter()
            .filter(|u| query.matches(u.value()))
            .count() as u64)
    }

    async fn create_owner_profile(&self, profile: OwnerProfile) -> DomainResult<()> {
        if !self.tables.users.contains_key(&profile.id) {
            return Err(DomainError::MissingProfile {
                user_id: profile.id,
            });
        }
        self.tables.owner_profiles.insert(profile.id, profile);
        Ok(())
    }

    async fn find_owner_profile(&self, id: Uuid) -> DomainResult<Option<OwnerProfile>> {
        Ok(self.tables.owner_profiles.get(&id).map(|p| p.clone()))
    }

    async fn delete_owner_profile(&self, id: Uuid) -> DomainResult<()> {
        self.tables.owner_profiles.remove(&id);
        Ok(())
    }
}

// ── Provider ────────────────────────────────────────────────────

/// Repository provider over shared in-memory tables
pub struct InMemoryRepositoryProvider {
    locations: InMemoryLocationRepository,
    bookings: InMemoryBookingRepository,
    users: InMemoryUserRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        let tables = Arc::new(Tables::default());
        Self {
            locations: InMemoryLocationRepository {
                tables: tables.clone(),
            },
            bookings: InMemoryBookingRepository {
                tables: tables.clone(),
            },
            users: InMemoryUserRepository { tables },
        }
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn locations(&self) -> &dyn LocationRepository {
        &self.locations
    }

    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }

    fn users(&self) -> &dyn UserRepository {
        &self.users
    }
}
