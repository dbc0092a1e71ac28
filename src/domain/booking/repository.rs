//! Booking repository interface

use async_trait::async_trait;
use uuid::Uuid;

use super::model::{Booking, BookingDetails, BookingStatus, CreatedBooking};
use crate::domain::{DomainError, DomainResult};

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a booking.
    ///
    /// Fails with `MissingProfile` / `MissingLocation` on broken references
    /// and with `SlotTaken` when another active booking holds the slot.
    async fn insert(&self, booking: Booking) -> DomainResult<()>;

    /// `create_booking` procedure: insert the booking and recompute the
    /// location's availability in one atomic step.
    async fn create_and_reconcile(&self, _booking: Booking) -> DomainResult<CreatedBooking> {
        Err(DomainError::ProcedureUnavailable("create_booking"))
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Booking>>;

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> DomainResult<()>;

    /// `get_occupied_slots` procedure: raw `selected_slot` values of the
    /// active bookings at a location.
    async fn occupied_slots(&self, location_id: Uuid) -> DomainResult<Vec<Option<String>>>;

    async fn count_active(&self, location_id: Uuid) -> DomainResult<u64>;

    /// Newest first
    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<BookingDetails>>;

    async fn list_for_locations(&self, location_ids: &[Uuid]) -> DomainResult<Vec<BookingDetails>>;

    async fn list_all(&self, status: Option<BookingStatus>) -> DomainResult<Vec<BookingDetails>>;

    /// Returns the number of deleted rows
    async fn delete_for_locations(&self, location_ids: &[Uuid]) -> DomainResult<u64>;

    async fn count(&self) -> DomainResult<u64>;
}
