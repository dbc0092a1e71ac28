//! Booking DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::application::services::{BookingOutcome, CreatePath, TransitionOutcome};
use crate::domain::{Booking, BookingDetails, BookingStatus};

use super::super::locations::ReconciliationDto;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    pub location_id: Uuid,
    /// Slot id such as `P3` or `C1`; case-insensitive
    #[validate(length(min = 1, max = 16, message = "Please select a parking slot or charger."))]
    pub selected_slot: String,
    /// Defaults to now
    pub start_time: Option<DateTime<Utc>>,
    #[validate(range(min = 1, max = 720, message = "duration must be 1–720 hours"))]
    pub duration_hours: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingDto {
    pub id: Uuid,
    pub location_id: Uuid,
    pub user_id: Uuid,
    pub selected_slot: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_hours: u32,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingDto {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            location_id: b.location_id,
            user_id: b.user_id,
            selected_slot: b.selected_slot.to_string(),
            start_time: b.start_time,
            end_time: b.end_time,
            duration_hours: b.duration_hours,
            amount: b.amount,
            status: b.status,
            created_at: b.created_at,
        }
    }
}

/// Booking joined with location and driver names
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingDetailsDto {
    #[serde(flatten)]
    pub booking: BookingDto,
    pub location_name: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

impl From<BookingDetails> for BookingDetailsDto {
    fn from(d: BookingDetails) -> Self {
        Self {
            booking: d.booking.into(),
            location_name: d.location_name,
            user_name: d.user_name,
            user_email: d.user_email,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingCreatedDto {
    pub booking: BookingDto,
    /// `true` for a sample-catalogue location: nothing was stored
    pub demo: bool,
    /// `atomic` or `fallback`; absent for demo bookings
    pub path: Option<String>,
    /// Counter after the booking, when it could be computed
    pub available_slots: Option<u32>,
    /// `false` when the new counter could not be written; a later sync
    /// repairs it
    pub availability_persisted: bool,
}

impl From<BookingOutcome> for BookingCreatedDto {
    fn from(outcome: BookingOutcome) -> Self {
        match outcome {
            BookingOutcome::Created(r) => Self {
                booking: r.booking.into(),
                demo: false,
                path: Some(
                    match r.path {
                        CreatePath::Atomic => "atomic",
                        CreatePath::Fallback => "fallback",
                    }
                    .to_string(),
                ),
                available_slots: r.available_slots,
                availability_persisted: r.availability_persisted,
            },
            BookingOutcome::Demo(booking) => Self {
                booking: booking.into(),
                demo: true,
                path: None,
                available_slots: None,
                availability_persisted: false,
            },
        }
    }
}

/// Data encoded and printed on the access ticket
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BarcodeDto {
    pub booking_id: Uuid,
    /// Value to render as a CODE128 barcode
    pub barcode_value: String,
    pub format: String,
    pub location_name: Option<String>,
    pub selected_slot: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
}

impl From<BookingDetails> for BarcodeDto {
    fn from(d: BookingDetails) -> Self {
        Self {
            booking_id: d.booking.id,
            barcode_value: d.booking.barcode_value(),
            format: "CODE128".to_string(),
            location_name: d.location_name,
            selected_slot: d.booking.selected_slot.to_string(),
            start_time: d.booking.start_time,
            end_time: d.booking.end_time,
            status: d.booking.status,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusChangeRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransitionDto {
    pub booking: BookingDto,
    pub previous: BookingStatus,
    pub changed: bool,
    /// Absent when unchanged or when the recount failed
    pub reconciliation: Option<ReconciliationDto>,
}

impl From<TransitionOutcome> for TransitionDto {
    fn from(t: TransitionOutcome) -> Self {
        Self {
            booking: t.booking.into(),
            previous: t.previous,
            changed: t.changed,
            reconciliation: t.reconciliation.map(Into::into),
        }
    }
}
