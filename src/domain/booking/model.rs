//! Booking domain entity and its status state machine

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::location::Location;
use crate::domain::slot::SlotId;
use crate::domain::{DomainError, DomainResult};

/// Booking status
///
/// `Scheduled → Started → Completed`, with `Cancelled` reachable from
/// either active state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum BookingStatus {
    Scheduled,
    Started,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Scheduled, BookingStatus::Started];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Started => "Started",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Some(Self::Scheduled),
            "started" => Some(Self::Started),
            "completed" => Some(Self::Completed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Active bookings hold a slot.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Started)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Edges of the state machine.
    pub fn successors(&self) -> &'static [BookingStatus] {
        match self {
            Self::Scheduled => &[Self::Started, Self::Cancelled],
            Self::Started => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        self.successors().contains(&next)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the lifecycle controller treats edges outside the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Any edge is accepted (owner/admin override); reconciliation still runs.
    #[default]
    Permissive,
    /// Only state machine edges are accepted.
    Strict,
}

impl TransitionPolicy {
    pub fn permits(&self, from: BookingStatus, to: BookingStatus) -> bool {
        match self {
            Self::Permissive => true,
            Self::Strict => from.can_transition_to(to),
        }
    }
}

/// A driver's reservation of one slot at one location
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    /// Also the barcode value
    pub id: Uuid,
    pub location_id: Uuid,
    pub user_id: Uuid,
    pub selected_slot: SlotId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_hours: u32,
    pub amount: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Price and schedule a new booking at `location`.
    pub fn schedule(
        location: &Location,
        user_id: Uuid,
        selected_slot: SlotId,
        start_time: DateTime<Utc>,
        duration_hours: u32,
    ) -> DomainResult<Self> {
        if duration_hours == 0 {
            return Err(DomainError::Validation(
                "Duration must be at least one hour".into(),
            ));
        }
        if !selected_slot.belongs_to(location.kind, location.total_slots) {
            return Err(DomainError::Validation(format!(
                "Slot {} does not exist at {}",
                selected_slot, location.name
            )));
        }

        let amount = location
            .price_per_hour
            .checked_mul(Decimal::from(duration_hours))
            .ok_or_else(|| DomainError::Validation("Booking amount is out of range".into()))?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            location_id: location.id,
            user_id,
            selected_slot,
            start_time,
            end_time: start_time + Duration::hours(i64::from(duration_hours)),
            duration_hours,
            amount,
            status: BookingStatus::Scheduled,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Value encoded in the access barcode
    pub fn barcode_value(&self) -> String {
        self.id.to_string()
    }
}

/// A booking joined with the names shown in owner and admin listings
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDetails {
    pub booking: Booking,
    pub location_name: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// Result of the atomic create-booking procedure
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedBooking {
    pub booking: Booking,
    pub available_slots: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::location::{LocationKind, NewLocation};

    fn location(kind: LocationKind, total: u32, price: i64) -> Location {
        Location::new(
            Uuid::new_v4(),
            None,
            NewLocation {
                name: "Andheri EV Station".into(),
                address: "Andheri West link road".into(),
                city: "Mumbai".into(),
                kind,
                price_per_hour: Decimal::from(price),
                total_slots: total,
                description: None,
                image_url: None,
            },
        )
    }

    #[test]
    fn schedule_prices_and_times_the_booking() {
        let loc = location(LocationKind::Ev, 6, 70);
        let start = Utc::now();
        let b = Booking::schedule(&loc, Uuid::new_v4(), SlotId::parse("c3").unwrap(), start, 3)
            .unwrap();
        assert_eq!(b.status, BookingStatus::Scheduled);
        assert_eq!(b.amount, Decimal::from(210));
        assert_eq!(b.end_time - b.start_time, Duration::hours(3));
        assert_eq!(b.selected_slot.as_str(), "C3");
        assert_eq!(b.barcode_value(), b.id.to_string());
    }

    #[test]
    fn schedule_rejects_zero_duration_and_foreign_slots() {
        let loc = location(LocationKind::Parking, 2, 30);
        let user = Uuid::new_v4();
        assert!(Booking::schedule(&loc, user, SlotId::parse("P1").unwrap(), Utc::now(), 0).is_err());
        assert!(Booking::schedule(&loc, user, SlotId::parse("P3").unwrap(), Utc::now(), 1).is_err());
        assert!(Booking::schedule(&loc, user, SlotId::parse("C1").unwrap(), Utc::now(), 1).is_err());
    }

    #[test]
    fn state_machine_edges() {
        use BookingStatus::*;
        assert!(Scheduled.can_transition_to(Started));
        assert!(Started.can_transition_to(Completed));
        assert!(Scheduled.can_transition_to(Cancelled));
        assert!(Started.can_transition_to(Cancelled));
        assert!(!Scheduled.can_transition_to(Completed));
        assert!(Completed.successors().is_empty());
        assert!(Cancelled.successors().is_empty());
    }

    #[test]
    fn only_scheduled_and_started_are_active() {
        use BookingStatus::*;
        assert!(Scheduled.is_active() && Started.is_active());
        assert!(!Completed.is_active() && !Cancelled.is_active());
        assert!(Completed.is_terminal() && Cancelled.is_terminal());
    }

    #[test]
    fn policy_gates_illegal_edges_only_when_strict() {
        use BookingStatus::*;
        assert!(TransitionPolicy::Permissive.permits(Completed, Scheduled));
        assert!(!TransitionPolicy::Strict.permits(Completed, Scheduled));
        assert!(TransitionPolicy::Strict.permits(Scheduled, Started));
    }

    #[test]
    fn status_parsing_is_lenient_on_case() {
        assert_eq!(BookingStatus::parse("started"), Some(BookingStatus::Started));
        assert_eq!(BookingStatus::parse("Canceled"), Some(BookingStatus::Cancelled));
        assert_eq!(BookingStatus::parse("active"), None);
    }
}
