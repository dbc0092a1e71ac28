//! Row-change events
//!
//! Every durable write to a location, booking or profile is published as a
//! `ChangeEvent`. Subscribers scope what they receive with a `ChangeFilter`,
//! the same way a realtime channel is keyed by table and row filter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{Booking, Location};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Locations,
    Bookings,
    Users,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Locations => "locations",
            Table::Bookings => "bookings",
            Table::Users => "users",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub op: ChangeOp,
    pub row_id: Uuid,
    /// Location the row belongs to (the row itself for `locations`)
    pub location_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    /// Snapshot of the changed columns
    #[serde(default)]
    pub record: serde_json::Value,
}

impl ChangeEvent {
    pub fn location(op: ChangeOp, location: &Location) -> Self {
        Self {
            table: Table::Locations,
            op,
            row_id: location.id,
            location_id: Some(location.id),
            owner_id: location.owner_id,
            user_id: None,
            record: json!({
                "name": location.name,
                "kind": location.kind,
                "total_slots": location.total_slots,
                "available_slots": location.available_slots,
            }),
        }
    }

    /// Availability counter written by reconciliation
    pub fn availability(location_id: Uuid, owner_id: Option<Uuid>, available_slots: u32) -> Self {
        Self {
            table: Table::Locations,
            op: ChangeOp::Update,
            row_id: location_id,
            location_id: Some(location_id),
            owner_id,
            user_id: None,
            record: json!({ "available_slots": available_slots }),
        }
    }

    pub fn location_deleted(location_id: Uuid, owner_id: Option<Uuid>) -> Self {
        Self {
            table: Table::Locations,
            op: ChangeOp::Delete,
            row_id: location_id,
            location_id: Some(location_id),
            owner_id,
            user_id: None,
            record: serde_json::Value::Null,
        }
    }

    pub fn booking(op: ChangeOp, booking: &Booking, owner_id: Option<Uuid>) -> Self {
        Self {
            table: Table::Bookings,
            op,
            row_id: booking.id,
            location_id: Some(booking.location_id),
            owner_id,
            user_id: Some(booking.user_id),
            record: json!({
                "selected_slot": booking.selected_slot,
                "status": booking.status,
                "start_time": booking.start_time,
                "end_time": booking.end_time,
            }),
        }
    }

    pub fn user(op: ChangeOp, user_id: Uuid) -> Self {
        Self {
            table: Table::Users,
            op,
            row_id: user_id,
            location_id: None,
            owner_id: None,
            user_id: Some(user_id),
            record: serde_json::Value::Null,
        }
    }
}

/// Subscription scope. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeFilter {
    pub table: Option<Table>,
    pub op: Option<ChangeOp>,
    pub location_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

impl ChangeFilter {
    pub fn table(table: Table) -> Self {
        Self {
            table: Some(table),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location_id: Uuid) -> Self {
        self.location_id = Some(location_id);
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        fn field<T: PartialEq>(want: &Option<T>, got: Option<&T>) -> bool {
            match want {
                None => true,
                Some(w) => got == Some(w),
            }
        }

        field(&self.table, Some(&event.table))
            && field(&self.op, Some(&event.op))
            && field(&self.location_id, event.location_id.as_ref())
            && field(&self.owner_id, event.owner_id.as_ref())
            && field(&self.user_id, event.user_id.as_ref())
    }
}

/// Wrapper for sending events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: ChangeEvent,
}

impl ChangeMessage {
    pub fn new(event: ChangeEvent) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking_event(location_id: Uuid, user_id: Uuid) -> ChangeEvent {
        ChangeEvent {
            table: Table::Bookings,
            op: ChangeOp::Insert,
            row_id: Uuid::new_v4(),
            location_id: Some(location_id),
            owner_id: None,
            user_id: Some(user_id),
            record: serde_json::Value::Null,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let e = booking_event(Uuid::new_v4(), Uuid::new_v4());
        assert!(ChangeFilter::default().matches(&e));
    }

    #[test]
    fn filter_scopes_by_table_and_row() {
        let loc = Uuid::new_v4();
        let e = booking_event(loc, Uuid::new_v4());
        assert!(ChangeFilter::table(Table::Bookings).with_location(loc).matches(&e));
        assert!(!ChangeFilter::table(Table::Locations).matches(&e));
        assert!(!ChangeFilter::default().with_location(Uuid::new_v4()).matches(&e));
        assert!(!ChangeFilter {
            owner_id: Some(Uuid::new_v4()),
            ..Default::default()
        }
        .matches(&e));
    }

    #[test]
    fn message_serializes_flat() {
        let msg = ChangeMessage::new(ChangeEvent::user(ChangeOp::Delete, Uuid::nil()));
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["table"], "users");
        assert_eq!(v["op"], "DELETE");
        assert!(v["id"].is_string());
    }
}
