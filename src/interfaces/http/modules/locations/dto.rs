//! Location DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::services::Reconciliation;
use crate::application::slots::SlotGridView;
use crate::domain::{Location, LocationKind, LocationQuery};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocationDto {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub address: String,
    pub city: String,
    pub kind: LocationKind,
    /// Decimal string, e.g. `"40.00"`
    #[schema(value_type = String)]
    pub price_per_hour: Decimal,
    pub total_slots: u32,
    pub available_slots: u32,
    pub ev_chargers: u32,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Location> for LocationDto {
    fn from(l: Location) -> Self {
        Self {
            ev_chargers: l.ev_chargers(),
            id: l.id,
            owner_id: l.owner_id,
            name: l.name,
            address: l.address,
            city: l.city,
            kind: l.kind,
            price_per_hour: l.price_per_hour,
            total_slots: l.total_slots,
            available_slots: l.available_slots,
            description: l.description,
            image_url: l.image_url,
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationListParams {
    /// `parking` or `ev`
    pub kind: Option<LocationKind>,
    pub city: Option<String>,
    /// Case-insensitive match on name, address or city
    pub search: Option<String>,
}

impl From<LocationListParams> for LocationQuery {
    fn from(p: LocationListParams) -> Self {
        Self {
            kind: p.kind,
            city: p.city.filter(|c| !c.trim().is_empty()),
            search: p.search.filter(|s| !s.trim().is_empty()),
            owner_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SlotCellDto {
    pub id: String,
    pub ordinal: u32,
    pub occupied: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SlotGridDto {
    pub location_id: Uuid,
    /// When `false` occupancy could not be read and no slot should be picked
    pub occupancy_known: bool,
    pub occupied: Vec<String>,
    pub cells: Vec<SlotCellDto>,
}

impl From<SlotGridView> for SlotGridDto {
    fn from(v: SlotGridView) -> Self {
        Self {
            location_id: v.location_id,
            occupancy_known: v.occupancy_known,
            occupied: v.occupied.iter().map(ToString::to_string).collect(),
            cells: v
                .cells
                .into_iter()
                .map(|c| SlotCellDto {
                    id: c.id.to_string(),
                    ordinal: c.ordinal,
                    occupied: c.occupied,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReconciliationDto {
    pub location_id: Uuid,
    pub total_slots: u32,
    pub active_bookings: u64,
    pub available_slots: u32,
    /// `false` when the counter could not be written
    pub persisted: bool,
}

impl From<Reconciliation> for ReconciliationDto {
    fn from(r: Reconciliation) -> Self {
        Self {
            location_id: r.location_id,
            total_slots: r.total_slots,
            active_bookings: r.active_bookings,
            available_slots: r.available_slots,
            persisted: r.persisted,
        }
    }
}
