//! Owner console DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::services::OwnerDashboard;
use crate::domain::{LocationKind, LocationPatch, NewLocation};

use super::super::locations::{LocationDto, ReconciliationDto};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLocationRequest {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 300, message = "address is required"))]
    pub address: String,
    #[validate(length(min = 1, max = 100, message = "city is required"))]
    pub city: String,
    pub kind: LocationKind,
    /// Decimal string or number, e.g. `"40.00"`
    #[schema(value_type = String)]
    pub price_per_hour: Decimal,
    #[validate(range(min = 1, max = 10000, message = "total slots must be 1–10000"))]
    pub total_slots: u32,
    pub description: Option<String>,
    #[validate(url(message = "image_url must be a valid URL"))]
    pub image_url: Option<String>,
}

impl From<CreateLocationRequest> for NewLocation {
    fn from(r: CreateLocationRequest) -> Self {
        Self {
            name: r.name,
            address: r.address,
            city: r.city,
            kind: r.kind,
            price_per_hour: r.price_per_hour,
            total_slots: r.total_slots,
            description: r.description,
            image_url: r.image_url,
        }
    }
}

/// Partial edit; `available_slots` is derived and cannot be set
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLocationRequest {
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub kind: Option<LocationKind>,
    #[schema(value_type = Option<String>)]
    pub price_per_hour: Option<Decimal>,
    #[validate(range(min = 1, max = 10000, message = "total slots must be 1–10000"))]
    pub total_slots: Option<u32>,
    pub description: Option<String>,
    #[validate(url(message = "image_url must be a valid URL"))]
    pub image_url: Option<String>,
}

impl From<UpdateLocationRequest> for LocationPatch {
    fn from(r: UpdateLocationRequest) -> Self {
        Self {
            name: r.name,
            address: r.address,
            city: r.city,
            kind: r.kind,
            price_per_hour: r.price_per_hour,
            total_slots: r.total_slots,
            description: r.description,
            image_url: r.image_url,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocationUpdatedDto {
    pub location: LocationDto,
    /// Present when the slot count changed and availability was recomputed
    pub reconciliation: Option<ReconciliationDto>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OwnerDashboardDto {
    pub properties: usize,
    pub total_slots: u64,
    pub available_slots: u64,
    pub total_bookings: usize,
    pub active_bookings: usize,
    /// Sum over bookings that were not cancelled
    #[schema(value_type = String)]
    pub revenue: Decimal,
}

impl From<OwnerDashboard> for OwnerDashboardDto {
    fn from(d: OwnerDashboard) -> Self {
        Self {
            properties: d.properties,
            total_slots: d.total_slots,
            available_slots: d.available_slots,
            total_bookings: d.total_bookings,
            active_bookings: d.active_bookings,
            revenue: d.revenue,
        }
    }
}
