//! Location domain entity

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::slot::{slot_ids, SlotId};
use crate::domain::{DomainError, DomainResult};

/// Upper bound on an hourly price. Any booking amount under it fits the
/// stores' minor-unit columns.
pub const MAX_PRICE_PER_HOUR: i64 = 10_000_000;

/// Prices are whole paise: at most two decimal places, never negative.
pub fn validate_price(price: Decimal) -> DomainResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(DomainError::Validation(
            "Price per hour cannot be negative".into(),
        ));
    }
    if price.normalize().scale() > 2 {
        return Err(DomainError::Validation(
            "Price per hour can have at most two decimal places".into(),
        ));
    }
    if price > Decimal::from(MAX_PRICE_PER_HOUR) {
        return Err(DomainError::Validation(format!(
            "Price per hour cannot exceed {MAX_PRICE_PER_HOUR}"
        )));
    }
    Ok(())
}

/// What a location offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Parking,
    Ev,
}

impl LocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parking => "parking",
            Self::Ev => "ev",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parking" => Some(Self::Parking),
            "ev" => Some(Self::Ev),
            _ => None,
        }
    }

    /// `C` for chargers, `P` for parking bays
    pub fn slot_prefix(&self) -> &'static str {
        match self {
            Self::Ev => "C",
            Self::Parking => "P",
        }
    }
}

impl std::fmt::Display for LocationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bookable site
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub id: Uuid,
    /// `None` for catalogue (seed) locations
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub address: String,
    pub city: String,
    pub kind: LocationKind,
    pub price_per_hour: Decimal,
    pub total_slots: u32,
    /// Always within `0..=total_slots`
    pub available_slots: u32,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when an owner lists a new location
#[derive(Debug, Clone)]
pub struct NewLocation {
    pub name: String,
    pub address: String,
    pub city: String,
    pub kind: LocationKind,
    pub price_per_hour: Decimal,
    pub total_slots: u32,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Partial edit of a location. `available_slots` is never edited directly.
#[derive(Debug, Clone, Default)]
pub struct LocationPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub kind: Option<LocationKind>,
    pub price_per_hour: Option<Decimal>,
    pub total_slots: Option<u32>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Listing filter
#[derive(Debug, Clone, Default)]
pub struct LocationQuery {
    pub kind: Option<LocationKind>,
    pub city: Option<String>,
    /// Case-insensitive substring over name, address and city
    pub search: Option<String>,
    pub owner_id: Option<Uuid>,
}

impl Location {
    /// A freshly listed location starts fully available.
    pub fn new(id: Uuid, owner_id: Option<Uuid>, new: NewLocation) -> Self {
        let now = Utc::now();
        Self {
            id,
            owner_id,
            name: new.name,
            address: new.address,
            city: new.city,
            kind: new.kind,
            price_per_hour: new.price_per_hour,
            total_slots: new.total_slots,
            available_slots: new.total_slots,
            description: new.description,
            image_url: new.image_url,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: LocationPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(city) = patch.city {
            self.city = city;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(price) = patch.price_per_hour {
            self.price_per_hour = price;
        }
        if let Some(total) = patch.total_slots {
            self.total_slots = total;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if patch.image_url.is_some() {
            self.image_url = patch.image_url;
        }
        self.available_slots = self.available_slots.min(self.total_slots);
        self.updated_at = Utc::now();
    }

    /// Number of chargers; zero for parking sites.
    pub fn ev_chargers(&self) -> u32 {
        match self.kind {
            LocationKind::Ev => self.total_slots,
            LocationKind::Parking => 0,
        }
    }

    pub fn slot_ids(&self) -> Vec<SlotId> {
        slot_ids(self.kind, self.total_slots)
    }

    pub fn is_sold_out(&self) -> bool {
        self.available_slots == 0
    }

    pub fn matches(&self, query: &LocationQuery) -> bool {
        if query.kind.is_some_and(|k| k != self.kind) {
            return false;
        }
        if query.owner_id.is_some() && query.owner_id != self.owner_id {
            return false;
        }
        if let Some(city) = query.city.as_deref() {
            if !self.city.eq_ignore_ascii_case(city.trim()) {
                return false;
            }
        }
        if let Some(term) = query.search.as_deref() {
            let term = term.trim().to_lowercase();
            if !term.is_empty()
                && ![&self.name, &self.address, &self.city]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            {
                return false;
            }
        }
        true
    }
}
