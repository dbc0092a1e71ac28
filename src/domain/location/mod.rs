//! Location aggregate
//!
//! A bookable parking or EV-charging site and its denormalised
//! `available_slots` counter.

pub mod model;
pub mod repository;

pub use model::{
    validate_price, Location, LocationKind, LocationPatch, LocationQuery, NewLocation,
    MAX_PRICE_PER_HOUR,
};
pub use repository::LocationRepository;
