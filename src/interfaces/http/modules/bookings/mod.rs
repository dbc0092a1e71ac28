//! Driver area: booking creation, own bookings and barcode tickets

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
