//! Owner area: dashboard, properties, bookings at owned locations

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
