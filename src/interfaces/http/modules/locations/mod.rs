//! Public location catalogue: listing, detail and slot grid

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
