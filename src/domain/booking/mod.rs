//! Booking aggregate
//!
//! Contains the Booking entity, its status state machine and the
//! repository interface (including the atomic create procedure).

pub mod model;
pub mod repository;

pub use model::{Booking, BookingDetails, BookingStatus, CreatedBooking, TransitionPolicy};
pub use repository::BookingRepository;
