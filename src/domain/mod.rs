pub mod access;
pub mod booking;
pub mod location;
pub mod profile;
pub mod repositories;
pub mod slot;

// Re-export commonly used types
pub use booking::{
    Booking, BookingDetails, BookingRepository, BookingStatus, CreatedBooking, TransitionPolicy,
};
pub use location::{
    Location, LocationKind, LocationPatch, LocationQuery, LocationRepository, NewLocation,
};
pub use profile::{
    ApprovalStatus, NewUser, OwnerProfile, ProfileQuery, UserProfile, UserRepository, UserRole,
};
pub use repositories::{DomainResult, RepositoryProvider};
pub use slot::{slot_grid, slot_id, slot_ids, OccupiedSlots, SlotCell, SlotId};

// Re-export DomainError from shared for convenience
pub use crate::shared::errors::DomainError;
