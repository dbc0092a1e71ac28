//! Database entities module

pub mod booking;
pub mod location;
pub mod owner_profile;
pub mod user;

pub use booking::Entity as Booking;
pub use location::Entity as Location;
pub use owner_profile::Entity as OwnerProfile;
pub use user::Entity as User;
