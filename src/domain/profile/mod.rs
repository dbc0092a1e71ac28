//! Profile aggregate
//!
//! User profiles (drivers, owners, admins), owner business profiles and
//! the repository interface.

pub mod model;
pub mod repository;

pub use model::{
    normalize_email, ApprovalStatus, NewUser, OwnerProfile, ProfileQuery, UserProfile, UserRole,
};
pub use repository::UserRepository;
