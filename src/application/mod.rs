//! Application layer: use cases over the domain ports

pub mod events;
pub mod identity;
pub mod services;
pub mod slots;
pub mod sync;

pub use events::{create_change_bus, ChangeBus, ChangeEvent, ChangeFilter, SharedChangeBus};
pub use identity::{AuthContext, AuthService, SessionStore};
pub use services::{
    AdminService, AvailabilityReconciler, BookingLifecycle, LocationService,
};
pub use slots::OccupancyResolver;
pub use sync::{SyncTrigger, WatchedSubscription};
