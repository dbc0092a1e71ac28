//! Application services

mod admin;
mod availability;
mod booking_lifecycle;
mod locations;
mod sync_task;

#[cfg(test)]
pub(crate) mod testing;

pub use admin::{AdminOverview, AdminService, DeleteSummary, OwnerSummary};
pub use availability::{compute_available, AvailabilityReconciler, Reconciliation, SweepSummary};
pub use booking_lifecycle::{
    BookingLifecycle, BookingOutcome, BookingReceipt, BookingRequest, CreatePath,
    TransitionOutcome,
};
pub use locations::{LocationService, OwnerDashboard};
pub use sync_task::start_availability_sync_task;
