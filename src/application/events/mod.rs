//! Application events (pub/sub)
//!
//! Row-change event types and the `ChangeBus` broadcast channel that the
//! realtime transport and watched subscriptions listen on.

pub mod change_bus;
pub mod types;

pub use change_bus::{
    create_change_bus, ChangeBus, ChangeSubscriber, ReceiveError, SharedChangeBus,
};
pub use types::{ChangeEvent, ChangeFilter, ChangeMessage, ChangeOp, Table};
