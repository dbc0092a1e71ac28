//! # VoltPark
//!
//! Parking and EV-charging booking service. Drivers browse locations and
//! book a slot, owners list and run properties, admins approve owners and
//! moderate. Slot availability is always recomputed from active bookings.
//!
//! ## Architecture
//!
//! - **domain**: entities, the booking state machine, slot ids, access rules
//!   and repository ports
//! - **application**: booking lifecycle, availability reconciliation,
//!   identity, change events and watched subscriptions
//! - **infrastructure**: SeaORM and in-memory repositories, crypto, seed data
//! - **interfaces**: REST API (axum + Swagger) and the realtime WebSocket
//! - **server**: runtime bootstrap shared by the CLI

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use infrastructure::{
    init_database, DatabaseConfig, InMemoryRepositoryProvider, SeaOrmRepositoryProvider,
};

pub use interfaces::http::create_api_router;

pub use application::{create_change_bus, ChangeBus, ChangeEvent, SharedChangeBus};
