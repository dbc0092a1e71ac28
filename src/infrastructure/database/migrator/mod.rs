//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users;
mod m20250101_000002_create_owner_profiles;
mod m20250101_000003_create_locations;
mod m20250101_000004_create_bookings;
mod m20250101_000005_add_active_slot_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users::Migration),
            Box::new(m20250101_000002_create_owner_profiles::Migration),
            Box::new(m20250101_000003_create_locations::Migration),
            Box::new(m20250101_000004_create_bookings::Migration),
            Box::new(m20250101_000005_add_active_slot_index::Migration),
        ]
    }
}
