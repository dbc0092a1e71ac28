//! At most one active booking per (location, slot)
//!
//! Partial unique index; the statement is valid on both SQLite and
//! PostgreSQL.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_bookings_active_slot \
                 ON bookings (location_id, selected_slot) \
                 WHERE status IN ('Scheduled', 'Started')",
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS uq_bookings_active_slot")
            .await?;
        Ok(())
    }
}
