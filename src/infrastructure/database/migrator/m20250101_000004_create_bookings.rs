//! Create bookings table
//!
//! Deleting a location with bookings is refused; deleting a user removes
//! their bookings.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_users::Users;
use super::m20250101_000003_create_locations::Locations;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::LocationId).string().not_null())
                    .col(ColumnDef::new(Bookings::UserId).string().not_null())
                    .col(ColumnDef::new(Bookings::SelectedSlot).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Bookings::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::EndTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::DurationHours).integer().not_null())
                    .col(
                        ColumnDef::new(Bookings::Amount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .string_len(20)
                            .not_null()
                            .default("Scheduled"),
                    )
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_location")
                            .from(Bookings::Table, Bookings::LocationId)
                            .to(Locations::Table, Locations::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_user")
                            .from(Bookings::Table, Bookings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_location_status")
                    .table(Bookings::Table)
                    .col(Bookings::LocationId)
                    .col(Bookings::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_user")
                    .table(Bookings::Table)
                    .col(Bookings::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Bookings {
    Table,
    Id,
    LocationId,
    UserId,
    SelectedSlot,
    StartTime,
    EndTime,
    DurationHours,
    Amount,
    Status,
    CreatedAt,
    UpdatedAt,
}
