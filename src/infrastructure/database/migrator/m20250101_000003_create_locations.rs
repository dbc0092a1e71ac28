//! Create locations table

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Locations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Locations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Locations::OwnerId).string())
                    .col(ColumnDef::new(Locations::Name).string().not_null())
                    .col(ColumnDef::new(Locations::Address).string().not_null())
                    .col(ColumnDef::new(Locations::City).string().not_null())
                    .col(
                        ColumnDef::new(Locations::Kind)
                            .string_len(20)
                            .not_null()
                            .default("parking"),
                    )
                    .col(
                        ColumnDef::new(Locations::PricePerHour)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Locations::TotalSlots)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Locations::AvailableSlots)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Locations::Description).text())
                    .col(ColumnDef::new(Locations::ImageUrl).string())
                    .col(
                        ColumnDef::new(Locations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Locations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_locations_owner")
                            .from(Locations::Table, Locations::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_locations_owner")
                    .table(Locations::Table)
                    .col(Locations::OwnerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Locations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Locations {
    Table,
    Id,
    OwnerId,
    Name,
    Address,
    City,
    Kind,
    PricePerHour,
    TotalSlots,
    AvailableSlots,
    Description,
    ImageUrl,
    CreatedAt,
    UpdatedAt,
}
