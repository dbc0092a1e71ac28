//! Create owner_profiles table

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
                    .table(OwnerProfiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OwnerProfiles::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OwnerProfiles::CompanyName).string().not_null())
                    .col(ColumnDef::new(OwnerProfiles::City).string().not_null())
                    .col(
                        ColumnDef::new(OwnerProfiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_owner_profiles_user")
                            .from(OwnerProfiles::Table, OwnerProfiles::Id)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OwnerProfiles::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum OwnerProfiles {
    Table,
    Id,
    CompanyName,
    City,
    CreatedAt,
}
