use sea_orm_migration::prelude::*;

use crate::m20250301_000002_create_locations_table::Locations;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Slots::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Slots::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Slots::LocationId).uuid().not_null())
                    .col(ColumnDef::new(Slots::SlotNumber).string().not_null())
                    .col(
                        ColumnDef::new(Slots::Floor)
                            .string()
                            .not_null()
                            .default("Ground"),
                    )
                    .col(ColumnDef::new(Slots::Row).string().not_null())
                    .col(ColumnDef::new(Slots::Position).integer().not_null())
                    .col(ColumnDef::new(Slots::VehicleType).string().not_null())
                    .col(ColumnDef::new(Slots::PricePerHour).decimal().not_null())
                    .col(
                        ColumnDef::new(Slots::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Slots::IsPremium)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Slots::IsHandicapped)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Slots::IsNearEntrance)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Slots::IsNearExit)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Slots::IsNearLift)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Slots::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Slots::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_slots_location")
                            .from(Slots::Table, Slots::LocationId)
                            .to(Locations::Table, Locations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One physical space per (location, slot number)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_slots_location_number")
                    .table(Slots::Table)
                    .col(Slots::LocationId)
                    .col(Slots::SlotNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_slots_location_floor")
                    .table(Slots::Table)
                    .col(Slots::LocationId)
                    .col(Slots::Floor)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Slots::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Slots {
    Table,
    Id,
    LocationId,
    SlotNumber,
    Floor,
    Row,
    Position,
    VehicleType,
    PricePerHour,
    IsAvailable,
    IsPremium,
    IsHandicapped,
    IsNearEntrance,
    IsNearExit,
    IsNearLift,
    CreatedAt,
    UpdatedAt,
}
