use sea_orm_migration::prelude::*;

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
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Locations::Name).string().not_null())
                    .col(ColumnDef::new(Locations::Address).string().not_null())
                    .col(ColumnDef::new(Locations::Latitude).double().not_null())
                    .col(ColumnDef::new(Locations::Longitude).double().not_null())
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
                    .col(
                        ColumnDef::new(Locations::Floors)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Locations::Category).string().not_null())
                    .col(
                        ColumnDef::new(Locations::PricePerHourCar)
                            .decimal()
                            .not_null()
                            .default(50),
                    )
                    .col(
                        ColumnDef::new(Locations::PricePerHourBike)
                            .decimal()
                            .not_null()
                            .default(20),
                    )
                    .col(
                        ColumnDef::new(Locations::OpenTime)
                            .string()
                            .not_null()
                            .default("00:00"),
                    )
                    .col(
                        ColumnDef::new(Locations::CloseTime)
                            .string()
                            .not_null()
                            .default("23:59"),
                    )
                    .col(ColumnDef::new(Locations::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Locations::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_locations_name")
                    .table(Locations::Table)
                    .col(Locations::Name)
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

#[derive(DeriveIden)]
pub enum Locations {
    Table,
    Id,
    Name,
    Address,
    Latitude,
    Longitude,
    TotalSlots,
    AvailableSlots,
    Floors,
    Category,
    PricePerHourCar,
    PricePerHourBike,
    OpenTime,
    CloseTime,
    CreatedAt,
    UpdatedAt,
}
