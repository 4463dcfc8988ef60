use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_users_table::Users;
use crate::m20250301_000003_create_slots_table::Slots;

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
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::UserId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::LocationId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::SlotId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::VehicleType).string().not_null())
                    .col(ColumnDef::new(Bookings::VehicleNumber).string().not_null())
                    .col(ColumnDef::new(Bookings::BookingTime).timestamp().not_null())
                    .col(ColumnDef::new(Bookings::StartTime).timestamp().not_null())
                    .col(ColumnDef::new(Bookings::EndTime).timestamp().not_null())
                    .col(ColumnDef::new(Bookings::DurationHours).integer().not_null())
                    .col(ColumnDef::new(Bookings::TotalAmount).decimal().not_null())
                    .col(
                        ColumnDef::new(Bookings::PaymentStatus)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Bookings::PaymentMethod)
                            .string()
                            .not_null()
                            .default("upi"),
                    )
                    .col(ColumnDef::new(Bookings::TransactionId).string().null())
                    .col(ColumnDef::new(Bookings::QrCode).text().not_null())
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Bookings::CheckInTime).timestamp().null())
                    .col(ColumnDef::new(Bookings::CheckOutTime).timestamp().null())
                    .col(ColumnDef::new(Bookings::IdempotencyKey).string().null())
                    .col(ColumnDef::new(Bookings::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Bookings::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_user")
                            .from(Bookings::Table, Bookings::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_slot")
                            .from(Bookings::Table, Bookings::SlotId)
                            .to(Slots::Table, Slots::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bookings_user_created")
                    .table(Bookings::Table)
                    .col(Bookings::UserId)
                    .col(Bookings::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bookings_location_slot")
                    .table(Bookings::Table)
                    .col(Bookings::LocationId)
                    .col(Bookings::SlotId)
                    .to_owned(),
            )
            .await?;

        // Replayed payment attempts resolve to the original booking
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bookings_user_idempotency")
                    .table(Bookings::Table)
                    .col(Bookings::UserId)
                    .col(Bookings::IdempotencyKey)
                    .unique()
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

#[derive(DeriveIden)]
pub enum Bookings {
    Table,
    Id,
    UserId,
    LocationId,
    SlotId,
    VehicleType,
    VehicleNumber,
    BookingTime,
    StartTime,
    EndTime,
    DurationHours,
    TotalAmount,
    PaymentStatus,
    PaymentMethod,
    TransactionId,
    QrCode,
    Status,
    CheckInTime,
    CheckOutTime,
    IdempotencyKey,
    CreatedAt,
    UpdatedAt,
}
