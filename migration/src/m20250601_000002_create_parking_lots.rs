use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20250601_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Lot status gates visibility to drivers: only active lots are listed
        manager
            .create_type(
                Type::create()
                    .as_enum(LotStatus::Enum)
                    .values([LotStatus::Pending, LotStatus::Active, LotStatus::Inactive])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ParkingLot::Table)
                    .if_not_exists()
                    .col(uuid(ParkingLot::Id).primary_key())
                    .col(uuid(ParkingLot::OwnerId).not_null())
                    .col(string_len(ParkingLot::Name, 100).not_null())
                    .col(string_len(ParkingLot::Address, 255).not_null())
                    .col(integer(ParkingLot::Capacity).not_null().default(0))
                    .col(
                        ColumnDef::new(ParkingLot::Status)
                            .custom(LotStatus::Enum)
                            .not_null(),
                    )
                    .col(
                        timestamp_with_time_zone(ParkingLot::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parking_lot_owner")
                            .from(ParkingLot::Table, ParkingLot::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingLot::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(LotStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ParkingLot {
    Table,
    Id,
    OwnerId,
    Name,
    Address,
    Capacity,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum LotStatus {
    #[sea_orm(iden = "lot_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "active")]
    Active,
    #[sea_orm(iden = "inactive")]
    Inactive,
}
