use sea_orm_migration::{prelude::*, schema::*};

use super::m20250601_000002_create_parking_lots::ParkingLot;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingSpace::Table)
                    .if_not_exists()
                    .col(uuid(ParkingSpace::Id).primary_key())
                    .col(uuid(ParkingSpace::LotId).not_null())
                    .col(string_len(ParkingSpace::SpaceNumber, 20).not_null())
                    .col(integer(ParkingSpace::X).not_null())
                    .col(integer(ParkingSpace::Y).not_null())
                    .col(integer(ParkingSpace::Rotation).not_null().default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parking_space_lot")
                            .from(ParkingSpace::Table, ParkingSpace::LotId)
                            .to(ParkingLot::Table, ParkingLot::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Space numbers are unique within a lot
        manager
            .create_index(
                Index::create()
                    .name("idx_parking_space_lot_number")
                    .table(ParkingSpace::Table)
                    .col(ParkingSpace::LotId)
                    .col(ParkingSpace::SpaceNumber)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingSpace::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ParkingSpace {
    Table,
    Id,
    LotId,
    SpaceNumber,
    X,
    Y,
    Rotation,
}
