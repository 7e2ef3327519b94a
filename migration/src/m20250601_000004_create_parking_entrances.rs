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
                    .table(ParkingEntrance::Table)
                    .if_not_exists()
                    .col(uuid(ParkingEntrance::Id).primary_key())
                    .col(uuid(ParkingEntrance::LotId).not_null().unique_key())
                    .col(integer(ParkingEntrance::X).not_null())
                    .col(integer(ParkingEntrance::Y).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parking_entrance_lot")
                            .from(ParkingEntrance::Table, ParkingEntrance::LotId)
                            .to(ParkingLot::Table, ParkingLot::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingEntrance::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ParkingEntrance {
    Table,
    Id,
    LotId,
    X,
    Y,
}
