use sea_orm_migration::{prelude::*, schema::*};

use super::m20250601_000001_create_users::User;
use super::m20250601_000002_create_parking_lots::ParkingLot;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Review::Table)
                    .if_not_exists()
                    .col(uuid(Review::Id).primary_key())
                    .col(uuid(Review::LotId).not_null())
                    .col(uuid(Review::UserId).not_null())
                    .col(
                        integer(Review::Rating)
                            .not_null()
                            .check(Expr::col(Review::Rating).between(1, 5)),
                    )
                    .col(text(Review::Comment).not_null())
                    .col(
                        timestamp_with_time_zone(Review::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_lot")
                            .from(Review::Table, Review::LotId)
                            .to(ParkingLot::Table, ParkingLot::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_user")
                            .from(Review::Table, Review::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Review::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Review {
    Table,
    Id,
    LotId,
    UserId,
    Rating,
    Comment,
    CreatedAt,
}
