pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_users;
mod m20250601_000002_create_parking_lots;
mod m20250601_000003_create_parking_spaces;
mod m20250601_000004_create_parking_entrances;
mod m20250601_000005_create_bookings;
mod m20250601_000006_create_reviews;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_users::Migration),
            Box::new(m20250601_000002_create_parking_lots::Migration),
            Box::new(m20250601_000003_create_parking_spaces::Migration),
            Box::new(m20250601_000004_create_parking_entrances::Migration),
            Box::new(m20250601_000005_create_bookings::Migration),
            Box::new(m20250601_000006_create_reviews::Migration),
        ]
    }
}
