use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fixed rendering size of a space rectangle, in layout grid pixels.
pub const SPACE_WIDTH: i32 = 40;
pub const SPACE_HEIGHT: i32 = 80;

/// Spaces are fixed-size rectangles on the layout grid; only the position and
/// rotation are stored. Occupancy is never stored here: it is computed from
/// confirmed bookings at read time.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parking_space")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub lot_id: Uuid,
    pub space_number: String,
    pub x: i32,
    pub y: i32,
    pub rotation: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parking_lot::Entity",
        from = "Column::LotId",
        to = "super::parking_lot::Column::Id"
    )]
    Lot,
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::parking_lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lot.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
