use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Listing status. Only `active` lots are visible to drivers; new lots start
/// as `pending` until an admin approves them or the owner saves a layout.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "lot_status")]
#[serde(rename_all = "lowercase")]
pub enum LotStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parking_lot")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub address: String,
    pub capacity: i32,
    pub status: LotStatus,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id"
    )]
    Owner,
    #[sea_orm(has_many = "super::parking_space::Entity")]
    Spaces,
    #[sea_orm(has_one = "super::parking_entrance::Entity")]
    Entrance,
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::parking_space::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Spaces.def()
    }
}

impl Related<super::parking_entrance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entrance.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Related;

    #[test]
    fn lot_and_owner_relations_are_reciprocal() {
        // Both directions must resolve for find_related / find_with_related.
        let _ = <Entity as Related<super::super::user::Entity>>::to();
        let _ = <super::super::user::Entity as Related<Entity>>::to();
    }
}
