use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::parking_lot::{self, LotStatus};
use crate::entities::parking_space::{self, SPACE_HEIGHT, SPACE_WIDTH};
use crate::entities::user::UserRole;
use crate::entities::parking_entrance;
use crate::error::{AppError, AppResult};
use crate::handlers::driver::{
    EntranceInfo, LocationInfo, LotSpacesResponse, ParkingLotResponse, SpaceInfo,
};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateLotRequest {
    pub name: String,
    pub address: String,
}

/// Register a new parking lot listing
///
/// New listings start as `pending`; they become visible to drivers once a
/// layout is saved or an admin approves them.
pub async fn create_parking_lot(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateLotRequest>,
) -> AppResult<Json<ParkingLotResponse>> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Lot name is required".to_string()));
    }

    let new_lot = parking_lot::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(claims.sub),
        name: Set(payload.name.trim().to_string()),
        address: Set(payload.address.clone()),
        capacity: Set(0),
        status: Set(LotStatus::Pending),
        ..Default::default()
    };

    let lot = new_lot.insert(&state.db).await?;

    Ok(Json(ParkingLotResponse {
        id: lot.id,
        name: lot.name,
        address: lot.address,
        capacity: lot.capacity,
        status: lot.status,
    }))
}

/// List the logged-in owner's lots (any status)
pub async fn my_parking_lots(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<ParkingLotResponse>>> {
    let lots = parking_lot::Entity::find()
        .filter(parking_lot::Column::OwnerId.eq(claims.sub))
        .all(&state.db)
        .await?;

    let responses: Vec<ParkingLotResponse> = lots
        .into_iter()
        .map(|l| ParkingLotResponse {
            id: l.id,
            name: l.name,
            address: l.address,
            capacity: l.capacity,
            status: l.status,
        })
        .collect();

    Ok(Json(responses))
}

// ============ Layout Persistence ============

#[derive(Debug, Deserialize)]
pub struct SpaceLayout {
    pub space_number: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub rotation: i32,
}

#[derive(Debug, Deserialize)]
pub struct EntrancePosition {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceLayoutRequest {
    pub spaces: Vec<SpaceLayout>,
    pub entrance: EntrancePosition,
}

fn find_duplicate_space_number(spaces: &[SpaceLayout]) -> Option<&str> {
    let mut seen = HashSet::new();
    spaces
        .iter()
        .find(|s| !seen.insert(s.space_number.as_str()))
        .map(|s| s.space_number.as_str())
}

/// Replace a lot's layout: destructive-then-recreate in one transaction
///
/// Deletes every existing space (bookings cascade with them) and the
/// entrance, inserts the new set, and updates capacity and status. Partial
/// replacement is impossible: any failure rolls the whole transaction back.
pub async fn replace_layout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(lot_id): Path<Uuid>,
    Json(payload): Json<ReplaceLayoutRequest>,
) -> AppResult<Json<LotSpacesResponse>> {
    let lot = parking_lot::Entity::find_by_id(lot_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Parking lot not found".to_string()))?;

    if lot.owner_id != claims.sub && claims.role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "You can only edit your own parking lots".to_string(),
        ));
    }

    if payload.spaces.is_empty() {
        return Err(AppError::BadRequest(
            "Layout must contain at least one space".to_string(),
        ));
    }

    if let Some(number) = find_duplicate_space_number(&payload.spaces) {
        return Err(AppError::BadRequest(format!(
            "Duplicate space number: {}",
            number
        )));
    }

    let capacity = payload.spaces.len() as i32;

    let txn = state.db.begin().await?;

    parking_space::Entity::delete_many()
        .filter(parking_space::Column::LotId.eq(lot.id))
        .exec(&txn)
        .await?;

    parking_entrance::Entity::delete_many()
        .filter(parking_entrance::Column::LotId.eq(lot.id))
        .exec(&txn)
        .await?;

    let new_spaces: Vec<parking_space::ActiveModel> = payload
        .spaces
        .iter()
        .map(|s| parking_space::ActiveModel {
            id: Set(Uuid::new_v4()),
            lot_id: Set(lot.id),
            space_number: Set(s.space_number.clone()),
            x: Set(s.x),
            y: Set(s.y),
            rotation: Set(s.rotation),
        })
        .collect();

    parking_space::Entity::insert_many(new_spaces).exec(&txn).await?;

    let new_entrance = parking_entrance::ActiveModel {
        id: Set(Uuid::new_v4()),
        lot_id: Set(lot.id),
        x: Set(payload.entrance.x),
        y: Set(payload.entrance.y),
    };
    new_entrance.insert(&txn).await?;

    let mut active: parking_lot::ActiveModel = lot.into();
    active.capacity = Set(capacity);
    active.status = Set(LotStatus::Active);
    let lot = active.update(&txn).await?;

    txn.commit().await?;

    let spaces = parking_space::Entity::find()
        .filter(parking_space::Column::LotId.eq(lot.id))
        .all(&state.db)
        .await?;

    // A freshly replaced layout has no bookings, so every space is free
    let spaces = spaces
        .into_iter()
        .map(|s| SpaceInfo {
            id: s.id,
            space_number: s.space_number,
            is_free: true,
            location: LocationInfo {
                x: s.x,
                y: s.y,
                rotation: s.rotation,
                width: SPACE_WIDTH,
                height: SPACE_HEIGHT,
            },
        })
        .collect();

    Ok(Json(LotSpacesResponse {
        lot: ParkingLotResponse {
            id: lot.id,
            name: lot.name,
            address: lot.address,
            capacity: lot.capacity,
            status: lot.status,
        },
        spaces,
        entrance: Some(EntranceInfo {
            x: payload.entrance.x,
            y: payload.entrance.y,
        }),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space(number: &str) -> SpaceLayout {
        SpaceLayout {
            space_number: number.to_string(),
            x: 0,
            y: 0,
            rotation: 0,
        }
    }

    #[test]
    fn unique_space_numbers_pass() {
        let spaces = vec![space("A1"), space("A2"), space("B1")];
        assert_eq!(find_duplicate_space_number(&spaces), None);
    }

    #[test]
    fn duplicate_space_number_is_reported() {
        let spaces = vec![space("A1"), space("A2"), space("A1")];
        assert_eq!(find_duplicate_space_number(&spaces), Some("A1"));
    }

    #[test]
    fn empty_layout_has_no_duplicates() {
        assert_eq!(find_duplicate_space_number(&[]), None);
    }
}
