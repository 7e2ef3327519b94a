use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::parking_lot::{self, LotStatus};
use crate::entities::user::{self, UserRole};
use crate::entities::{parking_space, review};
use crate::error::{AppError, AppResult};
use crate::handlers::driver::complete_expired_bookings;
use crate::AppState;

// ============ Listing Management ============

#[derive(Debug, Serialize)]
pub struct LotAdminResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub capacity: i32,
    pub status: LotStatus,
    pub owner_name: String,
    pub owner_email: String,
    pub created_at: DateTime<Utc>,
}

/// List all parking lots regardless of status (admin)
pub async fn list_parking_lots(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<LotAdminResponse>>> {
    let lots = parking_lot::Entity::find().all(&state.db).await?;
    let users = user::Entity::find().all(&state.db).await?;

    let responses: Vec<LotAdminResponse> = lots
        .into_iter()
        .map(|l| {
            let owner = users.iter().find(|u| u.id == l.owner_id);
            LotAdminResponse {
                id: l.id,
                name: l.name,
                address: l.address,
                capacity: l.capacity,
                status: l.status,
                owner_name: owner.map(|u| u.name.clone()).unwrap_or_default(),
                owner_email: owner.map(|u| u.email.clone()).unwrap_or_default(),
                created_at: l.created_at.with_timezone(&Utc),
            }
        })
        .collect();

    Ok(Json(responses))
}

async fn set_lot_status(
    state: &AppState,
    lot_id: Uuid,
    status: LotStatus,
) -> AppResult<parking_lot::Model> {
    let lot = parking_lot::Entity::find_by_id(lot_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Parking lot not found".to_string()))?;

    if lot.status == status {
        return Err(AppError::BadRequest(format!(
            "Lot is already {:?}",
            status
        )));
    }

    let mut active: parking_lot::ActiveModel = lot.into();
    active.status = Set(status);
    Ok(active.update(&state.db).await?)
}

/// Approve a pending listing (admin)
pub async fn approve_parking_lot(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> AppResult<Json<parking_lot::Model>> {
    let lot = set_lot_status(&state, lot_id, LotStatus::Active).await?;
    tracing::info!(lot_id = %lot.id, "Parking lot approved");
    Ok(Json(lot))
}

/// Hide a listing from drivers (admin)
pub async fn deactivate_parking_lot(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> AppResult<Json<parking_lot::Model>> {
    let lot = set_lot_status(&state, lot_id, LotStatus::Inactive).await?;
    tracing::info!(lot_id = %lot.id, "Parking lot deactivated");
    Ok(Json(lot))
}

// ============ User Management ============

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// List all users (admin)
pub async fn list_all_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = user::Entity::find().all(&state.db).await?;

    let responses: Vec<UserResponse> = users
        .into_iter()
        .map(|u| UserResponse {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role,
            created_at: u.created_at.with_timezone(&Utc),
        })
        .collect();

    Ok(Json(responses))
}

/// Delete a user account (admin)
///
/// Lots, bookings and reviews cascade at the storage layer.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let user = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.role == UserRole::Admin {
        return Err(AppError::Forbidden(
            "Admin accounts cannot be deleted".to_string(),
        ));
    }

    user::Entity::delete_by_id(id).exec(&state.db).await?;

    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}

// ============ Booking Management ============

#[derive(Debug, Serialize)]
pub struct BookingAdminInfo {
    pub id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub lot_name: String,
    pub space_number: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// List all bookings (admin)
pub async fn list_all_bookings(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<BookingAdminInfo>>> {
    complete_expired_bookings(&state.db).await?;

    let bookings = booking::Entity::find().all(&state.db).await?;
    let users = user::Entity::find().all(&state.db).await?;
    let spaces = parking_space::Entity::find().all(&state.db).await?;
    let lots = parking_lot::Entity::find().all(&state.db).await?;

    let responses: Vec<BookingAdminInfo> = bookings
        .into_iter()
        .map(|b| {
            let user = users.iter().find(|u| u.id == b.user_id);
            let space = spaces.iter().find(|s| s.id == b.space_id);
            let lot = space.and_then(|s| lots.iter().find(|l| l.id == s.lot_id));
            BookingAdminInfo {
                id: b.id,
                user_name: user.map(|u| u.name.clone()).unwrap_or_default(),
                user_email: user.map(|u| u.email.clone()).unwrap_or_default(),
                lot_name: lot.map(|l| l.name.clone()).unwrap_or_default(),
                space_number: space.map(|s| s.space_number.clone()).unwrap_or_default(),
                start_time: b.start_time.with_timezone(&Utc),
                end_time: b.end_time.with_timezone(&Utc),
                status: b.status,
                created_at: b.created_at.with_timezone(&Utc),
            }
        })
        .collect();

    Ok(Json(responses))
}

// ============ Review Moderation ============

#[derive(Debug, Serialize)]
pub struct ReviewAdminInfo {
    pub id: Uuid,
    pub lot_name: String,
    pub reviewer_name: String,
    pub reviewer_email: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// List all reviews (admin)
pub async fn list_all_reviews(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ReviewAdminInfo>>> {
    let reviews = review::Entity::find().all(&state.db).await?;
    let users = user::Entity::find().all(&state.db).await?;
    let lots = parking_lot::Entity::find().all(&state.db).await?;

    let responses: Vec<ReviewAdminInfo> = reviews
        .into_iter()
        .map(|r| {
            let reviewer = users.iter().find(|u| u.id == r.user_id);
            let lot = lots.iter().find(|l| l.id == r.lot_id);
            ReviewAdminInfo {
                id: r.id,
                lot_name: lot.map(|l| l.name.clone()).unwrap_or_default(),
                reviewer_name: reviewer.map(|u| u.name.clone()).unwrap_or_default(),
                reviewer_email: reviewer.map(|u| u.email.clone()).unwrap_or_default(),
                rating: r.rating,
                comment: r.comment,
                created_at: r.created_at.with_timezone(&Utc),
            }
        })
        .collect();

    Ok(Json(responses))
}

/// Remove a review (admin moderation)
pub async fn delete_review(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let result = review::Entity::delete_by_id(review_id)
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Review not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Review deleted" })))
}
