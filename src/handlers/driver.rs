use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IsolationLevel, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::parking_lot::{self, LotStatus};
use crate::entities::parking_space::{self, SPACE_HEIGHT, SPACE_WIDTH};
use crate::entities::{parking_entrance, review, user};
use crate::error::{AppError, AppResult};
use crate::utils::interval::overlaps;
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ParkingLotResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub capacity: i32,
    pub status: LotStatus,
}

#[derive(Debug, Serialize)]
pub struct LocationInfo {
    pub x: i32,
    pub y: i32,
    pub rotation: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Serialize)]
pub struct SpaceInfo {
    pub id: Uuid,
    pub space_number: String,
    pub is_free: bool,
    pub location: LocationInfo,
}

#[derive(Debug, Serialize)]
pub struct EntranceInfo {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Serialize)]
pub struct LotSpacesResponse {
    pub lot: ParkingLotResponse,
    pub spaces: Vec<SpaceInfo>,
    pub entrance: Option<EntranceInfo>,
}

/// List active parking lots
pub async fn list_parking_lots(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ParkingLotResponse>>> {
    let lots = parking_lot::Entity::find()
        .filter(parking_lot::Column::Status.eq(LotStatus::Active))
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

/// Compute which spaces are blocked for the given interval.
///
/// This is the single authoritative freeness computation: a space is occupied
/// iff some confirmed booking on it overlaps the interval. Cancelled,
/// completed and pending bookings never block a space.
fn occupied_space_ids(
    bookings: &[booking::Model],
    entry_time: DateTime<Utc>,
    exit_time: DateTime<Utc>,
) -> HashSet<Uuid> {
    bookings
        .iter()
        .filter(|b| b.status.is_active())
        .filter(|b| {
            overlaps(
                b.start_time.with_timezone(&Utc),
                b.end_time.with_timezone(&Utc),
                entry_time,
                exit_time,
            )
        })
        .map(|b| b.space_id)
        .collect()
}

async fn load_active_lot(db: &DatabaseConnection, lot_id: Uuid) -> AppResult<parking_lot::Model> {
    let lot = parking_lot::Entity::find_by_id(lot_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Parking lot not found".to_string()))?;

    // Pending and inactive lots are invisible to drivers
    if lot.status != LotStatus::Active {
        return Err(AppError::NotFound("Parking lot not found".to_string()));
    }

    Ok(lot)
}

async fn lot_spaces_response(
    db: &DatabaseConnection,
    lot: parking_lot::Model,
    entry_time: DateTime<Utc>,
    exit_time: DateTime<Utc>,
) -> AppResult<LotSpacesResponse> {
    let spaces = parking_space::Entity::find()
        .filter(parking_space::Column::LotId.eq(lot.id))
        .all(db)
        .await?;

    let entrance = parking_entrance::Entity::find()
        .filter(parking_entrance::Column::LotId.eq(lot.id))
        .one(db)
        .await?;

    let space_ids: Vec<Uuid> = spaces.iter().map(|s| s.id).collect();
    let bookings = booking::Entity::find()
        .filter(booking::Column::SpaceId.is_in(space_ids))
        .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
        .all(db)
        .await?;

    let occupied = occupied_space_ids(&bookings, entry_time, exit_time);

    // Occupied spaces are returned too; the caller renders them as taken
    let spaces = spaces
        .into_iter()
        .map(|s| SpaceInfo {
            id: s.id,
            space_number: s.space_number,
            is_free: !occupied.contains(&s.id),
            location: LocationInfo {
                x: s.x,
                y: s.y,
                rotation: s.rotation,
                width: SPACE_WIDTH,
                height: SPACE_HEIGHT,
            },
        })
        .collect();

    Ok(LotSpacesResponse {
        lot: ParkingLotResponse {
            id: lot.id,
            name: lot.name,
            address: lot.address,
            capacity: lot.capacity,
            status: lot.status,
        },
        spaces,
        entrance: entrance.map(|e| EntranceInfo { x: e.x, y: e.y }),
    })
}

/// Get lot layout with current occupancy
///
/// `is_free` here means "no confirmed booking ending at or after now", the
/// same computation as the time-aware query with an unbounded exit time.
pub async fn lot_spaces(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> AppResult<Json<LotSpacesResponse>> {
    let lot = load_active_lot(&state.db, lot_id).await?;
    let response =
        lot_spaces_response(&state.db, lot, Utc::now(), DateTime::<Utc>::MAX_UTC).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
}

/// Get lot layout with availability for a requested interval
pub async fn available_spaces(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<LotSpacesResponse>> {
    if query.exit_time <= query.entry_time {
        return Err(AppError::BadRequest(
            "exit_time must be after entry_time".to_string(),
        ));
    }

    let lot = load_active_lot(&state.db, lot_id).await?;
    let response =
        lot_spaces_response(&state.db, lot, query.entry_time, query.exit_time).await?;
    Ok(Json(response))
}

// ============ Booking Management ============

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub space_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub space_id: Uuid,
    pub space_number: String,
    pub lot_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Create a booking
///
/// The existence check and the insert run in one serializable transaction so
/// that two concurrent requests for overlapping intervals cannot both commit:
/// the loser fails with a serialization error, surfaced as a conflict.
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<Json<BookingResponse>> {
    if payload.end_time <= payload.start_time {
        return Err(AppError::BadRequest(
            "end_time must be after start_time".to_string(),
        ));
    }

    if payload.start_time < Utc::now() {
        return Err(AppError::BadRequest(
            "Cannot book a time in the past".to_string(),
        ));
    }

    let txn = state
        .db
        .begin_with_config(Some(IsolationLevel::Serializable), None)
        .await?;

    let space = parking_space::Entity::find_by_id(payload.space_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Parking space not found".to_string()))?;

    let existing = booking::Entity::find()
        .filter(booking::Column::SpaceId.eq(space.id))
        .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
        .all(&txn)
        .await?;

    if !occupied_space_ids(&existing, payload.start_time, payload.end_time).is_empty() {
        return Err(AppError::Conflict(
            "Slot already taken for the requested time".to_string(),
        ));
    }

    let new_booking = booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        space_id: Set(space.id),
        user_id: Set(claims.sub),
        start_time: Set(payload.start_time.into()),
        end_time: Set(payload.end_time.into()),
        status: Set(BookingStatus::Confirmed),
        ..Default::default()
    };

    let booking = new_booking.insert(&txn).await?;
    txn.commit().await.map_err(|e| slot_taken_on_conflict(e.into()))?;

    let lot = parking_lot::Entity::find_by_id(space.lot_id)
        .one(&state.db)
        .await?;

    Ok(Json(BookingResponse {
        id: booking.id,
        space_id: booking.space_id,
        space_number: space.space_number,
        lot_name: lot.map(|l| l.name).unwrap_or_default(),
        start_time: booking.start_time.with_timezone(&Utc),
        end_time: booking.end_time.with_timezone(&Utc),
        status: booking.status,
        created_at: booking.created_at.with_timezone(&Utc),
    }))
}

/// Reword the generic serialization-failure conflict for the booking path:
/// losing the commit race means someone else just took the slot.
fn slot_taken_on_conflict(err: AppError) -> AppError {
    match err {
        AppError::Conflict(_) => {
            AppError::Conflict("Slot already taken for the requested time".to_string())
        }
        other => other,
    }
}

/// Mark confirmed bookings whose interval has passed as completed
pub async fn complete_expired_bookings(db: &DatabaseConnection) -> AppResult<()> {
    let now = Utc::now();
    let expired = booking::Entity::find()
        .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
        .filter(booking::Column::EndTime.lt(now))
        .all(db)
        .await?;

    for b in expired {
        let mut active: booking::ActiveModel = b.into();
        active.status = Set(BookingStatus::Completed);
        active.update(db).await?;
    }

    Ok(())
}

/// List the logged-in driver's bookings
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    complete_expired_bookings(&state.db).await?;

    let bookings = booking::Entity::find()
        .filter(booking::Column::UserId.eq(claims.sub))
        .all(&state.db)
        .await?;

    let spaces = parking_space::Entity::find().all(&state.db).await?;
    let lots = parking_lot::Entity::find().all(&state.db).await?;

    let responses: Vec<BookingResponse> = bookings
        .into_iter()
        .filter_map(|b| {
            let space = spaces.iter().find(|s| s.id == b.space_id)?;
            let lot = lots.iter().find(|l| l.id == space.lot_id);

            Some(BookingResponse {
                id: b.id,
                space_id: b.space_id,
                space_number: space.space_number.clone(),
                lot_name: lot.map(|l| l.name.clone()).unwrap_or_default(),
                start_time: b.start_time.with_timezone(&Utc),
                end_time: b.end_time.with_timezone(&Utc),
                status: b.status,
                created_at: b.created_at.with_timezone(&Utc),
            })
        })
        .collect();

    Ok(Json(responses))
}

/// Cancel a booking before it starts
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<BookingResponse>> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    // Verify ownership
    if booking.user_id != claims.sub {
        return Err(AppError::Forbidden(
            "You can only cancel your own bookings".to_string(),
        ));
    }

    if !booking.status.can_transition_to(BookingStatus::Cancelled) {
        return Err(AppError::Conflict(
            "Booking can no longer be cancelled".to_string(),
        ));
    }

    if booking.start_time.with_timezone(&Utc) <= Utc::now() {
        return Err(AppError::BadRequest(
            "Bookings can only be cancelled before they start".to_string(),
        ));
    }

    let space_id = booking.space_id;
    let mut active: booking::ActiveModel = booking.into();
    active.status = Set(BookingStatus::Cancelled);
    let updated = active.update(&state.db).await?;

    let space = parking_space::Entity::find_by_id(space_id)
        .one(&state.db)
        .await?;
    let lot = match &space {
        Some(s) => parking_lot::Entity::find_by_id(s.lot_id).one(&state.db).await?,
        None => None,
    };

    Ok(Json(BookingResponse {
        id: updated.id,
        space_id: updated.space_id,
        space_number: space.map(|s| s.space_number).unwrap_or_default(),
        lot_name: lot.map(|l| l.name).unwrap_or_default(),
        start_time: updated.start_time.with_timezone(&Utc),
        end_time: updated.end_time.with_timezone(&Utc),
        status: updated.status,
        created_at: updated.created_at.with_timezone(&Utc),
    }))
}

// ============ Reviews ============

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub parking_lot_id: Uuid,
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub parking_lot_id: Uuid,
    pub reviewer_name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Leave a review on a parking lot
pub async fn create_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<Json<ReviewResponse>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    load_active_lot(&state.db, payload.parking_lot_id).await?;

    let new_review = review::ActiveModel {
        id: Set(Uuid::new_v4()),
        lot_id: Set(payload.parking_lot_id),
        user_id: Set(claims.sub),
        rating: Set(payload.rating),
        comment: Set(payload.comment.clone()),
        ..Default::default()
    };

    let review = new_review.insert(&state.db).await?;

    let reviewer = user::Entity::find_by_id(claims.sub).one(&state.db).await?;

    Ok(Json(ReviewResponse {
        id: review.id,
        parking_lot_id: review.lot_id,
        reviewer_name: reviewer.map(|u| u.name).unwrap_or_default(),
        rating: review.rating,
        comment: review.comment,
        created_at: review.created_at.with_timezone(&Utc),
    }))
}

/// List reviews for a parking lot
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> AppResult<Json<Vec<ReviewResponse>>> {
    let lot = parking_lot::Entity::find_by_id(lot_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Parking lot not found".to_string()))?;

    let reviews = review::Entity::find()
        .filter(review::Column::LotId.eq(lot.id))
        .all(&state.db)
        .await?;

    let users = user::Entity::find().all(&state.db).await?;

    let responses: Vec<ReviewResponse> = reviews
        .into_iter()
        .map(|r| {
            let reviewer = users.iter().find(|u| u.id == r.user_id);
            ReviewResponse {
                id: r.id,
                parking_lot_id: r.lot_id,
                reviewer_name: reviewer.map(|u| u.name.clone()).unwrap_or_default(),
                rating: r.rating,
                comment: r.comment,
                created_at: r.created_at.with_timezone(&Utc),
            }
        })
        .collect();

    Ok(Json(responses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    fn make_booking(
        space_id: Uuid,
        status: BookingStatus,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> booking::Model {
        booking::Model {
            id: Uuid::new_v4(),
            space_id,
            user_id: Uuid::new_v4(),
            start_time: start.into(),
            end_time: end.into(),
            status,
            created_at: at(0).into(),
        }
    }

    #[test]
    fn no_bookings_means_all_spaces_free() {
        let occupied = occupied_space_ids(&[], at(10), at(12));
        assert!(occupied.is_empty());
    }

    #[test]
    fn overlapping_confirmed_booking_blocks_the_space() {
        let space = Uuid::new_v4();
        let bookings = vec![make_booking(space, BookingStatus::Confirmed, at(10), at(12))];

        let occupied = occupied_space_ids(&bookings, at(11), at(13));
        assert!(occupied.contains(&space));
    }

    #[test]
    fn non_overlapping_booking_leaves_the_space_free() {
        let space = Uuid::new_v4();
        let bookings = vec![make_booking(space, BookingStatus::Confirmed, at(10), at(12))];

        let occupied = occupied_space_ids(&bookings, at(13), at(15));
        assert!(occupied.is_empty());
    }

    #[test]
    fn booked_until_noon_blocks_a_request_starting_at_noon() {
        // Touching boundaries conflict under the conservative overlap policy.
        let space = Uuid::new_v4();
        let bookings = vec![make_booking(space, BookingStatus::Confirmed, at(10), at(12))];

        let occupied = occupied_space_ids(&bookings, at(12), at(14));
        assert!(occupied.contains(&space));
    }

    #[test]
    fn cancelled_and_completed_bookings_never_block() {
        let space = Uuid::new_v4();
        let bookings = vec![
            make_booking(space, BookingStatus::Cancelled, at(10), at(12)),
            make_booking(space, BookingStatus::Completed, at(10), at(12)),
            make_booking(space, BookingStatus::Pending, at(10), at(12)),
        ];

        let occupied = occupied_space_ids(&bookings, at(10), at(12));
        assert!(occupied.is_empty());
    }

    #[test]
    fn only_the_overlapping_space_is_occupied() {
        let busy = Uuid::new_v4();
        let idle = Uuid::new_v4();
        let bookings = vec![
            make_booking(busy, BookingStatus::Confirmed, at(10), at(12)),
            make_booking(idle, BookingStatus::Confirmed, at(18), at(20)),
        ];

        let occupied = occupied_space_ids(&bookings, at(11), at(13));
        assert!(occupied.contains(&busy));
        assert!(!occupied.contains(&idle));
    }

    #[test]
    fn commit_race_loss_reads_as_slot_taken() {
        let rebranded = slot_taken_on_conflict(AppError::Conflict(
            "Conflicting concurrent update, please retry".to_string(),
        ));
        match rebranded {
            AppError::Conflict(msg) => {
                assert_eq!(msg, "Slot already taken for the requested time")
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn non_conflict_commit_errors_pass_through() {
        let err = slot_taken_on_conflict(AppError::Internal("connection reset".to_string()));
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn unbounded_exit_blocks_any_future_booking() {
        // The time-unaware endpoint queries [now, max); a booking entirely in
        // the future must still mark the space as taken.
        let space = Uuid::new_v4();
        let bookings = vec![make_booking(space, BookingStatus::Confirmed, at(18), at(20))];

        let occupied = occupied_space_ids(&bookings, at(9), DateTime::<Utc>::MAX_UTC);
        assert!(occupied.contains(&space));
    }
}
