use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::handlers::{admin, auth, driver, owner};
use crate::middleware::auth::{
    auth_middleware, require_admin, require_driver, require_owner_or_admin,
};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::role_rate_limit::{create_role_governor, RateLimitedRole};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Create role-specific governor layers (keyed by user id from JWT claims)
    let driver_governor = create_role_governor(RateLimitedRole::Driver);
    let owner_governor = create_role_governor(RateLimitedRole::Owner);
    // Create IP-based governor for public routes
    let public_governor = create_public_governor();

    // Public routes
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    // Public lot discovery routes (no auth)
    let public_routes = Router::new()
        .route("/parking-lots", get(driver::list_parking_lots))
        .route("/parking-lots/{id}/spaces", get(driver::lot_spaces))
        .route(
            "/parking-lots/{id}/available-spaces",
            get(driver::available_spaces),
        )
        .route("/parking-lots/{id}/reviews", get(driver::list_reviews))
        .layer(public_governor);

    // Owner routes (requires auth + owner role; admins may edit any layout)
    let owner_routes = Router::new()
        .route("/parking-lots", post(owner::create_parking_lot))
        .route("/parking-lots/{id}/spaces", post(owner::replace_layout))
        .route("/owner/parking-lots", get(owner::my_parking_lots))
        .layer(owner_governor)
        .layer(middleware::from_fn(require_owner_or_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin routes (requires auth + admin role)
    let admin_routes = Router::new()
        // Listing management
        .route("/parking-lots", get(admin::list_parking_lots))
        .route("/parking-lots/{id}/approve", post(admin::approve_parking_lot))
        .route(
            "/parking-lots/{id}/deactivate",
            post(admin::deactivate_parking_lot),
        )
        // User management
        .route("/users", get(admin::list_all_users))
        .route("/users/{id}", delete(admin::delete_user))
        // Booking oversight
        .route("/bookings", get(admin::list_all_bookings))
        // Review moderation
        .route("/reviews", get(admin::list_all_reviews))
        .route("/reviews/{id}", delete(admin::delete_review))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Driver booking routes (requires auth + driver role)
    let booking_routes = Router::new()
        .route("/create", post(driver::create_booking))
        .route("/", get(driver::my_bookings))
        .route("/{id}/cancel", post(driver::cancel_booking))
        .layer(driver_governor.clone())
        .layer(middleware::from_fn(require_driver))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Driver review routes (requires auth + driver role)
    let review_routes = Router::new()
        .route("/", post(driver::create_review))
        .layer(driver_governor)
        .layer(middleware::from_fn(require_driver))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", Router::new().merge(public_routes).merge(owner_routes))
        .nest("/api/admin", admin_routes)
        .nest("/api/bookings", booking_routes)
        .nest("/api/reviews", review_routes)
        .with_state(state)
}
