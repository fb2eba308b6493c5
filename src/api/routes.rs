//! HTTP API route definitions.

use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::{verify_admin, verify_token};
use crate::metrics::track_http;

use super::handlers::{auth, bookings, events, orders, payments, system, users};
use super::AppState;

/// Create the API router.
///
/// Routes fall in three groups: public, token-guarded, and admin-guarded
/// (token + admin role). Groups are merged, so one path can carry methods
/// with different guards.
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .merge(public_routes())
        .merge(token_routes(state.clone()))
        .merge(admin_routes(state.clone()))
        .layer(from_fn(track_http))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        // System
        .route("/", get(system::landing))
        .route("/health", get(system::health))
        .route("/ready", get(system::ready))
        .route("/metrics", get(system::metrics))
        // Auth
        .route("/jwt", post(auth::issue_token))
        // Users
        .route("/users", post(users::create_user))
        .route("/users/admin/:id", get(users::admin_status))
        // Events
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/:id", get(events::get_event))
        // Bookings
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/:id", delete(bookings::delete_booking))
        // Orders
        .route("/orders", post(orders::create_order))
        .route("/orders/:id", delete(orders::delete_order))
        // Payments
        .route("/create-payment-intent", post(payments::create_payment_intent))
        .route("/payments", post(payments::record_payment))
}

fn token_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users))
        .route("/bookings", get(bookings::list_bookings))
        .route("/bookings/:id", get(bookings::get_booking))
        .route("/orders", get(orders::list_orders))
        .route("/orders/:id", get(orders::get_order))
        .route("/payments/:email", get(payments::list_payments))
        .route_layer(from_fn_with_state(state, verify_token))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Users
        .route("/allUsers", get(users::list_users))
        .route("/users/admin/:id", patch(users::promote_user))
        .route("/users/:id", delete(users::delete_user))
        // Events
        .route("/allEvents", get(events::list_events))
        .route("/allEvents/:id", delete(events::delete_event))
        // Bookings
        .route("/allBookings", get(bookings::list_all_bookings))
        .route(
            "/allBookings/:id",
            get(bookings::get_booking).delete(bookings::delete_booking),
        )
        // Orders
        .route("/allOrders", get(orders::list_all_orders))
        .route(
            "/allOrders/:id",
            get(orders::get_order_full).delete(orders::delete_order),
        )
        // Admin check runs after the token check.
        .route_layer(from_fn_with_state(state.clone(), verify_admin))
        .route_layer(from_fn_with_state(state, verify_token))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
}
