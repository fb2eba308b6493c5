//! Single-service bookings.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::api::extractors::DocumentId;
use crate::api::AppState;
use crate::store::{Collection, DeleteOutcome, Filter, InsertOutcome};

use super::{body_document, documents_json, non_empty, optional_json, JsonResult};

/// Fields returned by `GET /bookings/:id` and `GET /allBookings/:id`.
pub const BOOKING_FIELDS: &[&str] = &[
    "_id",
    "eventName",
    "eventFee",
    "img",
    "description",
    "eventType",
    "serviceData",
    "email",
];

/// Query string of `GET /bookings`.
#[derive(Debug, Default, Deserialize)]
pub struct BookingQuery {
    /// Only bookings made by this email.
    pub email: Option<String>,
}

/// `GET /bookings?email=`.
#[instrument(skip(state))]
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingQuery>,
) -> JsonResult {
    let filter = match non_empty(query.email) {
        Some(email) => Filter::eq("email", email),
        None => Filter::All,
    };
    let bookings = state.store.find(Collection::Bookings, filter, None).await?;
    Ok(Json(documents_json(bookings)))
}

/// `GET /allBookings`.
#[instrument(skip(state))]
pub async fn list_all_bookings(State(state): State<AppState>) -> JsonResult {
    let bookings = state
        .store
        .find(Collection::Bookings, Filter::All, None)
        .await?;
    Ok(Json(documents_json(bookings)))
}

/// `GET /bookings/:id`, `GET /allBookings/:id`.
#[instrument(skip(state, id), fields(id = %id.0))]
pub async fn get_booking(State(state): State<AppState>, id: DocumentId) -> JsonResult {
    let booking = state
        .store
        .find_one(Collection::Bookings, Filter::Id(id.0), Some(BOOKING_FIELDS))
        .await?;
    Ok(Json(optional_json(booking)))
}

/// `POST /bookings`.
#[instrument(skip(state, body))]
pub async fn create_booking(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> JsonResult<InsertOutcome> {
    let booking = body_document(body)?;
    let outcome = state.store.insert_one(Collection::Bookings, booking).await?;
    Ok(Json(outcome))
}

/// `DELETE /bookings/:id`, `DELETE /allBookings/:id`.
#[instrument(skip(state, id), fields(id = %id.0))]
pub async fn delete_booking(
    State(state): State<AppState>,
    id: DocumentId,
) -> JsonResult<DeleteOutcome> {
    let outcome = state
        .store
        .delete_one(Collection::Bookings, Filter::Id(id.0))
        .await?;
    Ok(Json(outcome))
}
