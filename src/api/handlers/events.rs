//! Event catalogue.

use axum::extract::State;
use axum::Json;
use serde_json::Value;
use tracing::instrument;

use crate::api::extractors::DocumentId;
use crate::api::AppState;
use crate::store::{Collection, DeleteOutcome, Filter, InsertOutcome};

use super::{body_document, documents_json, optional_json, JsonResult};

/// Fields returned by `GET /events/:id`.
pub const EVENT_FIELDS: &[&str] = &[
    "_id",
    "eventName",
    "eventFee",
    "img",
    "description",
    "eventType",
];

/// `GET /events`, `GET /allEvents`.
#[instrument(skip(state))]
pub async fn list_events(State(state): State<AppState>) -> JsonResult {
    let events = state.store.find(Collection::Events, Filter::All, None).await?;
    Ok(Json(documents_json(events)))
}

/// `GET /events/:id`: public event card, `null` when unknown.
#[instrument(skip(state, id), fields(id = %id.0))]
pub async fn get_event(State(state): State<AppState>, id: DocumentId) -> JsonResult {
    let event = state
        .store
        .find_one(Collection::Events, Filter::Id(id.0), Some(EVENT_FIELDS))
        .await?;
    Ok(Json(optional_json(event)))
}

/// `POST /events`.
#[instrument(skip(state, body))]
pub async fn create_event(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> JsonResult<InsertOutcome> {
    let event = body_document(body)?;
    let outcome = state.store.insert_one(Collection::Events, event).await?;
    Ok(Json(outcome))
}

/// `DELETE /allEvents/:id`.
#[instrument(skip(state, id), fields(id = %id.0))]
pub async fn delete_event(State(state): State<AppState>, id: DocumentId) -> JsonResult<DeleteOutcome> {
    let outcome = state
        .store
        .delete_one(Collection::Events, Filter::Id(id.0))
        .await?;
    Ok(Json(outcome))
}
