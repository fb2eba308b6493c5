//! User registration and role management.

use axum::extract::{Path, State};
use axum::Json;
use mongodb::bson::doc;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::api::extractors::DocumentId;
use crate::api::AppState;
use crate::auth::{is_admin, ADMIN_ROLE};
use crate::metrics;
use crate::store::{Collection, DeleteOutcome, Filter, Update, UpdateOutcome};

use super::{body_document, documents_json, field_or_null, InsertResponse, JsonResult, Refused};

/// Vendor type fields dropped when a user becomes an admin.
pub const VENDOR_TYPE_FIELDS: [&str; 3] = ["catererType", "hotelType", "photographerType"];

/// Admin status response.
#[derive(Debug, Serialize)]
pub struct AdminStatus {
    /// Whether the user has the admin role.
    pub admin: bool,
}

/// `GET /users`, `GET /allUsers`: every user.
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> JsonResult {
    let users = state.store.find(Collection::Users, Filter::All, None).await?;
    Ok(Json(documents_json(users)))
}

/// `GET /users/admin/:email`: whether the user is an admin.
#[instrument(skip(state))]
pub async fn admin_status(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> JsonResult<AdminStatus> {
    let admin = is_admin(&state, &email).await?;
    Ok(Json(AdminStatus { admin }))
}

/// `POST /users`: register unless the email is already taken.
#[instrument(skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> JsonResult<InsertResponse> {
    let user = body_document(body)?;
    let email = field_or_null(&user, "email");

    let existing = state
        .store
        .find_one(Collection::Users, Filter::Eq(vec![("email".to_string(), email)]), None)
        .await?;
    if existing.is_some() {
        return Ok(Json(InsertResponse::Refused(Refused::new("user already exist"))));
    }

    let outcome = state.store.insert_one(Collection::Users, user).await?;
    metrics::inc_users_registered();
    info!(id = %outcome.inserted_id, "User registered");
    Ok(Json(InsertResponse::Inserted(outcome)))
}

/// `PATCH /users/admin/:id`: grant the admin role and drop vendor types.
#[instrument(skip(state, id), fields(id = %id.0))]
pub async fn promote_user(
    State(state): State<AppState>,
    id: DocumentId,
) -> JsonResult<UpdateOutcome> {
    let update = Update {
        set: doc! { "role": ADMIN_ROLE },
        unset: VENDOR_TYPE_FIELDS.iter().map(|f| f.to_string()).collect(),
    };
    let outcome = state
        .store
        .update_one(Collection::Users, Filter::Id(id.0), update)
        .await?;
    Ok(Json(outcome))
}

/// `DELETE /users/:id`.
#[instrument(skip(state, id), fields(id = %id.0))]
pub async fn delete_user(
    State(state): State<AppState>,
    id: DocumentId,
) -> JsonResult<DeleteOutcome> {
    let outcome = state
        .store
        .delete_one(Collection::Users, Filter::Id(id.0))
        .await?;
    Ok(Json(outcome))
}
