//! Aggregated multi-vendor orders.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::api::extractors::DocumentId;
use crate::api::AppState;
use crate::metrics;
use crate::store::{Collection, DeleteOutcome, Filter};

use super::{
    body_document, documents_json, field_or_null, non_empty, optional_json, InsertResponse,
    JsonResult, Refused,
};

/// Fields returned by `GET /orders/:id`.
pub const ORDER_FIELDS: &[&str] = &[
    "_id",
    "eventId",
    "img",
    "eventName",
    "eventType",
    "email",
    "photographer",
    "hotel",
    "caterer",
    "photographerType",
    "hotelType",
    "catererType",
    "eventFee",
    "photographerFee",
    "catererFee",
    "hotelFee",
    "guests",
    "total",
    "orderDate",
    "orderTime",
    "eventDate",
];

/// Refusal message for a second order on the same date.
pub const ORDER_LIMIT_MESSAGE: &str = "You cannot order more than 1 in 24 hours";

/// Query string of `GET /orders`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    /// Only orders placed by this email.
    pub email: Option<String>,
    /// Only orders placed on this date; replaces the email filter.
    pub order_date: Option<String>,
}

impl OrderQuery {
    /// Filter selected by the query string.
    pub fn filter(self) -> Filter {
        match (non_empty(self.email), non_empty(self.order_date)) {
            (_, Some(date)) => Filter::eq("orderDate", date),
            (Some(email), None) => Filter::eq("email", email),
            (None, None) => Filter::All,
        }
    }
}

/// `GET /orders?email=&orderDate=`.
#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> JsonResult {
    let orders = state
        .store
        .find(Collection::Orders, query.filter(), None)
        .await?;
    Ok(Json(documents_json(orders)))
}

/// `GET /allOrders`.
#[instrument(skip(state))]
pub async fn list_all_orders(State(state): State<AppState>) -> JsonResult {
    let orders = state.store.find(Collection::Orders, Filter::All, None).await?;
    Ok(Json(documents_json(orders)))
}

/// `GET /allOrders/:id`: the full order document.
#[instrument(skip(state, id), fields(id = %id.0))]
pub async fn get_order_full(State(state): State<AppState>, id: DocumentId) -> JsonResult {
    let order = state
        .store
        .find_one(Collection::Orders, Filter::Id(id.0), None)
        .await?;
    Ok(Json(optional_json(order)))
}

/// `GET /orders/:id`: order projected to the customer-facing fields.
#[instrument(skip(state, id), fields(id = %id.0))]
pub async fn get_order(State(state): State<AppState>, id: DocumentId) -> JsonResult {
    let order = state
        .store
        .find_one(Collection::Orders, Filter::Id(id.0), Some(ORDER_FIELDS))
        .await?;
    Ok(Json(optional_json(order)))
}

/// `POST /orders`: at most one order per email per `orderDate`.
///
/// The check is a plain lookup before the insert, so two concurrent
/// requests can both pass it.
#[instrument(skip(state, body))]
pub async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> JsonResult<InsertResponse> {
    let order = body_document(body)?;
    let same_day = Filter::Eq(vec![
        ("orderDate".to_string(), field_or_null(&order, "orderDate")),
        ("email".to_string(), field_or_null(&order, "email")),
    ]);

    if state
        .store
        .find_one(Collection::Orders, same_day, None)
        .await?
        .is_some()
    {
        metrics::inc_orders_refused();
        return Ok(Json(InsertResponse::Refused(Refused::new(ORDER_LIMIT_MESSAGE))));
    }

    let outcome = state.store.insert_one(Collection::Orders, order).await?;
    info!(id = %outcome.inserted_id, "Order placed");
    Ok(Json(InsertResponse::Inserted(outcome)))
}

/// `DELETE /orders/:id`, `DELETE /allOrders/:id`.
#[instrument(skip(state, id), fields(id = %id.0))]
pub async fn delete_order(
    State(state): State<AppState>,
    id: DocumentId,
) -> JsonResult<DeleteOutcome> {
    let outcome = state
        .store
        .delete_one(Collection::Orders, Filter::Id(id.0))
        .await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_date_replaces_email_filter() {
        let query = OrderQuery {
            email: Some("a@b.c".to_string()),
            order_date: Some("2024-05-01".to_string()),
        };
        assert_eq!(query.filter(), Filter::eq("orderDate", "2024-05-01"));
    }

    #[test]
    fn empty_parameters_mean_no_filter() {
        let query = OrderQuery {
            email: Some(String::new()),
            order_date: None,
        };
        assert_eq!(query.filter(), Filter::All);
        assert_eq!(
            OrderQuery {
                email: Some("a@b.c".to_string()),
                order_date: None,
            }
            .filter(),
            Filter::eq("email", "a@b.c")
        );
    }
}
