//! Payment intents and recorded payments.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use crate::api::AppState;
use crate::auth::Claims;
use crate::error::ApiError;
use crate::metrics;
use crate::payment::fee_to_minor_units;
use crate::store::types::parse_object_id;
use crate::store::{Collection, DeleteOutcome, Filter, InsertOutcome};

use super::{body_document, documents_json, JsonResult};

/// Body of `POST /create-payment-intent`.
#[derive(Debug, Deserialize)]
pub struct IntentRequest {
    /// Fee in major currency units (number or numeric string).
    pub fee: Decimal,
}

/// Response of `POST /create-payment-intent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    /// Secret the client uses to confirm the payment.
    pub client_secret: String,
}

/// Response of `POST /payments`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecorded {
    /// Insert of the payment document.
    pub payment_result: InsertOutcome,
    /// Removal of the settled orders.
    pub delete_result: DeleteOutcome,
}

/// `POST /create-payment-intent`: card intent for `fee`, truncated to cents.
#[instrument(skip(state))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(request): Json<IntentRequest>,
) -> JsonResult<IntentResponse> {
    let amount = fee_to_minor_units(request.fee)?;
    info!(amount, "Creating payment intent");

    let intent = state.payments.create_intent(amount).await?;
    metrics::inc_payment_intents();

    Ok(Json(IntentResponse {
        client_secret: intent.client_secret,
    }))
}

/// `GET /payments/:email`: the caller's own payments.
#[instrument(skip(state, claims))]
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(email): Path<String>,
) -> JsonResult {
    if claims.email() != Some(email.as_str()) {
        return Err(ApiError::Forbidden);
    }

    let payments = state
        .store
        .find(Collection::Payments, Filter::eq("email", email), None)
        .await?;
    Ok(Json(documents_json(payments)))
}

/// `POST /payments`: record a payment and delete the orders it settles.
///
/// The insert and the delete are separate writes.
#[instrument(skip(state, body))]
pub async fn record_payment(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> JsonResult<PaymentRecorded> {
    let order_ids = settled_order_ids(&body)?;
    let payment = body_document(body)?;

    let payment_result = state.store.insert_one(Collection::Payments, payment).await?;
    let delete_result = state
        .store
        .delete_many(Collection::Orders, Filter::AnyId(order_ids))
        .await?;

    metrics::inc_payments_recorded();
    info!(
        id = %payment_result.inserted_id,
        orders_deleted = delete_result.deleted_count,
        "Payment recorded"
    );

    Ok(Json(PaymentRecorded {
        payment_result,
        delete_result,
    }))
}

/// Parse `orderIds` from a payment body.
pub fn settled_order_ids(body: &Value) -> Result<Vec<ObjectId>, ApiError> {
    let Some(ids) = body.get("orderIds").and_then(Value::as_array) else {
        return Err(ApiError::BadRequest(
            "orderIds must be an array of order ids".to_string(),
        ));
    };

    ids.iter()
        .map(|id| {
            id.as_str()
                .and_then(parse_object_id)
                .ok_or_else(|| ApiError::InvalidId(id.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn order_ids_are_parsed() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        let body = json!({ "orderIds": [a.to_hex(), b.to_hex()] });
        assert_eq!(settled_order_ids(&body).unwrap(), vec![a, b]);
    }

    #[test]
    fn missing_or_invalid_order_ids_are_rejected() {
        assert!(matches!(
            settled_order_ids(&json!({ "email": "a@b.c" })),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            settled_order_ids(&json!({ "orderIds": ["nope"] })),
            Err(ApiError::InvalidId(_))
        ));
        assert!(matches!(
            settled_order_ids(&json!({ "orderIds": [42] })),
            Err(ApiError::InvalidId(_))
        ));
    }

    #[test]
    fn intent_request_accepts_numbers_and_strings() {
        let number: IntentRequest = serde_json::from_value(json!({ "fee": 12.5 })).unwrap();
        let string: IntentRequest = serde_json::from_value(json!({ "fee": "12.5" })).unwrap();
        assert_eq!(number.fee, string.fee);
    }
}
