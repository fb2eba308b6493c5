//! HTTP API handlers, one module per resource.
//!
//! Handlers are thin: parse the request, build a [`Filter`], make one store
//! call, return the raw result as JSON.
//!
//! [`Filter`]: crate::store::Filter

pub mod auth;
pub mod bookings;
pub mod events;
pub mod orders;
pub mod payments;
pub mod system;
pub mod users;

use axum::Json;
use mongodb::bson::{Bson, Document};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::store::types::{document_from_json, document_to_json};
use crate::store::InsertOutcome;

/// JSON response or API error.
pub type JsonResult<T = Value> = Result<Json<T>, ApiError>;

/// Body returned when a pre-insert existence check refuses a write.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Refused {
    /// Why nothing was inserted.
    pub message: &'static str,
    /// Always null.
    pub inserted_id: Option<Value>,
}

impl Refused {
    /// Refusal with the given message.
    pub fn new(message: &'static str) -> Self {
        Self {
            message,
            inserted_id: None,
        }
    }
}

/// Response of an insert guarded by an existence check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InsertResponse {
    /// The document was written.
    Inserted(InsertOutcome),
    /// A matching document already existed.
    Refused(Refused),
}

/// Render a list of documents.
pub(crate) fn documents_json(documents: Vec<Document>) -> Value {
    Value::Array(documents.into_iter().map(document_to_json).collect())
}

/// Render an optional document, `null` when absent.
pub(crate) fn optional_json(document: Option<Document>) -> Value {
    document.map_or(Value::Null, document_to_json)
}

/// Parse a request body into a document.
pub(crate) fn body_document(body: Value) -> Result<Document, ApiError> {
    Ok(document_from_json(body)?)
}

/// Value of `field` for an equality check; missing fields compare as null.
pub(crate) fn field_or_null(document: &Document, field: &str) -> Bson {
    document.get(field).cloned().unwrap_or(Bson::Null)
}

/// Treat empty query parameters as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
