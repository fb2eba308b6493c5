//! Custom Axum extractors

use axum::async_trait;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use mongodb::bson::oid::ObjectId;

use crate::error::ApiError;
use crate::store::types::parse_object_id;

/// Extract and validate an ObjectId from the `:id` path segment.
pub struct DocumentId(pub ObjectId);

#[async_trait]
impl<S> FromRequestParts<S> for DocumentId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::BadRequest("missing id".to_string()))?;

        parse_object_id(&id)
            .map(Self)
            .ok_or(ApiError::InvalidId(id))
    }
}
