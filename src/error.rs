//! Unified error types for the marketplace server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Unified error type for startup and CLI paths.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Document store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Payment gateway error.
    #[error("payment error: {0}")]
    Payment(#[from] PaymentError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Document store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Driver-level failure (network, auth, server error).
    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// A JSON body could not be turned into a BSON document.
    #[error("failed to encode document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    /// The payload was valid JSON but not an object.
    #[error("document must be a JSON object")]
    NotAnObject,

    /// Connection string could not be assembled.
    #[error("invalid connection string: {0}")]
    InvalidUri(String),
}

/// Payment gateway errors.
#[derive(Error, Debug)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The payment API answered with a non-success status.
    #[error("payment api rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status returned by the API.
        status: u16,
        /// Error message from the API body.
        message: String,
    },

    /// Requested amount is not chargeable.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

/// HTTP-facing error, converted to a JSON body with a status code.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, malformed, or expired bearer token.
    #[error("unauthorized access")]
    Unauthorized,

    /// Authenticated but not allowed.
    #[error("forbidden access")]
    Forbidden,

    /// Path parameter is not a valid ObjectId.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// Request body or query failed validation.
    #[error("{0}")]
    BadRequest(String),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Payment gateway failure.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Token could not be signed.
    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            Self::InvalidId(_) | Self::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::Store(StoreError::NotAnObject | StoreError::Encode(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Self::Payment(PaymentError::InvalidAmount(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Self::Store(e) => {
                tracing::error!("Store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an internal error occurred".to_string(),
                )
            }
            Self::Payment(e) => {
                tracing::error!("Payment error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "payment provider request failed".to_string(),
                )
            }
            Self::Token(e) => {
                tracing::error!("Token error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an internal error occurred".to_string(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_message(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        value["message"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn unauthorized_is_401_with_message() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_message(response).await, "unauthorized access");
    }

    #[tokio::test]
    async fn forbidden_is_403_with_message() {
        let response = ApiError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_message(response).await, "forbidden access");
    }

    #[tokio::test]
    async fn rejected_payment_hides_provider_message() {
        let err = ApiError::Payment(PaymentError::Rejected {
            status: 402,
            message: "card_declined: secret detail".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_message(response).await, "payment provider request failed");
    }

    #[tokio::test]
    async fn unencodable_body_is_a_client_error() {
        let err = ApiError::from(crate::store::types::document_from_json(
            serde_json::json!({ "n": u64::MAX }),
        )
        .unwrap_err());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_message(response).await.starts_with("failed to encode document"));
    }

    #[test]
    fn invalid_amount_maps_to_bad_request() {
        let err = ApiError::Payment(PaymentError::InvalidAmount("0".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
