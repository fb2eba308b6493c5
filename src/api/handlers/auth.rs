//! Token issuing.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::api::AppState;
use crate::error::ApiError;

use super::JsonResult;

/// Response of `POST /jwt`.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Signed access token.
    pub token: String,
}

/// `POST /jwt`: sign the posted user object into an access token.
#[instrument(skip(state, body))]
pub async fn issue_token(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> JsonResult<TokenResponse> {
    let Value::Object(user) = body else {
        return Err(ApiError::BadRequest("user must be a JSON object".to_string()));
    };

    let token = state.tokens.issue(user)?;
    debug!("Token issued");
    Ok(Json(TokenResponse { token }))
}
