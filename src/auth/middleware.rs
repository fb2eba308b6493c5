//! Request guards: bearer token verification and admin role check.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, warn};

use crate::api::AppState;
use crate::error::ApiError;
use crate::metrics;
use crate::store::{Collection, Filter};

use super::token::Claims;

/// Role value that grants access to admin routes.
pub const ADMIN_ROLE: &str = "admin";

/// Token from an `Authorization` header value: the second space-separated part.
pub fn bearer_token(header: &str) -> Option<&str> {
    header.split(' ').nth(1).filter(|token| !token.is_empty())
}

/// Reject requests without a valid, unexpired bearer token.
///
/// On success the decoded [`Claims`] are attached to the request extensions.
pub async fn verify_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&state, request.headers())?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Decode the bearer token carried by `headers`.
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Claims, ApiError> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        debug!("No token");
        metrics::inc_auth_rejected("missing_token");
        return Err(ApiError::Unauthorized);
    };

    let token = header
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or_else(|| {
            metrics::inc_auth_rejected("malformed_header");
            ApiError::Unauthorized
        })?;

    state.tokens.verify(token).map_err(|e| {
        debug!("Token rejected: {}", e);
        metrics::inc_auth_rejected("invalid_token");
        ApiError::Unauthorized
    })
}

/// Reject requests whose token holder is not an admin.
///
/// Must run after [`verify_token`].
pub async fn verify_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let email = request
        .extensions()
        .get::<Claims>()
        .ok_or(ApiError::Unauthorized)?
        .email()
        .map(str::to_owned);

    let Some(email) = email else {
        metrics::inc_auth_rejected("not_admin");
        return Err(ApiError::Forbidden);
    };

    if !is_admin(&state, &email).await? {
        warn!(%email, "Admin route refused");
        metrics::inc_auth_rejected("not_admin");
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(request).await)
}

/// Whether the user with `email` exists and has the admin role.
pub async fn is_admin(state: &AppState, email: &str) -> Result<bool, ApiError> {
    let user = state
        .store
        .find_one(Collection::Users, Filter::eq("email", email), None)
        .await?;

    Ok(user.is_some_and(|user| user.get_str("role").is_ok_and(|role| role == ADMIN_ROLE)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_takes_second_part() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Token xyz"), Some("xyz"));
    }

    #[test]
    fn bearer_token_missing_part_is_none() {
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token(""), None);
    }
}
