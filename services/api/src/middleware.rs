//! Authentication middleware for bearer token validation
//!
//! Single chokepoint for every protected route: extract the bearer token,
//! verify it, resolve the embedded id to a live user row, and stash the
//! user in the request extensions for the handlers.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::error;

use crate::{error::ApiError, models::User, state::AppState};

/// Authenticated user attached to the request by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Extract the bearer token from an Authorization header value
fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").filter(|t| !t.is_empty())
}

/// Authentication middleware
///
/// Missing header, malformed scheme, bad signature, expired token, and an
/// id that no longer resolves to a user all reject the same way.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthenticated)?;

    let token = bearer_token(auth_header).ok_or(ApiError::Unauthenticated)?;

    let user_id = state
        .jwt_service
        .verify_token(token)
        .map_err(|_| ApiError::Unauthenticated)?;

    let user = state
        .user_repository
        .find_by_id(user_id)
        .await
        .map_err(|e| {
            error!("Failed to load user for token: {}", e);
            ApiError::Internal
        })?
        .ok_or(ApiError::Unauthenticated)?;

    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("bearer abc"), None);
        assert_eq!(bearer_token("Basic dXNlcjpwdw=="), None);
        assert_eq!(bearer_token("abc.def.ghi"), None);
    }
}
