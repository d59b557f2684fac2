//! Custom error types for the API service
//!
//! Every handler failure funnels through [`ApiError`]. Internal causes are
//! logged at the call site; the client only ever sees the generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad or missing input the client can fix
    #[error("{0}")]
    Validation(String),

    /// Duplicate email; reported as a 400, not a 409
    #[error("{0}")]
    Conflict(String),

    /// Login with an unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed, invalid, or expired bearer token
    #[error("Authentication required")]
    Unauthenticated,

    /// Resource absent or owned by another user; the two are
    /// indistinguishable to the caller
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Unexpected store or crypto failure
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
