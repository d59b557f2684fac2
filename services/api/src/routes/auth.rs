//! Registration, login, and profile handlers

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::{error, info};

use crate::{
    error::ApiError,
    middleware::CurrentUser,
    models::{AuthResponse, LoginRequest, NewUser, RegisterRequest, UpdateProfileRequest, UserResponse},
    password,
    state::AppState,
    validation,
};

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_email(&payload.email).map_err(ApiError::Validation)?;
    validation::validate_password(&payload.password).map_err(ApiError::Validation)?;

    let existing = state
        .user_repository
        .find_by_email(&payload.email)
        .await
        .map_err(|e| {
            error!("Failed to look up email: {}", e);
            ApiError::Internal
        })?;

    if existing.is_some() {
        return Err(ApiError::Conflict(
            "User already exists with this email".to_string(),
        ));
    }

    let password_hash = password::hash_password(&payload.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        ApiError::Internal
    })?;

    let new_user = NewUser {
        email: payload.email,
        name: payload.name,
        password_hash,
    };

    let user = state.user_repository.create(&new_user).await.map_err(|e| {
        error!("Failed to create user: {}", e);
        ApiError::Internal
    })?;

    let token = state.jwt_service.issue_token(user.id).map_err(|e| {
        error!("Failed to issue token: {}", e);
        ApiError::Internal
    })?;

    info!("Registered new user: {}", user.id);

    let response = AuthResponse {
        message: "User registered successfully".to_string(),
        user: UserResponse::from(&user),
        token,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Log a user in
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    // Unknown email and wrong password are indistinguishable to the caller
    let user = state
        .user_repository
        .find_by_email(&payload.email)
        .await
        .map_err(|e| {
            error!("Failed to look up email: {}", e);
            ApiError::Internal
        })?
        .ok_or(ApiError::InvalidCredentials)?;

    let valid = password::verify_password(&payload.password, &user.password_hash).map_err(|e| {
        error!("Failed to verify password: {}", e);
        ApiError::Internal
    })?;

    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.jwt_service.issue_token(user.id).map_err(|e| {
        error!("Failed to issue token: {}", e);
        ApiError::Internal
    })?;

    info!("User logged in: {}", user.id);

    let response = AuthResponse {
        message: "Login successful".to_string(),
        user: UserResponse::from(&user),
        token,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Get the current user's profile
pub async fn get_profile(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(json!({ "user": UserResponse::from(&user) })))
}

/// Update the current user's profile; omitted fields keep prior values
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(email) = payload.email.as_deref() {
        validation::validate_email(email).map_err(ApiError::Validation)?;

        if !email.eq_ignore_ascii_case(&user.email) {
            let taken = state.user_repository.find_by_email(email).await.map_err(|e| {
                error!("Failed to look up email: {}", e);
                ApiError::Internal
            })?;

            if taken.is_some() {
                return Err(ApiError::Conflict("Email already in use".to_string()));
            }
        }
    }

    // Merge-patch: omitted keeps the current value, explicit null clears
    // the name
    let name = payload.name.unwrap_or_else(|| user.name.clone());
    let email = payload.email.unwrap_or_else(|| user.email.clone());

    let updated = state
        .user_repository
        .update_profile(user.id, name.as_deref(), &email)
        .await
        .map_err(|e| {
            error!("Failed to update profile: {}", e);
            ApiError::Internal
        })?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": UserResponse::from(&updated),
    })))
}
