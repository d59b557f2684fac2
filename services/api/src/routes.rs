//! API service routes

use axum::{
    Json, Router,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use crate::{middleware::auth_middleware, state::AppState};

pub mod auth;
pub mod tasks;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/auth/me",
            get(auth::get_profile).put(auth::update_profile),
        )
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/:id",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(protected_routes);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "task-api"
    }))
}
