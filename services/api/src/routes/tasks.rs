//! Task CRUD handlers
//!
//! Every handler here runs behind the auth middleware and scopes its
//! repository call to the authenticated user's id. The owner field is
//! never read from the client.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::CurrentUser,
    models::task::{
        CreateTaskRequest, NewTask, Pagination, TaskChanges, TaskListResponse, TaskPriority,
        TaskQuery, TaskStatus, UpdateTaskRequest,
    },
    state::AppState,
    validation,
};

/// List the current user's tasks with optional filters and pagination
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<TaskQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (tasks, total) = state
        .task_repository
        .list(user.id, &query)
        .await
        .map_err(|e| {
            error!("Failed to list tasks: {}", e);
            ApiError::Internal
        })?;

    let page = query.page();
    let limit = query.limit();
    let pages = (total + limit as i64 - 1) / limit as i64;

    let response = TaskListResponse {
        tasks,
        pagination: Pagination {
            page,
            limit,
            total,
            pages,
        },
    };

    Ok(Json(response))
}

/// Get a single task
pub async fn get_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state
        .task_repository
        .find_by_id(user.id, id)
        .await
        .map_err(|e| {
            error!("Failed to get task: {}", e);
            ApiError::Internal
        })?
        .ok_or(ApiError::NotFound("Task"))?;

    Ok(Json(json!({ "task": task })))
}

/// Create a new task
pub async fn create_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_title(&payload.title).map_err(ApiError::Validation)?;

    let status = payload
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()
        .map_err(ApiError::Validation)?
        .unwrap_or_default();

    let priority = payload
        .priority
        .as_deref()
        .map(str::parse::<TaskPriority>)
        .transpose()
        .map_err(ApiError::Validation)?
        .unwrap_or_default();

    let new_task = NewTask {
        title: payload.title,
        description: payload.description,
        status,
        priority,
        due_date: payload.due_date,
    };

    let task = state
        .task_repository
        .create(user.id, &new_task)
        .await
        .map_err(|e| {
            error!("Failed to create task: {}", e);
            ApiError::Internal
        })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Task created successfully",
            "task": task,
        })),
    ))
}

/// Update a task with merge-patch semantics
pub async fn update_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(title) = payload.title.as_deref() {
        validation::validate_title(title).map_err(ApiError::Validation)?;
    }

    let status = payload
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()
        .map_err(ApiError::Validation)?;

    let priority = payload
        .priority
        .as_deref()
        .map(str::parse::<TaskPriority>)
        .transpose()
        .map_err(ApiError::Validation)?;

    let changes = TaskChanges {
        title: payload.title,
        description: payload.description,
        status,
        priority,
        due_date: payload.due_date,
    };

    let task = state
        .task_repository
        .update(user.id, id, &changes)
        .await
        .map_err(|e| {
            error!("Failed to update task: {}", e);
            ApiError::Internal
        })?
        .ok_or(ApiError::NotFound("Task"))?;

    Ok(Json(json!({
        "message": "Task updated successfully",
        "task": task,
    })))
}

/// Delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .task_repository
        .delete(user.id, id)
        .await
        .map_err(|e| {
            error!("Failed to delete task: {}", e);
            ApiError::Internal
        })?;

    if !deleted {
        return Err(ApiError::NotFound("Task"));
    }

    Ok(Json(json!({ "message": "Task deleted successfully" })))
}
