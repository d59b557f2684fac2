//! Application state shared across handlers

use crate::{
    jwt::JwtService,
    repositories::{UserRepository, task::TaskRepository},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub jwt_service: JwtService,
    pub user_repository: UserRepository,
    pub task_repository: TaskRepository,
}
