use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod error;
mod jwt;
mod middleware;
mod models;
mod password;
mod repositories;
mod routes;
mod state;
mod validation;

use common::database::{DatabaseConfig, health_check, init_pool};
use tokio::net::TcpListener;

use crate::{
    jwt::{JwtConfig, JwtService},
    repositories::{UserRepository, task::TaskRepository},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    info!("Starting task API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Apply pending migrations
    sqlx::migrate!().run(&pool).await?;
    info!("Database migrations applied");

    // Initialize JWT service
    let jwt_config = JwtConfig::from_env()?;
    let jwt_service = JwtService::new(&jwt_config);

    // Initialize repositories
    let user_repository = UserRepository::new(pool.clone());
    let task_repository = TaskRepository::new(pool);

    let app_state = AppState {
        jwt_service,
        user_repository,
        task_repository,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5001".to_string());
    let listener = TcpListener::bind(&addr).await?;
    info!("Task API service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
