//! Repositories for database operations

use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{NewUser, User};

pub mod task;

fn user_from_row(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// User repository for database operations
///
/// Emails are normalized to lowercase on every write and lookup, which is
/// what makes the unique index case-insensitive in practice.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user; the password hash is computed by the caller
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (email, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, password_hash, created_at, updated_at
            "#,
        )
        .bind(new_user.email.to_lowercase())
        .bind(&new_user.name)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(&row))
    }

    /// Find a user by email (case-insensitive)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Overwrite a user's name and email; the caller has already merged the
    /// requested changes with the current values
    pub async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: &str,
    ) -> Result<User> {
        let row = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, updated_at = now()
            WHERE id = $1
            RETURNING id, email, name, password_hash, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email.to_lowercase())
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(&row))
    }
}
