//! Task repository for database operations
//!
//! Every query here is scoped to the owning user's id. A task that exists
//! but belongs to someone else is reported exactly like a task that does
//! not exist.

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::models::task::{NewTask, Task, TaskChanges, TaskPriority, TaskQuery, TaskStatus};

const TASK_COLUMNS: &str =
    "id, title, description, status, priority, due_date, user_id, created_at, updated_at";

fn task_from_row(row: &PgRow) -> Result<Task> {
    let status: String = row.get("status");
    let priority: String = row.get("priority");

    Ok(Task {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        status: status
            .parse()
            .map_err(|e: String| anyhow::anyhow!("Corrupt status column: {}", e))?,
        priority: priority
            .parse()
            .map_err(|e: String| anyhow::anyhow!("Corrupt priority column: {}", e))?,
        due_date: row.get("due_date"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Escape LIKE wildcards in a user-supplied search term
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Task repository
#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    /// Create a new task repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List a user's tasks with optional filters, newest first
    ///
    /// Returns the page of rows plus the total count under the same filter.
    /// Unrecognized status/priority filter values are ignored.
    pub async fn list(&self, user_id: Uuid, query: &TaskQuery) -> Result<(Vec<Task>, i64)> {
        let status = query
            .status
            .as_deref()
            .and_then(|s| s.parse::<TaskStatus>().ok());
        let priority = query
            .priority
            .as_deref()
            .and_then(|p| p.parse::<TaskPriority>().ok());
        let search = query
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let page = query.page();
        let limit = query.limit();
        let offset = (page - 1) as i64 * limit as i64;

        let sql = format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE user_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR priority = $3)
              AND ($4::text IS NULL OR title ILIKE $4 OR description ILIKE $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(status.map(|s| s.as_str()))
            .bind(priority.map(|p| p.as_str()))
            .bind(&search)
            .bind(limit as i64)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM tasks
            WHERE user_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR priority = $3)
              AND ($4::text IS NULL OR title ILIKE $4 OR description ILIKE $4)
            "#,
        )
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .bind(priority.map(|p| p.as_str()))
        .bind(&search)
        .fetch_one(&self.pool)
        .await?;

        let tasks = rows
            .iter()
            .map(task_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok((tasks, total))
    }

    /// Find a task by ID within the user's scope
    pub async fn find_by_id(&self, user_id: Uuid, task_id: Uuid) -> Result<Option<Task>> {
        let sql = format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE id = $1 AND user_id = $2
            "#
        );

        let row = sqlx::query(&sql)
            .bind(task_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(task_from_row).transpose()
    }

    /// Create a new task owned by the user
    pub async fn create(&self, user_id: Uuid, new_task: &NewTask) -> Result<Task> {
        let sql = format!(
            r#"
            INSERT INTO tasks (title, description, status, priority, due_date, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(&new_task.title)
            .bind(&new_task.description)
            .bind(new_task.status.as_str())
            .bind(new_task.priority.as_str())
            .bind(new_task.due_date)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        task_from_row(&row)
    }

    /// Apply a merge-patch to a task within the user's scope
    ///
    /// Returns `Ok(None)` when the task is absent or owned by someone else.
    pub async fn update(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        changes: &TaskChanges,
    ) -> Result<Option<Task>> {
        let Some(existing) = self.find_by_id(user_id, task_id).await? else {
            return Ok(None);
        };

        let title = changes.title.clone().unwrap_or(existing.title);
        let description = changes
            .description
            .clone()
            .unwrap_or(existing.description);
        let status = changes.status.unwrap_or(existing.status);
        let priority = changes.priority.unwrap_or(existing.priority);
        let due_date = changes.due_date.unwrap_or(existing.due_date);

        let sql = format!(
            r#"
            UPDATE tasks
            SET title = $3, description = $4, status = $5, priority = $6,
                due_date = $7, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {TASK_COLUMNS}
            "#
        );

        // The task can disappear between the read and the write; a missing
        // row here reports the same way as a missing task.
        let row = sqlx::query(&sql)
            .bind(task_id)
            .bind(user_id)
            .bind(&title)
            .bind(&description)
            .bind(status.as_str())
            .bind(priority.as_str())
            .bind(due_date)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(task_from_row).transpose()
    }

    /// Delete a task within the user's scope; immediate and unrecoverable
    pub async fn delete(&self, user_id: Uuid, task_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM tasks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::repositories::UserRepository;

    #[test]
    fn test_escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("50%_done"), "50\\%\\_done");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }

    // The tests below exercise the ownership invariants against a real
    // database. They need a migrated PostgreSQL with DATABASE_URL set, so
    // they are ignored by default.

    async fn test_pool() -> PgPool {
        let config = common::database::DatabaseConfig::from_env().unwrap();
        common::database::init_pool(&config).await.unwrap()
    }

    async fn test_user(pool: &PgPool) -> Uuid {
        let users = UserRepository::new(pool.clone());
        let user = users
            .create(&NewUser {
                email: format!("{}@test.local", Uuid::new_v4()),
                name: None,
                password_hash: "unused".to_string(),
            })
            .await
            .unwrap();
        user.id
    }

    fn buy_milk() -> NewTask {
        NewTask {
            title: "Buy milk".to_string(),
            description: None,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            due_date: None,
        }
    }

    #[tokio::test]
    #[ignore = "requires a migrated PostgreSQL instance"]
    async fn test_tasks_are_isolated_per_user() {
        let pool = test_pool().await;
        let repo = TaskRepository::new(pool.clone());
        let alice = test_user(&pool).await;
        let bob = test_user(&pool).await;

        let task = repo.create(alice, &buy_milk()).await.unwrap();

        // Bob cannot see, mutate, or delete Alice's task
        assert!(repo.find_by_id(bob, task.id).await.unwrap().is_none());
        assert!(
            repo.update(bob, task.id, &TaskChanges::default())
                .await
                .unwrap()
                .is_none()
        );
        assert!(!repo.delete(bob, task.id).await.unwrap());

        let (tasks, total) = repo.list(bob, &TaskQuery::default()).await.unwrap();
        assert!(tasks.iter().all(|t| t.id != task.id));
        let _ = total;

        // Alice still can
        assert!(repo.find_by_id(alice, task.id).await.unwrap().is_some());
        assert!(repo.delete(alice, task.id).await.unwrap());

        // A vanished row degrades to absent, not an error
        let update_after_delete = repo
            .update(alice, task.id, &TaskChanges::default())
            .await
            .unwrap();
        assert!(update_after_delete.is_none());
    }

    #[tokio::test]
    #[ignore = "requires a migrated PostgreSQL instance"]
    async fn test_update_is_merge_patch() {
        let pool = test_pool().await;
        let repo = TaskRepository::new(pool.clone());
        let owner = test_user(&pool).await;

        let mut new_task = buy_milk();
        new_task.description = Some("two liters".to_string());
        let task = repo.create(owner, &new_task).await.unwrap();

        // Only status supplied: everything else keeps its value
        let changes = TaskChanges {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        let updated = repo.update(owner, task.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.title, "Buy milk");
        assert_eq!(updated.description.as_deref(), Some("two liters"));

        // Explicit null clears a nullable field
        let changes = TaskChanges {
            description: Some(None),
            ..Default::default()
        };
        let updated = repo.update(owner, task.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.description, None);
        assert_eq!(updated.status, TaskStatus::Completed);
    }

    #[tokio::test]
    #[ignore = "requires a migrated PostgreSQL instance"]
    async fn test_create_defaults_and_filtered_list() {
        let pool = test_pool().await;
        let repo = TaskRepository::new(pool.clone());
        let owner = test_user(&pool).await;

        let task = repo.create(owner, &buy_milk()).await.unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::Medium);

        let (tasks, total) = repo.list(owner, &TaskQuery::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(tasks.len(), 1);

        // Case-insensitive substring search over the title
        let query = TaskQuery {
            search: Some("MILK".to_string()),
            ..Default::default()
        };
        let (tasks, total) = repo.list(owner, &query).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(tasks[0].id, task.id);

        // Non-matching status filter excludes it
        let query = TaskQuery {
            status: Some("completed".to_string()),
            ..Default::default()
        };
        let (_, total) = repo.list(owner, &query).await.unwrap();
        assert_eq!(total, 0);

        // Unrecognized filter values are ignored rather than rejected
        let query = TaskQuery {
            status: Some("bogus".to_string()),
            ..Default::default()
        };
        let (_, total) = repo.list(owner, &query).await.unwrap();
        assert_eq!(total, 1);
    }
}
