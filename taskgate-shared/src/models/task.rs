/// Task model and database operations
///
/// A task belongs to exactly one user, who is its owner for authorization
/// purposes.
///
/// # Status
///
/// ```text
/// pending → in_progress → completed
/// ```
///
/// The ordering is conventional, not enforced: any status string up to 50
/// characters is stored as given. Only the move *into* `completed` matters to
/// the rest of the system, and [`Task::update`] reports it through
/// [`TaskUpdate::became_completed`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     status VARCHAR(50) NOT NULL DEFAULT 'pending',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskgate_shared::models::task::{CreateTask, Task, UpdateTask, STATUS_COMPLETED};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     user_id: owner,
///     name: "Write report".to_string(),
///     description: "Quarterly numbers".to_string(),
///     status: None,
/// }).await?;
///
/// let update = UpdateTask {
///     status: Some(STATUS_COMPLETED.to_string()),
///     ..Default::default()
/// };
///
/// if let Some(outcome) = Task::update(&pool, task.id, update).await? {
///     assert!(outcome.became_completed());
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::Trashed;

/// Initial status of a new task
pub const STATUS_PENDING: &str = "pending";

/// Status of a task being worked on
pub const STATUS_IN_PROGRESS: &str = "in_progress";

/// Terminal status; entering it triggers the completion notification
pub const STATUS_COMPLETED: &str = "completed";

const TASK_COLUMNS: &str =
    "id, user_id, name, description, status, created_at, updated_at, deleted_at";

/// Task model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Task name
    pub name: String,

    /// Free-form description
    pub description: String,

    /// Lifecycle status (see module docs)
    pub status: String,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Owning user (must exist)
    pub user_id: Uuid,

    /// Task name
    pub name: String,

    /// Description
    pub description: String,

    /// Initial status (defaults to `pending`)
    pub status: Option<String>,
}

/// Input for updating a task
///
/// Only non-None fields are written. An omitted status keeps the stored one.
/// The owner is fixed at creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New name
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<String>,
}

/// Result of a successful [`Task::update`]
#[derive(Debug, Clone)]
pub struct TaskUpdate {
    /// Task as stored after the update
    pub task: Task,

    /// Status read under row lock before the write
    pub previous_status: String,
}

impl TaskUpdate {
    /// True when this update moved the task into `completed`
    ///
    /// Re-saving an already completed task returns false.
    pub fn became_completed(&self) -> bool {
        self.task.is_completed() && self.previous_status != STATUS_COMPLETED
    }
}

impl Task {
    /// Checks if the task is completed
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    /// Creates a new task
    ///
    /// # Errors
    ///
    /// Returns an error if `user_id` references no user (foreign key
    /// violation) or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (user_id, name, description, status)
            VALUES ($1, $2, $3, COALESCE($4, '{STATUS_PENDING}'))
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(data.user_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.status)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID under the given soft-delete scope
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use taskgate_shared::models::{task::Task, Trashed};
    /// # use sqlx::PgPool;
    /// # use uuid::Uuid;
    /// # async fn example(pool: PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    /// // Restore looks only at trashed rows
    /// let task = Task::find_by_id(&pool, id, Trashed::Only).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn find_by_id(
        pool: &PgPool,
        id: Uuid,
        scope: Trashed,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND {}",
            scope.clause()
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks, newest first
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `scope` - Soft-delete visibility
    /// * `owner` - Restrict to one user's tasks; None lists every task
    pub async fn list(
        pool: &PgPool,
        scope: Trashed,
        owner: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE {} AND ($1::uuid IS NULL OR user_id = $1)
            ORDER BY created_at DESC
            "#,
            scope.clause()
        ))
        .bind(owner)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Updates a live task
    ///
    /// The prior status is read with `SELECT ... FOR UPDATE` in the same
    /// transaction as the write, so two concurrent updates to `completed`
    /// cannot both observe a non-completed prior status.
    ///
    /// # Returns
    ///
    /// The stored task plus its prior status, or None if no live task has
    /// this ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<TaskUpdate>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let previous: Option<(String,)> = sqlx::query_as(
            "SELECT status FROM tasks WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((previous_status,)) = previous else {
            tx.rollback().await?;
            return Ok(None);
        };

        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TASK_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }

        let task = q.fetch_one(&mut *tx).await?;
        tx.commit().await?;

        Ok(Some(TaskUpdate {
            task,
            previous_status,
        }))
    }

    /// Soft-deletes a live task
    ///
    /// Returns false if no live task has this ID.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Restores a soft-deleted task
    ///
    /// Returns false if the task is not in the trash.
    pub async fn restore(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET deleted_at = NULL, updated_at = NOW() WHERE id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Permanently deletes a task, live or trashed
    pub async fn force_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
