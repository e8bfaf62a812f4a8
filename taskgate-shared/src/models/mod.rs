/// Database models for TaskGate
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and role membership
/// - `role`: Named permission bundles
/// - `permission`: Named capabilities attached to roles
/// - `task`: Tasks owned by exactly one user
///
/// Every table carries a `deleted_at` column. Reads go through a [`Trashed`]
/// scope so soft-deleted rows stay hidden unless a caller asks for them.
///
/// # Example
///
/// ```no_run
/// use taskgate_shared::models::{task::Task, Trashed};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, id: Uuid) -> Result<(), sqlx::Error> {
/// // Only visible when the task has been soft-deleted
/// let trashed = Task::find_by_id(&pool, id, Trashed::Only).await?;
/// # Ok(())
/// # }
/// ```

pub mod permission;
pub mod role;
pub mod task;
pub mod user;

use serde::{Deserialize, Serialize};

/// Soft-delete visibility scope for queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trashed {
    /// Live rows only (`deleted_at IS NULL`)
    #[default]
    Without,

    /// Live and soft-deleted rows
    With,

    /// Soft-deleted rows only
    Only,
}

impl Trashed {
    /// SQL predicate selecting the rows visible under this scope
    ///
    /// The predicate refers to an unqualified `deleted_at` column.
    pub fn clause(&self) -> &'static str {
        match self {
            Trashed::Without => "deleted_at IS NULL",
            Trashed::With => "TRUE",
            Trashed::Only => "deleted_at IS NOT NULL",
        }
    }
}
