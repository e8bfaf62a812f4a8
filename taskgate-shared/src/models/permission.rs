/// Permission model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE permissions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,           -- unique among live rows
///     description TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
///
/// CREATE TABLE permission_role (
///     permission_id UUID NOT NULL REFERENCES permissions (id) ON DELETE CASCADE,
///     role_id UUID NOT NULL REFERENCES roles (id) ON DELETE CASCADE,
///     PRIMARY KEY (permission_id, role_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskgate_shared::models::permission::{CreatePermission, Permission};
/// use taskgate_shared::models::role::Role;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, role_id: Uuid) -> Result<(), sqlx::Error> {
/// let permission = Permission::create(
///     &pool,
///     CreatePermission {
///         name: "publish-articles".to_string(),
///         description: "Can publish articles".to_string(),
///     },
/// )
/// .await?;
///
/// Role::attach_permissions(&pool, role_id, &[permission.id]).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::Trashed;

const PERMISSION_COLUMNS: &str = "id, name, description, created_at, updated_at, deleted_at";

/// Permission model representing a named capability
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    /// Unique permission ID
    pub id: Uuid,

    /// Capability name, unique among live permissions
    pub name: String,

    /// Human-readable description
    pub description: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a permission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermission {
    pub name: String,
    pub description: String,
}

/// Input for updating a permission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePermission {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Permission {
    /// Creates a new permission
    ///
    /// # Errors
    ///
    /// Returns an error if a live permission already has this name
    /// (`permissions_name_unique`) or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreatePermission) -> Result<Self, sqlx::Error> {
        let permission = sqlx::query_as::<_, Permission>(&format!(
            "INSERT INTO permissions (name, description) VALUES ($1, $2) RETURNING {PERMISSION_COLUMNS}"
        ))
        .bind(data.name)
        .bind(data.description)
        .fetch_one(pool)
        .await?;

        Ok(permission)
    }

    /// Finds a permission by ID under the given soft-delete scope
    ///
    /// # Returns
    ///
    /// The permission if a row matches both the ID and the scope
    pub async fn find_by_id(
        pool: &PgPool,
        id: Uuid,
        scope: Trashed,
    ) -> Result<Option<Self>, sqlx::Error> {
        let permission = sqlx::query_as::<_, Permission>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions WHERE id = $1 AND {}",
            scope.clause()
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(permission)
    }

    /// Checks whether a live permission other than `except` already uses `name`
    pub async fn name_taken(
        pool: &PgPool,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        let (taken,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM permissions
                WHERE name = $1 AND deleted_at IS NULL AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(name)
        .bind(except)
        .fetch_one(pool)
        .await?;

        Ok(taken)
    }

    /// Lists permissions ordered by name
    pub async fn list(pool: &PgPool, scope: Trashed) -> Result<Vec<Self>, sqlx::Error> {
        let permissions = sqlx::query_as::<_, Permission>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions WHERE {} ORDER BY name",
            scope.clause()
        ))
        .fetch_all(pool)
        .await?;

        Ok(permissions)
    }

    /// Updates a live permission
    ///
    /// Only non-None fields in `data` are written. Returns None if no live
    /// permission has this ID.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdatePermission,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE permissions SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND deleted_at IS NULL RETURNING {PERMISSION_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Permission>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }

        q.fetch_optional(pool).await
    }

    /// Soft-deletes a live permission
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE permissions SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Restores a soft-deleted permission
    pub async fn restore(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE permissions SET deleted_at = NULL, updated_at = NOW() WHERE id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Permanently deletes a permission
    ///
    /// ⚠️  Also removes it from every role it was attached to.
    pub async fn force_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns the ids in `ids` that do not name a live permission
    pub async fn missing_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx::Error> {
        let missing: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT t.id
            FROM UNNEST($1::uuid[]) AS t(id)
            WHERE NOT EXISTS (
                SELECT 1 FROM permissions p WHERE p.id = t.id AND p.deleted_at IS NULL
            )
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(missing.into_iter().map(|(id,)| id).collect())
    }
}
