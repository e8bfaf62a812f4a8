/// Role model and database operations
///
/// A role is a named bundle of permissions. Users are granted roles through
/// `role_user` (see [`User::assign_roles`](super::user::User::assign_roles));
/// permissions are attached through `permission_role`.
///
/// The role named [`ADMIN_ROLE`] is special: its holders bypass every policy
/// check.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE roles (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,           -- unique among live rows
///     description TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{permission::Permission, Trashed};

/// Name of the role whose holders are allowed every action
pub const ADMIN_ROLE: &str = "admin";

const ROLE_COLUMNS: &str = "id, name, description, created_at, updated_at, deleted_at";

/// Role model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub description: String,
}

/// Input for updating a role
///
/// Only non-None fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Role {
    /// Creates a new role
    ///
    /// # Errors
    ///
    /// Returns an error if a live role already has this name
    /// (`roles_name_unique`) or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateRole) -> Result<Self, sqlx::Error> {
        let role = sqlx::query_as::<_, Role>(&format!(
            "INSERT INTO roles (name, description) VALUES ($1, $2) RETURNING {ROLE_COLUMNS}"
        ))
        .bind(data.name)
        .bind(data.description)
        .fetch_one(pool)
        .await?;

        Ok(role)
    }

    /// Finds a role by ID under the given soft-delete scope
    pub async fn find_by_id(
        pool: &PgPool,
        id: Uuid,
        scope: Trashed,
    ) -> Result<Option<Self>, sqlx::Error> {
        let role = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1 AND {}",
            scope.clause()
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Finds a live role by name
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        let role = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE name = $1 AND deleted_at IS NULL"
        ))
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Checks whether a live role other than `except` already uses `name`
    pub async fn name_taken(
        pool: &PgPool,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        let (taken,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM roles
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

    /// Lists roles ordered by name
    pub async fn list(pool: &PgPool, scope: Trashed) -> Result<Vec<Self>, sqlx::Error> {
        let roles = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE {} ORDER BY name",
            scope.clause()
        ))
        .fetch_all(pool)
        .await?;

        Ok(roles)
    }

    /// Updates a live role
    ///
    /// Returns None if no live role has this ID.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE roles SET updated_at = NOW()");
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
            " WHERE id = $1 AND deleted_at IS NULL RETURNING {ROLE_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Role>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }

        q.fetch_optional(pool).await
    }

    /// Soft-deletes a live role
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE roles SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Restores a soft-deleted role
    ///
    /// # Errors
    ///
    /// Fails with a unique violation if a live role took the name meanwhile.
    pub async fn restore(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE roles SET deleted_at = NULL, updated_at = NOW() WHERE id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Permanently deletes a role and its user/permission associations
    pub async fn force_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Live permissions attached to a role
    pub async fn permissions(pool: &PgPool, role_id: Uuid) -> Result<Vec<Permission>, sqlx::Error> {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.id, p.name, p.description, p.created_at, p.updated_at, p.deleted_at
            FROM permissions p
            JOIN permission_role pr ON pr.permission_id = p.id
            WHERE pr.role_id = $1 AND p.deleted_at IS NULL
            ORDER BY p.name
            "#,
        )
        .bind(role_id)
        .fetch_all(pool)
        .await?;

        Ok(permissions)
    }

    /// Attaches permissions to a role
    ///
    /// Already-attached permissions are skipped. Returns the number of new
    /// associations.
    pub async fn attach_permissions(
        pool: &PgPool,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO permission_role (permission_id, role_id)
            SELECT permission_id, $2 FROM UNNEST($1::uuid[]) AS t(permission_id)
            ON CONFLICT (permission_id, role_id) DO NOTHING
            "#,
        )
        .bind(permission_ids)
        .bind(role_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Detaches permissions from a role
    ///
    /// Missing associations are ignored. Returns the number removed.
    pub async fn detach_permissions(
        pool: &PgPool,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM permission_role WHERE role_id = $1 AND permission_id = ANY($2)",
        )
        .bind(role_id)
        .bind(permission_ids)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Returns the ids in `ids` that do not name a live role
    pub async fn missing_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx::Error> {
        let missing: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT t.id
            FROM UNNEST($1::uuid[]) AS t(id)
            WHERE NOT EXISTS (
                SELECT 1 FROM roles r WHERE r.id = t.id AND r.deleted_at IS NULL
            )
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(missing.into_iter().map(|(id,)| id).collect())
    }
}
