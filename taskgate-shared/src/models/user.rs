/// User model and database operations
///
/// This module provides the User model, CRUD operations, and the
/// `role_user` association used to grant roles.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,          -- unique on LOWER(email)
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
///
/// CREATE TABLE role_user (
///     role_id UUID NOT NULL REFERENCES roles (id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
///     PRIMARY KEY (role_id, user_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskgate_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         name: "Jane Doe".to_string(),
///         email: "jane@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     },
/// )
/// .await?;
///
/// let roles = User::role_names(&pool, user.id).await?;
/// assert!(roles.is_empty());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{role::Role, Trashed};

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at, deleted_at";

/// User model representing an authenticatable principal
///
/// Passwords are stored as Argon2id hashes and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address, stored lower-case
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Display name
    pub name: String,

    /// Email address (normalized to lower-case on insert)
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already taken (unique constraint
    /// `users_email_unique`) or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, LOWER($2), $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID under the given soft-delete scope
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use taskgate_shared::models::{user::User, Trashed};
    /// # use sqlx::PgPool;
    /// # use uuid::Uuid;
    /// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    /// if let Some(user) = User::find_by_id(&pool, user_id, Trashed::Without).await? {
    ///     println!("Found user: {}", user.email);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn find_by_id(
        pool: &PgPool,
        id: Uuid,
        scope: Trashed,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND {}",
            scope.clause()
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address (case-insensitive) under the given scope
    pub async fn find_by_email(
        pool: &PgPool,
        email: &str,
        scope: Trashed,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1) AND {}",
            scope.clause()
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Checks whether any user row (live or trashed) holds this email
    pub async fn email_taken(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let (taken,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(pool)
                .await?;

        Ok(taken)
    }

    /// Soft-deletes a live user
    ///
    /// Returns false if no live user has this ID.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Restores a soft-deleted user
    pub async fn restore(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NULL, updated_at = NOW() WHERE id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Permanently deletes a user
    ///
    /// ⚠️  Cascades to the user's tasks and role associations.
    pub async fn force_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Names of the live roles held by a user
    ///
    /// This is what the policy engine sees: a soft-deleted role grants nothing.
    pub async fn role_names(pool: &PgPool, user_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
        let names: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT r.name
            FROM roles r
            JOIN role_user ru ON ru.role_id = r.id
            WHERE ru.user_id = $1 AND r.deleted_at IS NULL
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(names.into_iter().map(|(name,)| name).collect())
    }

    /// Live roles held by a user
    pub async fn roles(pool: &PgPool, user_id: Uuid) -> Result<Vec<Role>, sqlx::Error> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.name, r.description, r.created_at, r.updated_at, r.deleted_at
            FROM roles r
            JOIN role_user ru ON ru.role_id = r.id
            WHERE ru.user_id = $1 AND r.deleted_at IS NULL
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(roles)
    }

    /// Grants roles to a user
    ///
    /// Existing associations are left untouched, so repeating the call is a
    /// no-op. Returns the number of new associations.
    pub async fn assign_roles(
        pool: &PgPool,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO role_user (role_id, user_id)
            SELECT role_id, $2 FROM UNNEST($1::uuid[]) AS t(role_id)
            ON CONFLICT (role_id, user_id) DO NOTHING
            "#,
        )
        .bind(role_ids)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Revokes roles from a user
    ///
    /// Ids with no matching association are ignored. Returns the number of
    /// associations removed.
    pub async fn remove_roles(
        pool: &PgPool,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM role_user WHERE user_id = $1 AND role_id = ANY($2)")
            .bind(user_id)
            .bind(role_ids)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Checks whether a user holds a live role with the given name
    pub async fn has_role(pool: &PgPool, user_id: Uuid, role: &str) -> Result<bool, sqlx::Error> {
        let (held,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM roles r
                JOIN role_user ru ON ru.role_id = r.id
                WHERE ru.user_id = $1 AND r.name = $2 AND r.deleted_at IS NULL
            )
            "#,
        )
        .bind(user_id)
        .bind(role)
        .fetch_one(pool)
        .await?;

        Ok(held)
    }
}
