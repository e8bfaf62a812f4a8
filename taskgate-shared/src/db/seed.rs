/// Startup seeding
///
/// Guarantees the `admin` role exists and, when credentials are supplied,
/// that an administrator account holds it. Running the seed repeatedly
/// changes nothing after the first run.

use sqlx::PgPool;
use tracing::info;

use crate::{
    auth::password::hash_password,
    models::{
        role::{CreateRole, Role, ADMIN_ROLE},
        user::{CreateUser, User},
        Trashed,
    },
};

/// Credentials for the bootstrap administrator
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Ensures the `admin` role exists and returns it
pub async fn ensure_admin_role(pool: &PgPool) -> anyhow::Result<Role> {
    if let Some(role) = Role::find_by_name(pool, ADMIN_ROLE).await? {
        return Ok(role);
    }

    let role = Role::create(
        pool,
        CreateRole {
            name: ADMIN_ROLE.to_string(),
            description: "Full access to every resource".to_string(),
        },
    )
    .await?;

    info!(role_id = %role.id, "Created admin role");
    Ok(role)
}

/// Seeds the admin role and, if given, the bootstrap administrator
///
/// An existing user with the seed email keeps their password; only the role
/// grant is (re)applied. A soft-deleted holder of the email is restored.
pub async fn seed(pool: &PgPool, admin: Option<&AdminSeed>) -> anyhow::Result<()> {
    let role = ensure_admin_role(pool).await?;

    let Some(admin) = admin else {
        return Ok(());
    };

    let user = match User::find_by_email(pool, &admin.email, Trashed::With).await? {
        Some(user) if user.deleted_at.is_some() => {
            User::restore(pool, user.id).await?;
            info!(user_id = %user.id, email = %user.email, "Restored admin user");
            user
        }
        Some(user) => user,
        None => {
            let user = User::create(
                pool,
                CreateUser {
                    name: admin.name.clone(),
                    email: admin.email.clone(),
                    password_hash: hash_password(&admin.password)?,
                },
            )
            .await?;

            info!(user_id = %user.id, email = %user.email, "Created admin user");
            user
        }
    };

    if User::assign_roles(pool, user.id, &[role.id]).await? > 0 {
        info!(user_id = %user.id, "Granted admin role");
    }

    Ok(())
}
