/// Request authentication
///
/// Resolves the `Authorization: Bearer <token>` header into a [`Principal`]:
/// the token is validated, then the user and the names of their live roles
/// are loaded from the database. Any failure yields [`AuthError`], which
/// renders as `403 {"message": "Unauthenticated."}`.
///
/// # Request Extensions
///
/// The API's auth layer inserts the `Principal` into request extensions, so
/// handlers extract it with `Extension<Principal>`.
///
/// # Example
///
/// ```no_run
/// use axum::{http::HeaderMap, Extension};
/// use taskgate_shared::auth::middleware::{authenticate, Principal};
/// use sqlx::PgPool;
///
/// async fn handler(Extension(principal): Extension<Principal>) -> String {
///     format!("User {} (admin: {})", principal.user_id, principal.is_admin())
/// }
///
/// # async fn example(pool: PgPool, headers: HeaderMap) {
/// let principal = authenticate(&pool, "jwt-secret", &headers).await;
/// # }
/// ```

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::validate_access_token;
use crate::models::{role::ADMIN_ROLE, user::User, Trashed};

/// Message returned for every authentication failure
pub const UNAUTHENTICATED: &str = "Unauthenticated.";

/// The authenticated actor of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Names of the live roles the user holds
    pub roles: Vec<String>,
}

impl Principal {
    pub fn new(user_id: Uuid, roles: Vec<String>) -> Self {
        Self { user_id, roles }
    }

    /// Checks if the principal holds a role by name
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Checks if the principal holds the `admin` role
    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

/// Error type for authentication
///
/// The variants are kept for logging; clients always see the same response.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Header is not `Bearer <token>`
    #[error("Invalid authorization header: {0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token subject has no live user
    #[error("Unknown user {0}")]
    UnknownUser(Uuid),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::DatabaseError(ref e) = self {
            tracing::error!(error = %e, "Authentication lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "An internal error occurred" })),
            )
                .into_response();
        }

        tracing::debug!(reason = %self, "Rejected unauthenticated request");
        (StatusCode::FORBIDDEN, Json(json!({ "message": UNAUTHENTICATED }))).into_response()
    }
}

/// Extracts the bearer token from request headers
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Authenticates a request and loads its principal
///
/// # Errors
///
/// - `MissingCredentials` / `InvalidFormat`: no usable bearer header
/// - `InvalidToken`: bad signature, expired, wrong issuer, or refresh token
/// - `UnknownUser`: the user was deleted (soft or hard) after the token was issued
/// - `DatabaseError`: lookup failed
pub async fn authenticate(
    pool: &PgPool,
    secret: &str,
    headers: &HeaderMap,
) -> Result<Principal, AuthError> {
    let token = bearer_token(headers)?;

    let claims =
        validate_access_token(token, secret).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    let user = User::find_by_id(pool, claims.sub, Trashed::Without)
        .await?
        .ok_or(AuthError::UnknownUser(claims.sub))?;

    let roles = User::role_names(pool, user.id).await?;

    Ok(Principal::new(user.id, roles))
}
