/// Authentication endpoints
///
/// This module provides user authentication endpoints:
/// - Registration
/// - Login
/// - Token refresh
/// - Current principal
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Refresh access token
/// - `GET /v1/auth/me` - Current user and role names (authenticated)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationFailures},
    extract::{blank_as_none, JsonBody},
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use taskgate_shared::{
    auth::{jwt, middleware::Principal, password},
    models::{
        user::{CreateUser, User},
        Trashed,
    },
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        required(message = "The name field is required."),
        length(max = 255, message = "The name field must not be greater than 255 characters.")
    )]
    pub name: Option<String>,

    /// Email address
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address.")
    )]
    pub email: Option<String>,

    /// Password
    #[serde(default)]
    #[validate(
        required(message = "The password field is required."),
        length(min = 8, message = "The password field must be at least 8 characters.")
    )]
    pub password: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(required(message = "The email field is required."))]
    pub email: Option<String>,

    /// Password
    #[serde(default)]
    #[validate(required(message = "The password field is required."))]
    pub password: Option<String>,
}

/// Tokens issued on register and login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// The authenticated user
    pub user: User,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Current principal response
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,

    /// Names of the live roles the user holds
    pub roles: Vec<String>,
}

fn issue_tokens(state: &AppState, user: User) -> ApiResult<TokenResponse> {
    let access_claims = jwt::Claims::new(user.id, jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user.id, jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    Ok(TokenResponse {
        user,
        access_token,
        refresh_token,
    })
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@example.com",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "user": { "id": "uuid", "name": "Ada Lovelace", "email": "ada@example.com", ... },
///   "access_token": "eyJ...",
///   "refresh_token": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed or email already taken
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let mut failures = ValidationFailures::check(&req);

    if let Some(email) = req.email.as_deref() {
        if !failures.has("email") && User::email_taken(&state.db, email).await? {
            failures.add("email", "The email has already been taken.");
        }
    }
    failures.into_result()?;

    let (Some(name), Some(email), Some(plain)) = (req.name, req.email, req.password) else {
        return Err(ApiError::BadRequest("Incomplete registration".to_string()));
    };

    let password_hash = password::hash_password(&plain)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name,
            email,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Registered user");

    Ok(Json(issue_tokens(&state, user)?))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.com",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Missing fields
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let (Some(email), Some(plain)) = (req.email, req.password) else {
        return Err(invalid());
    };

    // Find user by email
    let user = User::find_by_email(&state.db, &email, Trashed::Without)
        .await?
        .ok_or_else(invalid)?;

    // Verify password
    if !password::verify_password(&plain, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected");
        return Err(invalid());
    }

    Ok(Json(issue_tokens(&state, user)?))
}

/// Token refresh endpoint
///
/// Exchanges a refresh token for a new access token.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Current user and role names
pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<MeResponse>> {
    let user = User::find_by_id(&state.db, principal.user_id, Trashed::Without)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    Ok(Json(MeResponse {
        user,
        roles: principal.roles,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request(json: serde_json::Value) -> RegisterRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_register_validation_messages() {
        let failures = ValidationFailures::check(&register_request(serde_json::json!({
            "email": "not-an-email",
            "password": "short"
        })))
        .into_inner();

        assert_eq!(failures["name"], vec!["The name field is required."]);
        assert_eq!(
            failures["email"],
            vec!["The email field must be a valid email address."]
        );
        assert_eq!(
            failures["password"],
            vec!["The password field must be at least 8 characters."]
        );
    }

    #[test]
    fn test_valid_register_request() {
        let request = register_request(serde_json::json!({
            "name": "Ada",
            "email": "ada@example.com",
            "password": "long-enough"
        }));

        assert!(request.validate().is_ok());
    }
}
