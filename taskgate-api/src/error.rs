/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers should return `Result<T, ApiError>` which automatically
/// converts to appropriate HTTP status codes.
///
/// Every error body carries a `message`. Validation failures add an
/// `errors` object keyed by field:
///
/// ```json
/// {
///   "message": "The name field is required. (and 1 more error)",
///   "errors": {
///     "name": ["The name field is required."],
///     "description": ["The description field is required."]
///   }
/// }
/// ```
///
/// # Example
///
/// ```no_run
/// use taskgate_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler() -> ApiResult<Json<Value>> {
///     Err(ApiError::NotFound("Task not found.".to_string()))
/// }
/// ```

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use taskgate_shared::auth::{
    jwt::JwtError,
    middleware::{AuthError, UNAUTHENTICATED},
    password::PasswordError,
    policy::PolicyDenied,
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Validation messages keyed by field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400); also used when a row to update or delete is missing
    BadRequest(String),

    /// Unauthorized (401) - failed login
    Unauthorized(String),

    /// Forbidden (403) - policy denial or missing authentication
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - unique constraint that slipped past validation
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(FieldErrors),

    /// Request body, query or path could not be decoded
    MalformedRequest { status: StatusCode, message: String },

    /// Internal server error (500)
    InternalError(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub message: String,

    /// Per-field validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::MalformedRequest { status, .. } => *status,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Single-field validation failure
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = ValidationFailures::new();
        errors.add(field, message);
        ApiError::ValidationError(errors.into_inner())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} fields", errors.len())
            }
            ApiError::MalformedRequest { message, .. } => write!(f, "Malformed request: {}", message),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::ValidationError(errors) => ErrorResponse {
                message: summarize(&errors),
                errors: Some(errors),
            },
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                ErrorResponse {
                    message: "An internal error occurred".to_string(),
                    errors: None,
                }
            }
            ApiError::BadRequest(message)
            | ApiError::Unauthorized(message)
            | ApiError::Forbidden(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message)
            | ApiError::MalformedRequest { message, .. } => ErrorResponse {
                message,
                errors: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// First message, plus a count of the rest
fn summarize(errors: &FieldErrors) -> String {
    let mut messages = errors.values().flatten();

    let Some(first) = messages.next() else {
        return "The given data was invalid.".to_string();
    };

    match messages.count() {
        0 => first.clone(),
        1 => format!("{} (and 1 more error)", first),
        n => format!("{} (and {} more errors)", first, n),
    }
}

/// Accumulates validation messages across checks
///
/// Collects derive-based `validator` results and hand-written checks that
/// need the database (uniqueness, existence) into one 422 response.
#[derive(Debug, Default, Clone)]
pub struct ValidationFailures {
    fields: FieldErrors,
}

impl ValidationFailures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a `validator` derive and collects its messages
    pub fn check<T: validator::Validate>(payload: &T) -> Self {
        match payload.validate() {
            Ok(()) => Self::new(),
            Err(errors) => Self::from(&errors),
        }
    }

    /// Adds a message for `field`
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// True if `field` already has a message
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_inner(self) -> FieldErrors {
        self.fields
    }

    /// Ok if nothing was collected, otherwise a 422
    pub fn into_result(self) -> ApiResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ValidationError(self.fields))
        }
    }
}

impl From<&validator::ValidationErrors> for ValidationFailures {
    fn from(errors: &validator::ValidationErrors) -> Self {
        let mut failures = Self::new();

        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("The {} field is invalid.", field));
                failures.add(&field.to_string(), message);
            }
        }

        failures
    }
}

/// Convert validator errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(ValidationFailures::from(&errors).into_inner())
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found.".to_string()),
            sqlx::Error::Database(db_err) => {
                use sqlx::error::ErrorKind;

                match db_err.kind() {
                    ErrorKind::UniqueViolation => {
                        let constraint = db_err.constraint().unwrap_or_default();
                        if constraint.contains("email") {
                            ApiError::Conflict("Email already exists".to_string())
                        } else {
                            ApiError::Conflict(format!("Constraint violation: {}", constraint))
                        }
                    }
                    ErrorKind::ForeignKeyViolation => ApiError::Conflict(
                        "Referenced record does not exist".to_string(),
                    ),
                    _ => ApiError::InternalError(format!("Database error: {}", db_err)),
                }
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Policy denials carry their own message
impl From<PolicyDenied> for ApiError {
    fn from(denied: PolicyDenied) -> Self {
        ApiError::Forbidden(denied.message)
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::DatabaseError(e) => {
                ApiError::InternalError(format!("Authentication lookup failed: {}", e))
            }
            other => {
                tracing::debug!(reason = %other, "Rejected unauthenticated request");
                ApiError::Forbidden(UNAUTHENTICATED.to_string())
            }
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(_) => {
                ApiError::InternalError(format!("Token creation failed: {}", err))
            }
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => {
                ApiError::Unauthorized("Invalid token issuer".to_string())
            }
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::MalformedRequest {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::MalformedRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
