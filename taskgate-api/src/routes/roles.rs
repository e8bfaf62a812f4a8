/// Role endpoints
///
/// Anyone authenticated may read roles; every change is admin-only.
///
/// # Endpoints
///
/// - `GET /v1/roles` - List
/// - `POST /v1/roles` - Create
/// - `GET /v1/roles/:id` - Fetch
/// - `PUT /v1/roles/:id` - Update
/// - `DELETE /v1/roles/:id` - Soft-delete
/// - `PUT /v1/roles/:id/restore` - Restore
/// - `DELETE /v1/roles/:id/force` - Delete permanently

use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationFailures},
    extract::{JsonBody, PathParams, QueryParams},
    routes::{ListQuery, NamedPayload, NAME_TAKEN},
};
use taskgate_shared::{
    auth::{middleware::Principal, policy::Ability},
    models::{
        role::{CreateRole, Role, UpdateRole},
        Trashed,
    },
};

const NOT_FOUND: &str = "Role not found.";

async fn validate(state: &AppState, payload: &NamedPayload, except: Option<Uuid>) -> ApiResult<()> {
    let mut failures = ValidationFailures::check(payload);

    if let Some(name) = payload.name.as_deref() {
        if !failures.has("name") && Role::name_taken(&state.db, name, except).await? {
            failures.add("name", NAME_TAKEN);
        }
    }

    failures.into_result()
}

/// Lists roles
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<Value>> {
    principal.authorize_type::<Role>(Ability::ViewAny)?;

    let roles = Role::list(&state.db, query.trashed).await?;

    Ok(Json(json!({ "roles": roles })))
}

/// Fetches one role
pub async fn show(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Value>> {
    let role = Role::find_by_id(&state.db, id, Trashed::Without)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    principal.authorize(Ability::View, &role)?;

    Ok(Json(json!({ "role": role })))
}

/// Creates a role
pub async fn store(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    JsonBody(payload): JsonBody<NamedPayload>,
) -> ApiResult<Json<Value>> {
    principal.authorize_type::<Role>(Ability::Create)?;
    validate(&state, &payload, None).await?;

    let (Some(name), Some(description)) = (payload.name, payload.description) else {
        return Err(ApiError::BadRequest("Incomplete role".to_string()));
    };

    let role = Role::create(&state.db, CreateRole { name, description }).await?;

    tracing::info!(role_id = %role.id, name = %role.name, by = %principal.user_id, "Created role");

    Ok(Json(json!({ "message": "Role added.", "role": role })))
}

/// Updates a role
pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(id): PathParams<Uuid>,
    JsonBody(payload): JsonBody<NamedPayload>,
) -> ApiResult<Json<Value>> {
    let role = Role::find_by_id(&state.db, id, Trashed::Without)
        .await?
        .ok_or_else(|| ApiError::BadRequest(NOT_FOUND.to_string()))?;

    principal.authorize(Ability::Update, &role)?;
    validate(&state, &payload, Some(role.id)).await?;

    let role = Role::update(
        &state.db,
        role.id,
        UpdateRole {
            name: payload.name,
            description: payload.description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::BadRequest(NOT_FOUND.to_string()))?;

    tracing::info!(role_id = %role.id, by = %principal.user_id, "Updated role");

    Ok(Json(json!({ "message": "Role updated.", "role": role })))
}

/// Soft-deletes a role
///
/// Holders of a trashed role lose it until it is restored.
pub async fn destroy(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Value>> {
    let role = Role::find_by_id(&state.db, id, Trashed::Without)
        .await?
        .ok_or_else(|| ApiError::BadRequest(NOT_FOUND.to_string()))?;

    principal.authorize(Ability::Delete, &role)?;

    if !Role::soft_delete(&state.db, role.id).await? {
        return Err(ApiError::BadRequest(NOT_FOUND.to_string()));
    }

    tracing::info!(role_id = %role.id, by = %principal.user_id, "Deleted role");

    Ok(Json(json!({ "message": "Role deleted." })))
}

/// Restores a soft-deleted role
///
/// # Errors
///
/// - `404 Not Found`: no trashed role with this ID
/// - `422 Unprocessable Entity`: a live role took the name meanwhile
pub async fn restore(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Value>> {
    let role = Role::find_by_id(&state.db, id, Trashed::Only)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    principal.authorize(Ability::Restore, &role)?;

    if Role::name_taken(&state.db, &role.name, Some(role.id)).await? {
        return Err(ApiError::invalid("name", NAME_TAKEN));
    }

    Role::restore(&state.db, role.id).await?;

    tracing::info!(role_id = %role.id, by = %principal.user_id, "Restored role");

    Ok(Json(json!({ "message": "Role restored." })))
}

/// Permanently deletes a role and its associations
pub async fn force_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Value>> {
    let role = Role::find_by_id(&state.db, id, Trashed::With)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    principal.authorize(Ability::ForceDelete, &role)?;

    Role::force_delete(&state.db, role.id).await?;

    tracing::info!(role_id = %role.id, by = %principal.user_id, "Force deleted role");

    Ok(Json(json!({ "message": "Role deleted permanently." })))
}
