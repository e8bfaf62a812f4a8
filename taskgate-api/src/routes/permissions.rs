/// Permission endpoints
///
/// Same shape and rules as roles: open reads, admin-only writes.

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
        permission::{CreatePermission, Permission, UpdatePermission},
        Trashed,
    },
};

const NOT_FOUND: &str = "Permission not found.";

async fn validate(state: &AppState, payload: &NamedPayload, except: Option<Uuid>) -> ApiResult<()> {
    let mut failures = ValidationFailures::check(payload);

    if let Some(name) = payload.name.as_deref() {
        if !failures.has("name") && Permission::name_taken(&state.db, name, except).await? {
            failures.add("name", NAME_TAKEN);
        }
    }

    failures.into_result()
}

pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<Value>> {
    principal.authorize_type::<Permission>(Ability::ViewAny)?;

    let permissions = Permission::list(&state.db, query.trashed).await?;

    Ok(Json(json!({ "permissions": permissions })))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Value>> {
    let permission = Permission::find_by_id(&state.db, id, Trashed::Without)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    principal.authorize(Ability::View, &permission)?;

    Ok(Json(json!({ "permission": permission })))
}

pub async fn store(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    JsonBody(payload): JsonBody<NamedPayload>,
) -> ApiResult<Json<Value>> {
    principal.authorize_type::<Permission>(Ability::Create)?;
    validate(&state, &payload, None).await?;

    let (Some(name), Some(description)) = (payload.name, payload.description) else {
        return Err(ApiError::BadRequest("Incomplete permission".to_string()));
    };

    let permission = Permission::create(&state.db, CreatePermission { name, description }).await?;

    tracing::info!(
        permission_id = %permission.id,
        name = %permission.name,
        by = %principal.user_id,
        "Created permission"
    );

    Ok(Json(json!({ "message": "Permission added.", "permission": permission })))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(id): PathParams<Uuid>,
    JsonBody(payload): JsonBody<NamedPayload>,
) -> ApiResult<Json<Value>> {
    let permission = Permission::find_by_id(&state.db, id, Trashed::Without)
        .await?
        .ok_or_else(|| ApiError::BadRequest(NOT_FOUND.to_string()))?;

    principal.authorize(Ability::Update, &permission)?;
    validate(&state, &payload, Some(permission.id)).await?;

    let permission = Permission::update(
        &state.db,
        permission.id,
        UpdatePermission {
            name: payload.name,
            description: payload.description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::BadRequest(NOT_FOUND.to_string()))?;

    Ok(Json(json!({ "message": "Permission updated.", "permission": permission })))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Value>> {
    let permission = Permission::find_by_id(&state.db, id, Trashed::Without)
        .await?
        .ok_or_else(|| ApiError::BadRequest(NOT_FOUND.to_string()))?;

    principal.authorize(Ability::Delete, &permission)?;

    if !Permission::soft_delete(&state.db, permission.id).await? {
        return Err(ApiError::BadRequest(NOT_FOUND.to_string()));
    }

    tracing::info!(permission_id = %permission.id, by = %principal.user_id, "Deleted permission");

    Ok(Json(json!({ "message": "Permission deleted." })))
}

pub async fn restore(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Value>> {
    let permission = Permission::find_by_id(&state.db, id, Trashed::Only)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    principal.authorize(Ability::Restore, &permission)?;

    if Permission::name_taken(&state.db, &permission.name, Some(permission.id)).await? {
        return Err(ApiError::invalid("name", NAME_TAKEN));
    }

    Permission::restore(&state.db, permission.id).await?;

    Ok(Json(json!({ "message": "Permission restored." })))
}

pub async fn force_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Value>> {
    let permission = Permission::find_by_id(&state.db, id, Trashed::With)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    principal.authorize(Ability::ForceDelete, &permission)?;

    Permission::force_delete(&state.db, permission.id).await?;

    tracing::info!(permission_id = %permission.id, by = %principal.user_id, "Force deleted permission");

    Ok(Json(json!({ "message": "Permission deleted permanently." })))
}
