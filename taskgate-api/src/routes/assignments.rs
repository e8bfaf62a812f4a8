/// Role↔permission and user↔role associations
///
/// Attaching and assigning are idempotent. Every id they receive must name a
/// live row, otherwise nothing is written and the request fails with 422.
///
/// Detaching and removing only delete matching join rows. Ids with no
/// association (unknown or trashed rows included) are a no-op, so a trashed
/// permission can still be detached.
///
/// # Endpoints
///
/// - `GET /v1/roles/:id/permissions` - Permissions of a role
/// - `POST /v1/roles/:id/permissions` - Attach `permission_ids`
/// - `DELETE /v1/roles/permissions` - Detach `permission_ids` from `role_id`
/// - `GET /v1/users/:user_id/roles` - Roles of a user
/// - `POST /v1/users/:user_id/roles` - Assign `role_ids`
/// - `DELETE /v1/users/:user_id/roles` - Remove `role_ids`

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationFailures},
    extract::{JsonBody, PathParams},
};
use taskgate_shared::{
    auth::{middleware::Principal, policy::Ability},
    models::{permission::Permission, role::Role, user::User, Trashed},
};

const ROLE_NOT_FOUND: &str = "Role not found.";
const USER_NOT_FOUND: &str = "User not found.";

/// Attach payload
#[derive(Debug, Deserialize, Validate)]
pub struct AttachPermissionsRequest {
    #[serde(default)]
    #[validate(
        required(message = "The permission ids field is required."),
        length(min = 1, message = "The permission ids field is required.")
    )]
    pub permission_ids: Option<Vec<Uuid>>,
}

/// Detach payload
#[derive(Debug, Deserialize, Validate)]
pub struct DetachPermissionsRequest {
    #[serde(default)]
    #[validate(required(message = "The role id field is required."))]
    pub role_id: Option<Uuid>,

    #[serde(default)]
    #[validate(
        required(message = "The permission ids field is required."),
        length(min = 1, message = "The permission ids field is required.")
    )]
    pub permission_ids: Option<Vec<Uuid>>,
}

/// Assign and remove payload
#[derive(Debug, Deserialize, Validate)]
pub struct RoleIdsRequest {
    #[serde(default)]
    #[validate(
        required(message = "The role ids field is required."),
        length(min = 1, message = "The role ids field is required.")
    )]
    pub role_ids: Option<Vec<Uuid>>,
}

/// Adds a 422 message unless every permission id names a live permission
async fn check_permissions(
    state: &AppState,
    ids: &[Uuid],
    failures: &mut ValidationFailures,
) -> ApiResult<()> {
    let missing = Permission::missing_ids(&state.db, ids).await?;
    if !missing.is_empty() {
        tracing::debug!(missing = ?missing, "Unknown permission ids");
        failures.add("permission_ids", "The selected permission ids are invalid.");
    }
    Ok(())
}

/// Adds a 422 message unless every role id names a live role
async fn check_roles(
    state: &AppState,
    ids: &[Uuid],
    failures: &mut ValidationFailures,
) -> ApiResult<()> {
    let missing = Role::missing_ids(&state.db, ids).await?;
    if !missing.is_empty() {
        tracing::debug!(missing = ?missing, "Unknown role ids");
        failures.add("role_ids", "The selected role ids are invalid.");
    }
    Ok(())
}

/// Validates an assign payload; every id must name a live role
async fn assignable_role_ids(state: &AppState, payload: RoleIdsRequest) -> ApiResult<Vec<Uuid>> {
    let mut failures = ValidationFailures::check(&payload);
    let ids = payload.role_ids.unwrap_or_default();

    if failures.is_empty() {
        check_roles(state, &ids, &mut failures).await?;
    }
    failures.into_result()?;

    Ok(ids)
}

async fn load_role(state: &AppState, id: Uuid) -> ApiResult<Role> {
    Role::find_by_id(&state.db, id, Trashed::Without)
        .await?
        .ok_or_else(|| ApiError::NotFound(ROLE_NOT_FOUND.to_string()))
}

async fn load_user(state: &AppState, id: Uuid) -> ApiResult<User> {
    User::find_by_id(&state.db, id, Trashed::Without)
        .await?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))
}

/// Lists the live permissions attached to a role
pub async fn role_permissions(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(role_id): PathParams<Uuid>,
) -> ApiResult<Json<Value>> {
    let role = load_role(&state, role_id).await?;
    principal.authorize(Ability::View, &role)?;

    let permissions = Role::permissions(&state.db, role.id).await?;

    Ok(Json(json!({ "role": role, "permissions": permissions })))
}

/// Attaches permissions to a role
pub async fn attach_permissions(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(role_id): PathParams<Uuid>,
    JsonBody(payload): JsonBody<AttachPermissionsRequest>,
) -> ApiResult<Json<Value>> {
    let role = load_role(&state, role_id).await?;
    principal.authorize(Ability::AttachPermission, &role)?;

    let mut failures = ValidationFailures::check(&payload);
    let ids = payload.permission_ids.unwrap_or_default();
    if failures.is_empty() {
        check_permissions(&state, &ids, &mut failures).await?;
    }
    failures.into_result()?;

    let attached = Role::attach_permissions(&state.db, role.id, &ids).await?;
    tracing::info!(role_id = %role.id, attached, by = %principal.user_id, "Attached permissions");

    let permissions = Role::permissions(&state.db, role.id).await?;

    Ok(Json(json!({
        "message": "Permissions attached.",
        "role": role,
        "permissions": permissions,
    })))
}

/// Detaches permissions from a role
///
/// Authorizes before validating: the role is named in the body.
pub async fn detach_permissions(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    JsonBody(payload): JsonBody<DetachPermissionsRequest>,
) -> ApiResult<Json<Value>> {
    principal.authorize_type::<Role>(Ability::DetachPermission)?;

    ValidationFailures::check(&payload).into_result()?;
    let ids = payload.permission_ids.unwrap_or_default();

    let role_id = payload
        .role_id
        .ok_or_else(|| ApiError::invalid("role_id", "The role id field is required."))?;
    let role = load_role(&state, role_id).await?;

    let detached = Role::detach_permissions(&state.db, role.id, &ids).await?;
    tracing::info!(role_id = %role.id, detached, by = %principal.user_id, "Detached permissions");

    let permissions = Role::permissions(&state.db, role.id).await?;

    Ok(Json(json!({
        "message": "Permissions detached.",
        "role": role,
        "permissions": permissions,
    })))
}

/// Lists the live roles a user holds
pub async fn user_roles(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(user_id): PathParams<Uuid>,
) -> ApiResult<Json<Value>> {
    principal.authorize_type::<Role>(Ability::ViewAny)?;

    let user = load_user(&state, user_id).await?;
    let roles = User::roles(&state.db, user.id).await?;

    Ok(Json(json!({ "user": user, "roles": roles })))
}

/// Assigns roles to a user
pub async fn assign_roles(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(user_id): PathParams<Uuid>,
    JsonBody(payload): JsonBody<RoleIdsRequest>,
) -> ApiResult<Json<Value>> {
    let user = load_user(&state, user_id).await?;
    principal.authorize_type::<Role>(Ability::AssignRole)?;

    let ids = assignable_role_ids(&state, payload).await?;

    let assigned = User::assign_roles(&state.db, user.id, &ids).await?;
    tracing::info!(user_id = %user.id, assigned, by = %principal.user_id, "Assigned roles");

    let roles = User::roles(&state.db, user.id).await?;

    Ok(Json(json!({ "message": "Roles assigned.", "user": user, "roles": roles })))
}

/// Removes roles from a user
pub async fn remove_roles(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(user_id): PathParams<Uuid>,
    JsonBody(payload): JsonBody<RoleIdsRequest>,
) -> ApiResult<Json<Value>> {
    let user = load_user(&state, user_id).await?;
    principal.authorize_type::<Role>(Ability::RemoveRole)?;

    ValidationFailures::check(&payload).into_result()?;
    let ids = payload.role_ids.unwrap_or_default();

    let removed = User::remove_roles(&state.db, user.id, &ids).await?;
    tracing::info!(user_id = %user.id, removed, by = %principal.user_id, "Removed roles");

    let roles = User::roles(&state.db, user.id).await?;

    Ok(Json(json!({ "message": "Roles removed.", "user": user, "roles": roles })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_id_lists_are_rejected() {
        let attach: AttachPermissionsRequest =
            serde_json::from_value(json!({ "permission_ids": [] })).unwrap();
        let failures = ValidationFailures::check(&attach).into_inner();
        assert_eq!(
            failures["permission_ids"],
            vec!["The permission ids field is required."]
        );

        let assign: RoleIdsRequest = serde_json::from_value(json!({})).unwrap();
        let failures = ValidationFailures::check(&assign).into_inner();
        assert_eq!(failures["role_ids"], vec!["The role ids field is required."]);
    }

    #[test]
    fn test_detach_requires_role_id() {
        let detach: DetachPermissionsRequest =
            serde_json::from_value(json!({ "permission_ids": [Uuid::new_v4()] })).unwrap();
        let failures = ValidationFailures::check(&detach).into_inner();

        assert_eq!(failures["role_id"], vec!["The role id field is required."]);
        assert!(!failures.contains_key("permission_ids"));
    }
}
