/// Front-end page handlers
///
/// Each handler picks a component and its props and hands them to the
/// configured [`PageRenderer`](crate::pages::PageRenderer). Data is loaded by
/// the front end through the JSON API; edit pages check `update` first so a
/// user never sees a form they cannot submit.

use axum::{
    extract::{OriginalUri, State},
    response::Response,
    Extension,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::PathParams,
    pages::Page,
};
use taskgate_shared::{
    auth::{middleware::Principal, policy::Ability},
    models::{role::Role, task::Task, user::User, Trashed},
};

fn render(state: &AppState, page: Page) -> Response {
    state.pages.render(page)
}

pub async fn task_index(State(state): State<AppState>, OriginalUri(uri): OriginalUri) -> Response {
    render(&state, Page::new("tasks/ListTasks", uri.path()))
}

pub async fn task_create(State(state): State<AppState>, OriginalUri(uri): OriginalUri) -> Response {
    render(&state, Page::new("tasks/AddTaskForm", uri.path()))
}

pub async fn task_show(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    PathParams(id): PathParams<Uuid>,
) -> Response {
    render(&state, Page::new("tasks/ShowTask", uri.path()).with("task_id", id))
}

/// Edit form for a task the caller may update
pub async fn task_edit(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    OriginalUri(uri): OriginalUri,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Response> {
    let task = Task::find_by_id(&state.db, id, Trashed::Without)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found.".to_string()))?;

    principal.authorize(Ability::Update, &task)?;

    Ok(render(
        &state,
        Page::new("tasks/EditTaskForm", uri.path()).with("task", &task),
    ))
}

pub async fn role_index(State(state): State<AppState>, OriginalUri(uri): OriginalUri) -> Response {
    render(&state, Page::new("roles/ListRoles", uri.path()))
}

pub async fn role_create(State(state): State<AppState>, OriginalUri(uri): OriginalUri) -> Response {
    render(&state, Page::new("roles/AddRoleForm", uri.path()))
}

pub async fn role_show(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    PathParams(id): PathParams<Uuid>,
) -> Response {
    render(&state, Page::new("roles/ShowRole", uri.path()).with("role_id", id))
}

/// Edit form for a role; admin-only
pub async fn role_edit(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    OriginalUri(uri): OriginalUri,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Response> {
    let role = Role::find_by_id(&state.db, id, Trashed::Without)
        .await?
        .ok_or_else(|| ApiError::NotFound("Role not found.".to_string()))?;

    principal.authorize(Ability::Update, &role)?;

    Ok(render(
        &state,
        Page::new("roles/EditRoleForm", uri.path()).with("role", &role),
    ))
}

pub async fn role_assign_permissions(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    PathParams(id): PathParams<Uuid>,
) -> Response {
    render(
        &state,
        Page::new("roles/AssignPermissionToRole", uri.path()).with("role_id", id),
    )
}

pub async fn user_assign_roles(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Response> {
    let user = User::find_by_id(&state.db, id, Trashed::Without)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    Ok(render(
        &state,
        Page::new("roles/AssignRoleToUser", uri.path())
            .with("user_id", user.id)
            .with("user_name", &user.name),
    ))
}

pub async fn permission_index(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    render(&state, Page::new("permissions/ListPermissions", uri.path()))
}

pub async fn permission_create(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    render(&state, Page::new("permissions/AddPermissionForm", uri.path()))
}

pub async fn permission_show(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    PathParams(id): PathParams<Uuid>,
) -> Response {
    render(
        &state,
        Page::new("permissions/ShowPermission", uri.path()).with("permission_id", id),
    )
}

pub async fn permission_edit(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    PathParams(id): PathParams<Uuid>,
) -> Response {
    render(
        &state,
        Page::new("permissions/EditPermissionForm", uri.path()).with("permission_id", id),
    )
}
