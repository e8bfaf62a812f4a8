/// Task endpoints
///
/// Every handler authorizes before it touches data. Row-scoped actions load
/// the row first and authorize against it, so a non-owner gets the policy
/// message rather than a validation error.
///
/// # Endpoints
///
/// - `GET /v1/tasks` - List (admins see all tasks, others their own)
/// - `GET /v1/users/:user_id/tasks` - List one user's tasks
/// - `POST /v1/tasks` - Create
/// - `GET /v1/tasks/:id` - Fetch
/// - `PUT /v1/tasks/:id` - Update name, description and status; moving into
///   `completed` notifies the owner. The owner never changes.
/// - `DELETE /v1/tasks/:id` - Soft-delete
/// - `PUT /v1/tasks/:id/restore` - Restore
/// - `DELETE /v1/tasks/:id/force` - Delete permanently

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationFailures},
    extract::{blank_as_none, JsonBody, PathParams, QueryParams},
    routes::ListQuery,
};
use taskgate_shared::{
    auth::{middleware::Principal, policy::Ability},
    events::TaskCompleted,
    models::{
        task::{CreateTask, Task, UpdateTask},
        user::User,
        Trashed,
    },
};

const NOT_FOUND: &str = "Task not found.";

/// Create payload
#[derive(Debug, Deserialize, Validate)]
pub struct TaskPayload {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        required(message = "The name field is required."),
        length(max = 255, message = "The name field must not be greater than 255 characters.")
    )]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(required(message = "The description field is required."))]
    pub description: Option<String>,

    /// Owner of the task
    #[serde(default)]
    #[validate(required(message = "The user id field is required."))]
    pub user_id: Option<Uuid>,

    /// Lifecycle status; omitted keeps the stored value (or `pending` on create)
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 50, message = "The status field must not be greater than 50 characters."))]
    pub status: Option<String>,
}

/// Update payload
///
/// Same rules as [`TaskPayload`] without the owner; a `user_id` in the body
/// is ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskPayload {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        required(message = "The name field is required."),
        length(max = 255, message = "The name field must not be greater than 255 characters.")
    )]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(required(message = "The description field is required."))]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 50, message = "The status field must not be greater than 50 characters."))]
    pub status: Option<String>,
}

/// Validates the payload, including that `user_id` names a live user
async fn validate(state: &AppState, payload: &TaskPayload) -> ApiResult<()> {
    let mut failures = ValidationFailures::check(payload);

    if let Some(user_id) = payload.user_id {
        if User::find_by_id(&state.db, user_id, Trashed::Without)
            .await?
            .is_none()
        {
            failures.add("user_id", "The selected user id is invalid.");
        }
    }

    failures.into_result()
}

async fn load(state: &AppState, id: Uuid, scope: Trashed) -> ApiResult<Option<Task>> {
    Ok(Task::find_by_id(&state.db, id, scope).await?)
}

/// Lists tasks visible to the caller
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<Value>> {
    principal.authorize_type::<Task>(Ability::ViewAny)?;

    let owner = if principal.is_admin() {
        None
    } else {
        Some(principal.user_id)
    };

    let tasks = Task::list(&state.db, query.trashed, owner).await?;

    Ok(Json(json!({ "tasks": tasks })))
}

/// Lists one user's tasks
///
/// Non-admins may only ask for their own.
pub async fn list_for_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(user_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<Value>> {
    principal.authorize_type::<Task>(Ability::ViewAny)?;

    if user_id != principal.user_id && !principal.is_admin() {
        return Err(ApiError::Forbidden(
            "You can only view your own tasks.".to_string(),
        ));
    }

    let tasks = Task::list(&state.db, query.trashed, Some(user_id)).await?;

    Ok(Json(json!({ "tasks": tasks })))
}

/// Fetches one task
pub async fn show(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Value>> {
    let task = load(&state, id, Trashed::Without)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    principal.authorize(Ability::View, &task)?;

    Ok(Json(json!({ "task": task })))
}

/// Creates a task
pub async fn store(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    JsonBody(payload): JsonBody<TaskPayload>,
) -> ApiResult<Json<Value>> {
    principal.authorize_type::<Task>(Ability::Create)?;
    validate(&state, &payload).await?;

    let (Some(name), Some(description), Some(user_id)) =
        (payload.name, payload.description, payload.user_id)
    else {
        return Err(ApiError::BadRequest("Incomplete task".to_string()));
    };

    let task = Task::create(
        &state.db,
        CreateTask {
            user_id,
            name,
            description,
            status: payload.status,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, user_id = %task.user_id, by = %principal.user_id, "Created task");

    Ok(Json(json!({ "message": "Task added", "tasks": task })))
}

/// Updates a task
///
/// Fires [`TaskCompleted`] after commit when this update moved the task
/// into `completed`. Re-saving a completed task fires nothing.
pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(id): PathParams<Uuid>,
    JsonBody(payload): JsonBody<UpdateTaskPayload>,
) -> ApiResult<Json<Value>> {
    let task = load(&state, id, Trashed::Without)
        .await?
        .ok_or_else(|| ApiError::BadRequest(NOT_FOUND.to_string()))?;

    principal.authorize(Ability::Update, &task)?;
    ValidationFailures::check(&payload).into_result()?;

    let updated = Task::update(
        &state.db,
        task.id,
        UpdateTask {
            name: payload.name,
            description: payload.description,
            status: payload.status,
        },
    )
    .await?
    .ok_or_else(|| ApiError::BadRequest(NOT_FOUND.to_string()))?;

    if updated.became_completed() {
        tracing::info!(task_id = %updated.task.id, "Task completed");
        state.notifier.task_completed(TaskCompleted {
            task: updated.task.clone(),
        });
    }

    Ok(Json(json!({ "message": "Task updated.", "tasks": updated.task })))
}

/// Soft-deletes a task
pub async fn destroy(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Value>> {
    let task = load(&state, id, Trashed::Without)
        .await?
        .ok_or_else(|| ApiError::BadRequest(NOT_FOUND.to_string()))?;

    principal.authorize(Ability::Delete, &task)?;

    if !Task::soft_delete(&state.db, task.id).await? {
        return Err(ApiError::BadRequest(NOT_FOUND.to_string()));
    }

    tracing::info!(task_id = %task.id, by = %principal.user_id, "Deleted task");

    Ok(Json(json!({ "message": "Task deleted." })))
}

/// Restores a soft-deleted task
pub async fn restore(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Value>> {
    let task = load(&state, id, Trashed::Only)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    principal.authorize(Ability::Restore, &task)?;

    Task::restore(&state.db, task.id).await?;

    tracing::info!(task_id = %task.id, by = %principal.user_id, "Restored task");

    Ok(Json(json!({ "message": "Task restored." })))
}

/// Permanently deletes a task, live or trashed
pub async fn force_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Value>> {
    let task = load(&state, id, Trashed::With)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    principal.authorize(Ability::ForceDelete, &task)?;

    Task::force_delete(&state.db, task.id).await?;

    tracing::info!(task_id = %task.id, by = %principal.user_id, "Force deleted task");

    Ok(Json(json!({ "message": "Task deleted permanently." })))
}
