/// Integration tests for the TaskGate API
///
/// These tests drive the full router against a real PostgreSQL database:
/// - Task ownership and the admin bypass
/// - Validation responses
/// - Soft-delete, restore and force-delete scopes
/// - Completion notifications
/// - Role/permission associations
///
/// Each test is skipped when `DATABASE_URL` is unset.

#[allow(dead_code)]
mod common;

use axum::http::{Method, StatusCode};
use common::{unique, TestContext, TestUser};
use serde_json::{json, Value};
use taskgate_shared::models::{role::Role, task::Task, user::User, Trashed};
use uuid::Uuid;

async fn create_task(ctx: &TestContext, owner: Uuid) -> Uuid {
    let (status, body) = ctx
        .post(
            "/v1/tasks",
            &ctx.admin,
            json!({
                "name": unique("task"),
                "description": "Integration test task",
                "user_id": owner,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["tasks"]["id"].as_str().unwrap().parse().unwrap()
}

async fn create_role(ctx: &TestContext) -> Value {
    let (status, body) = ctx
        .post(
            "/v1/roles",
            &ctx.admin,
            json!({ "name": unique("role"), "description": "Test role" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["role"].clone()
}

async fn create_permission(ctx: &TestContext) -> Value {
    let (status, body) = ctx
        .post(
            "/v1/permissions",
            &ctx.admin,
            json!({ "name": unique("permission"), "description": "Test permission" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["permission"].clone()
}

fn ids(list: &Value) -> Vec<String> {
    list.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn test_anonymous_requests_are_unauthenticated() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let (status, body) = ctx.send(Method::GET, "/v1/tasks", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "message": "Unauthenticated." }));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_owner_and_admin_may_update_task() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let task_id = create_task(&ctx, ctx.member.id()).await;
    let uri = format!("/v1/tasks/{}", task_id);

    let (status, body) = ctx
        .put(
            &uri,
            &ctx.member,
            json!({ "name": "Renamed", "description": "By owner", "user_id": ctx.member.id() }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Task updated.");
    assert_eq!(body["tasks"]["name"], "Renamed");

    let (status, body) = ctx
        .put(
            &uri,
            &ctx.admin,
            json!({ "name": "Renamed again", "description": "By admin", "user_id": ctx.member.id() }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["tasks"]["description"], "By admin");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_non_owner_is_denied_with_policy_messages() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let task_id = create_task(&ctx, ctx.member.id()).await;
    let uri = format!("/v1/tasks/{}", task_id);

    let (status, body) = ctx.get(&uri, &ctx.other).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "message": "You can't view task." }));

    // Denial wins over validation: the body is invalid on purpose.
    let (status, body) = ctx.put(&uri, &ctx.other, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can't update task.");

    let (status, body) = ctx.delete(&uri, &ctx.other).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can't delete task.");

    let (status, body) = ctx.get(&format!("/v1/users/{}/tasks", ctx.member.id()), &ctx.other).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can only view your own tasks.");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_task_list_is_scoped_to_owner() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let mine = create_task(&ctx, ctx.member.id()).await.to_string();
    let theirs = create_task(&ctx, ctx.other.id()).await.to_string();

    let (status, body) = ctx.get("/v1/tasks", &ctx.member).await;
    assert_eq!(status, StatusCode::OK);
    let visible = ids(&body["tasks"]);
    assert!(visible.contains(&mine));
    assert!(!visible.contains(&theirs));

    let (_, body) = ctx.get("/v1/tasks", &ctx.admin).await;
    let visible = ids(&body["tasks"]);
    assert!(visible.contains(&mine));
    assert!(visible.contains(&theirs));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_task_validation_errors() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let (status, body) = ctx
        .post("/v1/tasks", &ctx.member, json!({ "name": "", "user_id": ctx.member.id() }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["name"], json!(["The name field is required."]));
    assert_eq!(
        body["errors"]["description"],
        json!(["The description field is required."])
    );
    assert_eq!(
        body["message"],
        "The description field is required. (and 1 more error)"
    );

    let (status, body) = ctx
        .post(
            "/v1/tasks",
            &ctx.member,
            json!({ "name": "Orphan", "description": "No owner", "user_id": Uuid::new_v4() }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["user_id"], json!(["The selected user id is invalid."]));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_update_and_destroy_of_missing_task_is_bad_request() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let uri = format!("/v1/tasks/{}", Uuid::new_v4());

    let (status, body) = ctx
        .put(&uri, &ctx.admin, json!({ "name": "x", "description": "y", "user_id": ctx.admin.id() }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Task not found.");

    let (status, _) = ctx.delete(&uri, &ctx.admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx.get(&uri, &ctx.admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_soft_delete_restore_and_force_delete() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let task_id = create_task(&ctx, ctx.member.id()).await;
    let uri = format!("/v1/tasks/{}", task_id);

    let (status, body) = ctx.delete(&uri, &ctx.member).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted.");

    let (status, _) = ctx.get(&uri, &ctx.member).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = ctx.get("/v1/tasks?trashed=only", &ctx.member).await;
    assert!(ids(&body["tasks"]).contains(&task_id.to_string()));

    let (status, body) = ctx
        .send(Method::PUT, &format!("{}/restore", uri), Some(&ctx.member), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Task restored.");

    let (status, _) = ctx
        .send(Method::PUT, &format!("{}/restore", uri), Some(&ctx.member), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "live rows cannot be restored");

    let (status, body) = ctx.delete(&format!("{}/force", uri), &ctx.member).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted permanently.");

    let gone = Task::find_by_id(&ctx.db, task_id, Trashed::With).await.unwrap();
    assert!(gone.is_none());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_completion_notifies_exactly_once() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let task_id = create_task(&ctx, ctx.member.id()).await;
    let uri = format!("/v1/tasks/{}", task_id);
    let body = json!({
        "name": "Ship it",
        "description": "Finish the release",
        "user_id": ctx.member.id(),
        "status": "completed",
    });

    let (status, response) = ctx.put(&uri, &ctx.member, body.clone()).await;
    assert_eq!(status, StatusCode::OK, "{}", response);
    assert_eq!(response["tasks"]["status"], "completed");
    assert_eq!(ctx.notifier.count_for(task_id), 1);

    // Re-saving a completed task does not notify again.
    let (status, _) = ctx.put(&uri, &ctx.member, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.notifier.count_for(task_id), 1);

    // Omitting status keeps it completed and stays silent.
    let (status, response) = ctx
        .put(
            &uri,
            &ctx.member,
            json!({ "name": "Ship it", "description": "Edited", "user_id": ctx.member.id() }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["tasks"]["status"], "completed");
    assert_eq!(ctx.notifier.count_for(task_id), 1);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_role_writes_are_admin_only() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let name = unique("editor");

    let (status, body) = ctx
        .post("/v1/roles", &ctx.member, json!({ "name": name, "description": "Edits" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can't update roles.");

    let (status, body) = ctx
        .post("/v1/roles", &ctx.admin, json!({ "name": name, "description": "Edits" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Role added.");
    assert_eq!(body["role"]["name"], name.as_str());

    let (status, body) = ctx
        .post("/v1/roles", &ctx.admin, json!({ "name": name, "description": "Again" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["name"], json!(["The name has already been taken."]));

    let role_id = role_id_by_name(&ctx, &name).await;
    let (status, body) = ctx.delete(&format!("/v1/roles/{}", role_id), &ctx.member).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can't delete roles.");

    let (status, _) = ctx.get(&format!("/v1/roles/{}", role_id), &ctx.member).await;
    assert_eq!(status, StatusCode::OK, "reads stay open to members");

    let (status, _) = ctx.delete(&format!("/v1/roles/{}/force", role_id), &ctx.admin).await;
    assert_eq!(status, StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

async fn role_id_by_name(ctx: &TestContext, role_name: &str) -> Uuid {
    Role::find_by_name(&ctx.db, role_name)
        .await
        .unwrap()
        .map(|role| role.id)
        .unwrap()
}

#[tokio::test]
async fn test_permission_crud_and_restore() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let permission = create_permission(&ctx).await;
    let uri = format!("/v1/permissions/{}", permission["id"].as_str().unwrap());

    let (status, body) = ctx
        .put(&uri, &ctx.admin, json!({ "name": permission["name"], "description": "Updated" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Permission updated.");
    assert_eq!(body["permission"]["description"], "Updated");

    let (status, body) = ctx.delete(&uri, &ctx.admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Permission deleted.");

    let (_, body) = ctx.get("/v1/permissions?trashed=with", &ctx.admin).await;
    assert!(ids(&body["permissions"]).contains(&permission["id"].as_str().unwrap().to_string()));

    let (status, body) = ctx
        .send(Method::PUT, &format!("{}/restore", uri), Some(&ctx.admin), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Permission restored.");

    let (status, body) = ctx.delete(&format!("{}/force", uri), &ctx.admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Permission deleted permanently.");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_attach_and_detach_permissions() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let role = create_role(&ctx).await;
    let permission = create_permission(&ctx).await;
    let role_id = role["id"].as_str().unwrap();
    let permission_id = permission["id"].as_str().unwrap();
    let uri = format!("/v1/roles/{}/permissions", role_id);

    let (status, body) = ctx
        .post(&uri, &ctx.member, json!({ "permission_ids": [permission_id] }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can't attach permissions to a role.");

    // Attaching twice leaves a single association.
    for _ in 0..2 {
        let (status, body) = ctx
            .post(&uri, &ctx.admin, json!({ "permission_ids": [permission_id] }))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(ids(&body["permissions"]), vec![permission_id.to_string()]);
    }

    let (status, body) = ctx
        .post(&uri, &ctx.admin, json!({ "permission_ids": [Uuid::new_v4()] }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["errors"]["permission_ids"],
        json!(["The selected permission ids are invalid."])
    );

    let detach = json!({ "role_id": role_id, "permission_ids": [permission_id] });
    let (status, body) = ctx
        .send(Method::DELETE, "/v1/roles/permissions", Some(&ctx.member), Some(detach.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can't detach permissions from a role.");

    let (status, body) = ctx
        .send(Method::DELETE, "/v1/roles/permissions", Some(&ctx.admin), Some(detach))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(ids(&body["permissions"]).is_empty());

    for uri in [
        format!("/v1/roles/{}/force", role_id),
        format!("/v1/permissions/{}/force", permission_id),
    ] {
        let (status, _) = ctx.delete(&uri, &ctx.admin).await;
        assert_eq!(status, StatusCode::OK);
    }

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_assign_and_remove_roles() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let role = create_role(&ctx).await;
    let role_id = role["id"].as_str().unwrap();
    let uri = format!("/v1/users/{}/roles", ctx.member.id());

    let (status, body) = ctx
        .post(&uri, &ctx.other, json!({ "role_ids": [role_id] }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can't assign roles.");

    let (status, body) = ctx.post(&uri, &ctx.admin, json!({ "role_ids": [role_id] })).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(ids(&body["roles"]), vec![role_id.to_string()]);

    let (status, body) = ctx.get(&uri, &ctx.admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["roles"]), vec![role_id.to_string()]);

    let (status, body) = ctx
        .send(Method::DELETE, &uri, Some(&ctx.other), Some(json!({ "role_ids": [role_id] })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can't remove roles.");

    let (status, body) = ctx
        .send(Method::DELETE, &uri, Some(&ctx.admin), Some(json!({ "role_ids": [role_id] })))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(ids(&body["roles"]).is_empty());

    let (status, body) = ctx
        .post(
            &format!("/v1/users/{}/roles", Uuid::new_v4()),
            &ctx.admin,
            json!({ "role_ids": [role_id] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found.");

    let (status, _) = ctx.delete(&format!("/v1/roles/{}/force", role_id), &ctx.admin).await;
    assert_eq!(status, StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let email = format!("register-{}@example.com", Uuid::new_v4());
    let payload = json!({ "name": "New User", "email": email, "password": "correct-horse-battery" });

    let (status, body) = ctx
        .send(Method::POST, "/v1/auth/register", None, Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["access_token"].is_string());
    let user_id: Uuid = body["user"]["id"].as_str().unwrap().parse().unwrap();

    let (status, body) = ctx
        .send(Method::POST, "/v1/auth/register", None, Some(payload))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["email"], json!(["The email has already been taken."]));

    User::force_delete(&ctx.db, user_id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_edit_pages_require_update_rights() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let task_id = create_task(&ctx, ctx.member.id()).await;

    let (status, body) = ctx.get(&format!("/tasks/{}/edit", task_id), &ctx.member).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["component"], "tasks/EditTaskForm");
    assert_eq!(body["props"]["task"]["id"], task_id.to_string());

    let (status, body) = ctx.get(&format!("/tasks/{}/edit", task_id), &ctx.other).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can't update task.");

    let (status, body) = ctx.get("/roles/create", &ctx.member).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["component"], "roles/AddRoleForm");
    assert_eq!(body["url"], "/roles/create");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_issued_tokens_reach_protected_routes() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let (status, body) = ctx.get("/v1/auth/me", &ctx.admin).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["user"]["id"], ctx.admin.id().to_string());
    assert_eq!(body["roles"], json!(["admin"]));

    let email = format!("login-{}@example.com", Uuid::new_v4());
    let password = "correct-horse-battery";
    let (status, body) = ctx
        .send(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({ "name": "Login User", "email": email, "password": password })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, body) = ctx
        .send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let user_id: Uuid = body["user"]["id"].as_str().unwrap().parse().unwrap();
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

    let logged_in = TestUser {
        user: User::find_by_id(&ctx.db, user_id, Trashed::Without)
            .await
            .unwrap()
            .unwrap(),
        token: body["access_token"].as_str().unwrap().to_string(),
    };

    let (status, body) = ctx.get("/v1/tasks", &logged_in).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["tasks"], json!([]));

    let (status, body) = ctx
        .send(
            Method::POST,
            "/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let refreshed = TestUser {
        user: logged_in.user.clone(),
        token: body["access_token"].as_str().unwrap().to_string(),
    };

    let (status, body) = ctx.get("/v1/auth/me", &refreshed).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["user"]["email"], email.as_str());

    User::force_delete(&ctx.db, user_id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_status_change_other_than_completed_is_silent() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let task_id = create_task(&ctx, ctx.member.id()).await;
    let uri = format!("/v1/tasks/{}", task_id);

    let (status, body) = ctx
        .put(
            &uri,
            &ctx.member,
            json!({ "name": "Started", "description": "Work begun", "status": "in_progress" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["tasks"]["status"], "in_progress");
    assert_eq!(ctx.notifier.count_for(task_id), 0);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_update_never_changes_owner() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let task_id = create_task(&ctx, ctx.member.id()).await;
    let uri = format!("/v1/tasks/{}", task_id);

    for user in [&ctx.member, &ctx.admin] {
        let (status, body) = ctx
            .put(
                &uri,
                user,
                json!({ "name": "Handed off", "description": "Try to reassign", "user_id": ctx.other.id() }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["tasks"]["user_id"], ctx.member.id().to_string());
    }

    let (status, _) = ctx.get(&uri, &ctx.member).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.get(&uri, &ctx.other).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_admin_may_restore_and_force_delete_any_task() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let task_id = create_task(&ctx, ctx.member.id()).await;
    let uri = format!("/v1/tasks/{}", task_id);

    let (status, _) = ctx.delete(&uri, &ctx.member).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .send(Method::PUT, &format!("{}/restore", uri), Some(&ctx.other), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can't restore task.");

    let (status, body) = ctx
        .send(Method::PUT, &format!("{}/restore", uri), Some(&ctx.admin), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Task restored.");

    let (status, body) = ctx.delete(&format!("{}/force", uri), &ctx.other).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can't force delete a task.");

    let (status, body) = ctx.delete(&format!("{}/force", uri), &ctx.admin).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Task deleted permanently.");

    let gone = Task::find_by_id(&ctx.db, task_id, Trashed::With).await.unwrap();
    assert!(gone.is_none());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_detach_and_remove_of_absent_associations_are_no_ops() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let role = create_role(&ctx).await;
    let permission = create_permission(&ctx).await;
    let role_id: Uuid = role["id"].as_str().unwrap().parse().unwrap();
    let permission_id: Uuid = permission["id"].as_str().unwrap().parse().unwrap();

    let (status, body) = ctx
        .post(
            &format!("/v1/roles/{}/permissions", role_id),
            &ctx.admin,
            json!({ "permission_ids": [permission_id] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    // A trashed permission keeps its join row until detached.
    let (status, _) = ctx
        .delete(&format!("/v1/permissions/{}", permission_id), &ctx.admin)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .send(
            Method::DELETE,
            "/v1/roles/permissions",
            Some(&ctx.admin),
            Some(json!({ "role_id": role_id, "permission_ids": [permission_id, Uuid::new_v4()] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (joined,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM permission_role WHERE role_id = $1")
            .bind(role_id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(joined, 0);

    let (status, body) = ctx
        .send(
            Method::DELETE,
            &format!("/v1/users/{}/roles", ctx.member.id()),
            Some(&ctx.admin),
            Some(json!({ "role_ids": [Uuid::new_v4()] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(ids(&body["roles"]).is_empty());

    for uri in [
        format!("/v1/roles/{}/force", role_id),
        format!("/v1/permissions/{}/force", permission_id),
    ] {
        let (status, _) = ctx.delete(&uri, &ctx.admin).await;
        assert_eq!(status, StatusCode::OK);
    }

    ctx.cleanup().await.unwrap();
}
