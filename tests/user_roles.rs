//! User role assignment integration tests.

mod common;

use common::{names, TestApp};
use serde_json::{json, Value};

#[tokio::test]
async fn assign_role_returns_held_roles() {
    let app = TestApp::spawn().await;
    let nurse = app.create_role("nurse", &[]).await;
    let chaplain = app.create_role("chaplain", &[]).await;
    assert_status!(app.assign_role(21, nurse).await, 201);

    let response = app.assign_role(21, chaplain).await;

    assert_status!(response, 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user_id"], 21);
    assert_eq!(names(&body["roles"]), vec!["chaplain", "nurse"]);
}

#[tokio::test]
async fn assigning_a_held_role_again_is_idempotent() {
    let app = TestApp::spawn().await;
    let nurse = app.create_role("nurse", &[]).await;
    assert_status!(app.assign_role(22, nurse).await, 201);

    let response = app.assign_role(22, nurse).await;

    assert_status!(response, 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(names(&body["roles"]), vec!["nurse"]);
}

#[tokio::test]
async fn assign_missing_role_returns_404() {
    let app = TestApp::spawn().await;

    let response = app.assign_role(23, 4242).await;

    assert_status!(response, 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "ROLE_NOT_FOUND");
}

#[tokio::test]
async fn user_without_roles_has_empty_lists() {
    let app = TestApp::spawn().await;

    let roles = app.json("/users/99/roles").await;
    let permissions = app.json("/users/99/permissions").await;

    assert_eq!(roles["roles"], json!([]));
    assert_eq!(permissions["permissions"], json!([]));
}

#[tokio::test]
async fn user_permissions_are_union_of_roles() {
    let app = TestApp::spawn().await;
    let view = app.create_permission("view_patient").await;
    let edit = app.create_permission("edit_care_plan").await;
    let meds = app.create_permission("administer_medication").await;
    let nurse = app.create_role("nurse", &[view, meds]).await;
    let case_manager = app.create_role("case_manager", &[view, edit]).await;
    assert_status!(app.assign_role(24, nurse).await, 201);
    assert_status!(app.assign_role(24, case_manager).await, 201);

    let body = app.json("/users/24/permissions").await;

    assert_eq!(body["user_id"], 24);
    assert_eq!(
        names(&body["permissions"]),
        vec!["administer_medication", "edit_care_plan", "view_patient"]
    );
}

#[tokio::test]
async fn revoke_role_removes_its_permissions() {
    let app = TestApp::spawn().await;
    let view = app.create_permission("view_patient").await;
    let nurse = app.create_role("nurse", &[view]).await;
    assert_status!(app.assign_role(25, nurse).await, 201);

    let response = app.delete(&format!("/users/25/roles/{}", nurse)).await;

    assert_status!(response, 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Role revoked successfully.");

    let permissions = app.json("/users/25/permissions").await;
    assert_eq!(permissions["permissions"], json!([]));

    let check: Value = app
        .post(
            "/permissions/check",
            json!({ "user_id": 25, "permission": "view_patient" }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(check["allowed"], false);
}

#[tokio::test]
async fn revoke_unheld_role_returns_404() {
    let app = TestApp::spawn().await;
    let nurse = app.create_role("nurse", &[]).await;

    let response = app.delete(&format!("/users/26/roles/{}", nurse)).await;

    assert_status!(response, 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "USER_ROLE_NOT_FOUND");
}

#[tokio::test]
async fn role_permission_changes_reach_assigned_users() {
    let app = TestApp::spawn().await;
    let view = app.create_permission("view_patient").await;
    let edit = app.create_permission("edit_care_plan").await;
    let nurse = app.create_role("nurse", &[view]).await;
    assert_status!(app.assign_role(27, nurse).await, 201);

    let response = app
        .put(&format!("/role/{}", nurse), json!({ "permissions": [edit] }))
        .await;
    assert_status!(response, 200);

    let body = app.json("/users/27/permissions").await;
    assert_eq!(names(&body["permissions"]), vec!["edit_care_plan"]);
}

#[tokio::test]
async fn malformed_user_path_uses_error_shape() {
    let app = TestApp::spawn().await;

    let response = app.get("/users/nobody/roles").await;
    assert_status!(response, 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_PATH");

    let response = app.delete("/users/1/roles/xyz").await;
    assert_status!(response, 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_PATH");
}
