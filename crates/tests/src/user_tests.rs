use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{self, PASSWORD};

#[tokio::test]
async fn admin_manages_accounts() {
    let t = common::test_app().await;
    let admin = t.admin().await;

    let (status, created) = t
        .post(
            "/api/users",
            json!({ "email": "tech@example.com", "password": PASSWORD, "display_name": "Tech", "role": "Maintenance" }),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["role"], "maintenance");
    let id = created["id"].as_i64().unwrap();

    let (status, list) = t.get("/api/users?role=maintenance", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["meta"]["total"], 1);
    assert_eq!(list["data"][0]["email"], "tech@example.com");

    let (status, updated) = t
        .patch(&format!("/api/users/{id}/role"), json!({ "role": "admin" }), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["role"], "admin");

    let (status, _) = t.delete(&format!("/api/users/{id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = t.get(&format!("/api/users/{id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(
        t.count("SELECT COUNT(*) FROM audit_logs WHERE action IN ('user.create', 'user.role_change', 'user.delete')")
            .await,
        3
    );
}

#[tokio::test]
async fn invalid_role_is_rejected() {
    let t = common::test_app().await;
    let admin = t.admin().await;

    let (status, body) = t
        .post(
            "/api/users",
            json!({ "email": "x@example.com", "password": PASSWORD, "display_name": "X", "role": "bondsman" }),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["role"].is_string());
}

#[tokio::test]
async fn admin_cannot_delete_self() {
    let t = common::test_app().await;
    let (id, admin) = t.user("self@example.com", "admin").await;

    let (status, body) = t.delete(&format!("/api/users/{id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You cannot delete your own account");
}

#[tokio::test]
async fn maintenance_can_list_but_not_create() {
    let t = common::test_app().await;
    let (_, tech) = t.user("tech@example.com", "maintenance").await;

    let (status, _) = t.get("/api/users", Some(&tech)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t
        .post(
            "/api/users",
            json!({ "email": "y@example.com", "password": PASSWORD, "display_name": "Y", "role": "client" }),
            Some(&tech),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
