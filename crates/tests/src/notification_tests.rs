use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn inbox_read_and_delete() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let (user_id, token) = t.user("inbox@example.com", "client").await;

    for title in ["First", "Second"] {
        let (status, body) = t
            .post(
                "/api/notifications",
                json!({ "user_id": user_id, "title": title, "message": "Please call the office" }),
                Some(&admin),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["kind"], "system");
    }

    let (_, count) = t.get("/api/notifications/unread-count", Some(&token)).await;
    assert_eq!(count["count"], 2);

    let (_, list) = t.get("/api/notifications", Some(&token)).await;
    assert_eq!(list["data"][0]["title"], "Second");
    let first_id = list["data"][1]["id"].as_str().unwrap().to_string();

    let (status, read) = t
        .post(&format!("/api/notifications/{first_id}/read"), json!({}), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["read"], true);

    let (_, unread) = t.get("/api/notifications?unread_only=true", Some(&token)).await;
    assert_eq!(unread["meta"]["total"], 1);

    let (_, updated) = t.post("/api/notifications/read-all", json!({}), Some(&token)).await;
    assert_eq!(updated["count"], 1);

    let (status, _) = t.delete(&format!("/api/notifications/{first_id}"), Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, list) = t.get("/api/notifications", Some(&token)).await;
    assert_eq!(list["meta"]["total"], 1);
}

#[tokio::test]
async fn other_users_notifications_are_invisible() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let (owner_id, _) = t.user("owner@example.com", "client").await;
    let (_, stranger) = t.user("stranger@example.com", "client").await;

    let (_, note) = t
        .post(
            "/api/notifications",
            json!({ "user_id": owner_id, "kind": "payment", "title": "Hi", "message": "Private" }),
            Some(&admin),
        )
        .await;
    let id = note["id"].as_str().unwrap();

    let (status, _) = t.post(&format!("/api/notifications/{id}/read"), json!({}), Some(&stranger)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = t.delete(&format!("/api/notifications/{id}"), Some(&stranger)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn send_validates_kind_and_recipient() {
    let t = common::test_app().await;
    let admin = t.admin().await;

    let (status, body) = t
        .post(
            "/api/notifications",
            json!({ "user_id": 1, "kind": "sms", "title": "Hi", "message": "x" }),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["kind"].is_string());

    let (status, _) = t
        .post(
            "/api/notifications",
            json!({ "user_id": 9999, "title": "Hi", "message": "x" }),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
