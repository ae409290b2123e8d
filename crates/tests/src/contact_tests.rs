use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn public_submission_listed_for_admins() {
    let t = common::test_app().await;
    let admin = t.admin().await;

    let (status, body) = t
        .post(
            "/api/contact",
            json!({ "name": "Jordan", "email": "jordan@example.com", "message": "Do you cover Adams County?" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["forwarded"], false);

    let (status, list) = t.get("/api/contact", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["meta"]["total"], 1);
    assert_eq!(list["data"][0]["email"], "jordan@example.com");

    let (_, audit) = t.get("/api/audit-logs?action=contact.submit", Some(&admin)).await;
    assert_eq!(audit["meta"]["total"], 1);
    assert!(audit["data"][0]["actor_user_id"].is_null());
}

#[tokio::test]
async fn invalid_submission_rejected() {
    let t = common::test_app().await;

    let (status, body) = t
        .post("/api/contact", json!({ "name": "Jordan", "email": "nope", "message": "Hi" }), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["email"].is_string());
    assert_eq!(t.count("SELECT COUNT(*) FROM contact_submissions").await, 0);
}

#[tokio::test]
async fn clients_cannot_read_submissions() {
    let t = common::test_app().await;
    let (_, token) = t.user("curious@example.com", "client").await;

    let (status, _) = t.get("/api/contact", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
