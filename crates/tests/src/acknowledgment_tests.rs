use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn acknowledging_current_versions() {
    let t = common::test_app().await;
    let (_, token) = t.user("reader@example.com", "client").await;

    let (_, status) = t.get("/api/acknowledgments/status", Some(&token)).await;
    assert_eq!(status["privacy_acknowledged"], false);
    let current = status["privacy_policy_version"].as_str().unwrap().to_string();

    let (code, body) = t
        .post("/api/acknowledgments/privacy", json!({ "version": "0.9-draft" }), Some(&token))
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["version"].is_string());

    let (code, first) = t
        .post("/api/acknowledgments/privacy", json!({ "version": current }), Some(&token))
        .await;
    assert_eq!(code, StatusCode::CREATED);
    assert_eq!(first["document"], "privacy");

    // A second acceptance of the same version keeps the original record.
    let (code, second) = t
        .post("/api/acknowledgments/privacy", json!({ "version": current }), Some(&token))
        .await;
    assert_eq!(code, StatusCode::CREATED);
    assert_eq!(second["acknowledged_at"], first["acknowledged_at"]);
    assert_eq!(t.count("SELECT COUNT(*) FROM privacy_acknowledgments").await, 1);

    let (_, status) = t.get("/api/acknowledgments/status", Some(&token)).await;
    assert_eq!(status["privacy_acknowledged"], true);
    assert_eq!(status["terms_acknowledged"], false);
}

#[tokio::test]
async fn version_bump_requires_new_acceptance() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let (_, token) = t.user("reader@example.com", "client").await;
    t.set_jurisdiction(&admin).await;

    t.post("/api/acknowledgments/terms", json!({ "version": "1.0" }), Some(&token)).await;
    let (_, before) = t.get("/api/acknowledgments/status", Some(&token)).await;
    assert_eq!(before["terms_acknowledged"], true);

    let (code, _) = t
        .put(
            "/api/company-config",
            json!({
                "company_name": "Test Bonds",
                "check_in_interval_hours": 168,
                "reminder_days": [1],
                "privacy_policy_version": "1.0",
                "terms_version": "2.0",
            }),
            Some(&admin),
        )
        .await;
    assert_eq!(code, StatusCode::OK);

    let (_, after) = t.get("/api/acknowledgments/status", Some(&token)).await;
    assert_eq!(after["terms_version"], "2.0");
    assert_eq!(after["terms_acknowledged"], false);
}
