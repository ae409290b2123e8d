use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common;

fn config(overrides: Value) -> Value {
    let mut base = json!({
        "company_name": "Front Range Bail Bonds",
        "contact_phone": "303-555-0100",
        "check_in_interval_hours": 72,
        "reminder_days": [1, 7, 3, 7],
        "privacy_policy_version": "1.0",
        "terms_version": "1.0",
    });
    if let (Some(base), Some(extra)) = (base.as_object_mut(), overrides.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    base
}

#[tokio::test]
async fn replace_normalizes_reminder_days() {
    let t = common::test_app().await;
    let admin = t.admin().await;

    let (status, body) = t.put("/api/company-config", config(json!({})), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["reminder_days"], json!([7, 3, 1]));
    assert!(body["jurisdiction"].is_null());

    // Any signed-in user can read it.
    let (_, token) = t.user("reader@example.com", "client").await;
    let (status, read) = t.get("/api/company-config", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["company_name"], "Front Range Bail Bonds");
    assert_eq!(read["check_in_interval_hours"], 72);

    assert_eq!(
        t.count("SELECT COUNT(*) FROM audit_logs WHERE action = 'company_config.update'").await,
        1
    );
}

#[tokio::test]
async fn bounds_must_be_complete_and_ordered() {
    let t = common::test_app().await;
    let admin = t.admin().await;

    let (status, body) = t
        .put("/api/company-config", config(json!({ "min_latitude": 39.5, "max_latitude": 40.0 })), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["jurisdiction"].is_string());

    let (status, _) = t
        .put(
            "/api/company-config",
            config(json!({
                "min_latitude": 40.0, "max_latitude": 39.5,
                "min_longitude": -105.2, "max_longitude": -104.7,
            })),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn interval_and_reminders_range_checked() {
    let t = common::test_app().await;
    let admin = t.admin().await;

    let (status, body) = t
        .put("/api/company-config", config(json!({ "check_in_interval_hours": 0 })), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["check_in_interval_hours"].is_string());

    let (status, _) = t
        .put("/api/company-config", config(json!({ "reminder_days": [90] })), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
