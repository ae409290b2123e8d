use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn alert_lifecycle() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let client = t.client(&admin, None, 0).await;

    let (status, alert) = t
        .post(
            "/api/alerts",
            json!({ "client_id": client, "alert_type": "missed_payment", "severity": "low", "message": "Late" }),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{alert}");
    assert_eq!(alert["details"], json!({}));
    let id = alert["id"].as_str().unwrap();

    let (status, acked) = t.post(&format!("/api/alerts/{id}/acknowledge"), json!({}), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(acked["status"], "acknowledged");
    assert!(acked["acknowledged_by"].is_number());

    let (status, _) = t.post(&format!("/api/alerts/{id}/acknowledge"), json!({}), Some(&admin)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, resolved) = t.post(&format!("/api/alerts/{id}/resolve"), json!({}), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["status"], "resolved");

    let (status, _) = t.post(&format!("/api/alerts/{id}/resolve"), json!({}), Some(&admin)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn open_alert_can_be_resolved_directly() {
    let t = common::test_app().await;
    let admin = t.admin().await;

    let (_, alert) = t
        .post(
            "/api/alerts",
            json!({ "alert_type": "other", "severity": "critical", "message": "Bondsman review" }),
            Some(&admin),
        )
        .await;
    let id = alert["id"].as_str().unwrap();

    let (status, resolved) = t.post(&format!("/api/alerts/{id}/resolve"), json!({}), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(resolved["acknowledged_at"].is_null());

    let (_, open) = t.get("/api/alerts?status=open", Some(&admin)).await;
    assert_eq!(open["meta"]["total"], 0);
}

#[tokio::test]
async fn invalid_alert_fields_rejected() {
    let t = common::test_app().await;
    let admin = t.admin().await;

    let (status, _) = t
        .post("/api/alerts", json!({ "alert_type": "weather", "severity": "low", "message": "x" }), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .post("/api/alerts", json!({ "alert_type": "other", "severity": "extreme", "message": "x" }), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missed_check_in_scan_is_idempotent() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let stale = t.client(&admin, None, 0).await;
    t.client(&admin, None, 0).await;

    sqlx::query("UPDATE clients SET created_at = NOW() - INTERVAL '10 days' WHERE id = $1::uuid")
        .bind(&stale)
        .execute(&t.pool)
        .await
        .unwrap();

    let (status, first) = t.post("/api/alerts/scan/missed-check-ins", json!({}), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["alerts_created"], 1);

    let (_, second) = t.post("/api/alerts/scan/missed-check-ins", json!({}), Some(&admin)).await;
    assert_eq!(second["alerts_created"], 0);

    let (_, alerts) = t.get("/api/alerts?alert_type=missed_check_in", Some(&admin)).await;
    assert_eq!(alerts["data"][0]["client_id"], stale.as_str());
}
