use axum::http::StatusCode;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn dashboard_counts_office_activity() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    t.set_jurisdiction(&admin).await;
    let (_, token, client) = t.linked_client(&admin, "active@example.com").await;

    t.post("/api/payments", json!({ "client_id": client, "amount_cents": 25_000, "method": "cash" }), Some(&admin))
        .await;
    t.post("/api/check-ins", json!({ "latitude": 0.0, "longitude": 0.0 }), Some(&token)).await;

    let (status, body) = t.get("/api/reports/dashboard", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_clients"], 1);
    assert_eq!(body["active_clients"], 1);
    assert_eq!(body["open_alerts"], 1);
    assert_eq!(body["check_ins_last_7_days"], 1);
    assert_eq!(body["violations_last_7_days"], 1);
    assert_eq!(body["collected_last_30_days_cents"], 25_000);
    assert_eq!(body["outstanding_balance_cents"], 75_000);
}

#[tokio::test]
async fn payment_report_groups_by_status_and_method() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let client = t.client(&admin, None, 50_000).await;

    for (amount, method) in [(10_000, "cash"), (5_000, "card"), (2_500, "card")] {
        t.post(
            "/api/payments",
            json!({ "client_id": client, "amount_cents": amount, "method": method }),
            Some(&admin),
        )
        .await;
    }
    t.post(
        "/api/payments",
        json!({
            "client_id": client,
            "amount_cents": 99_000,
            "method": "check",
            "paid_at": (Utc::now() - Duration::days(90)).to_rfc3339(),
        }),
        Some(&admin),
    )
    .await;

    let (status, report) = t.get("/api/reports/payments", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["collected_cents"], 17_500);
    assert_eq!(report["by_method"][0], json!({ "key": "card", "count": 2, "amount_cents": 7_500 }));
    assert_eq!(report["by_method"].as_array().unwrap().len(), 2);

    let (status, _) = t.get("/api/reports/payments?from=2024-02-02&to=2024-02-01", Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn compliance_report_flags_overdue_clients() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let stale = t.client(&admin, None, 0).await;
    sqlx::query("UPDATE clients SET created_at = NOW() - INTERVAL '30 days' WHERE id = $1::uuid")
        .bind(&stale)
        .execute(&t.pool)
        .await
        .unwrap();
    let fresh = t.client(&admin, None, 0).await;

    let (status, report) = t.get("/api/reports/compliance", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["overdue_count"], 1);

    let clients = report["clients"].as_array().unwrap();
    let overdue = |id: &str| {
        clients.iter().find(|c| c["client_id"] == id).map(|c| c["check_in_overdue"].clone())
    };
    assert_eq!(overdue(&stale), Some(json!(true)));
    assert_eq!(overdue(&fresh), Some(json!(false)));
}
