use axum::http::StatusCode;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn dashboard_summarizes_the_callers_bond() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let (_, token, client) = t.linked_client(&admin, "portal@example.com").await;

    t.post("/api/payments", json!({ "client_id": client, "amount_cents": 30_000, "method": "card" }), Some(&admin))
        .await;
    t.post(
        "/api/court-dates",
        json!({
            "client_id": client,
            "court_name": "District Court",
            "scheduled_at": (Utc::now() + Duration::days(10)).to_rfc3339(),
        }),
        Some(&admin),
    )
    .await;

    let (status, body) = t.get("/api/me/dashboard", Some(&token)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["client"]["id"], client.as_str());
    assert_eq!(body["payments"]["balance_cents"], 70_000);
    assert_eq!(body["next_court_date"]["court_name"], "District Court");
    assert_eq!(body["check_in_due"], false);
    assert_eq!(body["unread_notifications"], 1);
    assert_eq!(body["policies_acknowledged"], false);
}

#[tokio::test]
async fn submitted_payment_stays_pending() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let (_, token, client) = t.linked_client(&admin, "payer@example.com").await;

    let (status, payment) = t
        .post("/api/me/payments", json!({ "amount_cents": 5_000, "method": "card" }), Some(&token))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{payment}");
    assert_eq!(payment["status"], "pending");
    assert_eq!(payment["client_id"], client.as_str());

    let (_, summary) = t.get(&format!("/api/clients/{client}/payments/summary"), Some(&admin)).await;
    assert_eq!(summary["pending_cents"], 5_000);
    assert_eq!(summary["balance_cents"], 100_000);
}

#[tokio::test]
async fn lists_only_the_callers_records() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let (_, mine, my_client) = t.linked_client(&admin, "mine@example.com").await;
    let (_, _, other_client) = t.linked_client(&admin, "theirs@example.com").await;

    for client in [&my_client, &other_client] {
        t.post(
            "/api/payments",
            json!({ "client_id": client, "amount_cents": 1_000, "method": "cash" }),
            Some(&admin),
        )
        .await;
        t.post("/api/check-ins", json!({ "client_id": client }), Some(&admin)).await;
    }

    let (_, payments) = t.get("/api/me/payments", Some(&mine)).await;
    assert_eq!(payments["meta"]["total"], 1);
    assert_eq!(payments["data"][0]["client_id"], my_client.as_str());

    let (_, check_ins) = t.get("/api/me/check-ins", Some(&mine)).await;
    assert_eq!(check_ins["meta"]["total"], 1);

    let (_, court_dates) = t.get("/api/me/court-dates", Some(&mine)).await;
    assert_eq!(court_dates["meta"]["total"], 0);
}

#[tokio::test]
async fn unlinked_account_has_no_client_record() {
    let t = common::test_app().await;
    let (_, token) = t.user("pending@example.com", "client").await;

    let (status, body) = t.get("/api/me/client", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "NotFound");
}
