use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn recording_payments_updates_summary() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let client = t.client(&admin, None, 100_000).await;

    let (status, paid) = t
        .post(
            "/api/payments",
            json!({ "client_id": client, "amount_cents": 40_000, "method": "card" }),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{paid}");
    assert_eq!(paid["status"], "completed");
    let receipt = paid["receipt_number"].as_str().unwrap();
    assert!(receipt.starts_with("PMT-") && receipt.len() == "PMT-YYYYMMDD-XXXXXX".len(), "{receipt}");

    t.post(
        "/api/payments",
        json!({ "client_id": client, "amount_cents": 5_000, "method": "cash", "status": "pending" }),
        Some(&admin),
    )
    .await;

    let (status, summary) = t
        .get(&format!("/api/clients/{client}/payments/summary"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["premium_cents"], 100_000);
    assert_eq!(summary["total_paid_cents"], 40_000);
    assert_eq!(summary["pending_cents"], 5_000);
    assert_eq!(summary["balance_cents"], 60_000);
    assert_eq!(summary["payment_count"], 2);

    let (_, listed) = t.get(&format!("/api/clients/{client}/payments"), Some(&admin)).await;
    assert_eq!(listed["meta"]["total"], 2);
}

#[tokio::test]
async fn overpayment_never_goes_negative() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let client = t.client(&admin, None, 10_000).await;

    t.post(
        "/api/payments",
        json!({ "client_id": client, "amount_cents": 15_000, "method": "check" }),
        Some(&admin),
    )
    .await;

    let (_, summary) = t
        .get(&format!("/api/clients/{client}/payments/summary"), Some(&admin))
        .await;
    assert_eq!(summary["balance_cents"], 0);
}

#[tokio::test]
async fn status_transitions_follow_lifecycle() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let client = t.client(&admin, None, 10_000).await;

    let (_, pending) = t
        .post(
            "/api/payments",
            json!({ "client_id": client, "amount_cents": 1_000, "method": "money_order", "status": "pending" }),
            Some(&admin),
        )
        .await;
    let id = pending["id"].as_str().unwrap();
    let status_uri = format!("/api/payments/{id}/status");

    let (status, _) = t.patch(&status_uri, json!({ "status": "refunded" }), Some(&admin)).await;
    assert_eq!(status, StatusCode::CONFLICT, "pending cannot be refunded");

    let (status, done) = t.patch(&status_uri, json!({ "status": "completed" }), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "completed");

    let (status, _) = t.patch(&status_uri, json!({ "status": "refunded" }), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, err) = t.patch(&status_uri, json!({ "status": "completed" }), Some(&admin)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["kind"], "Conflict");
}

#[tokio::test]
async fn completed_payment_notifies_linked_client() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let (_, client_token, client) = t.linked_client(&admin, "payer@example.com").await;

    t.post(
        "/api/payments",
        json!({ "client_id": client, "amount_cents": 12_345, "method": "bank_transfer" }),
        Some(&admin),
    )
    .await;

    let (status, notes) = t.get("/api/notifications", Some(&client_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notes["meta"]["total"], 1);
    assert_eq!(notes["data"][0]["kind"], "payment");
    assert!(notes["data"][0]["message"].as_str().unwrap().contains("$123.45"));
}

#[tokio::test]
async fn invalid_method_and_unknown_client() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let client = t.client(&admin, None, 10_000).await;

    let (status, _) = t
        .post("/api/payments", json!({ "client_id": client, "amount_cents": 100, "method": "bitcoin" }), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .post(
            "/api/payments",
            json!({ "client_id": uuid::Uuid::new_v4(), "amount_cents": 100, "method": "cash" }),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t
        .post("/api/payments", json!({ "client_id": client, "amount_cents": 0, "method": "cash" }), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
