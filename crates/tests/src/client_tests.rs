use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn client_crud_round() {
    let t = common::test_app().await;
    let admin = t.admin().await;

    let (status, created) = t
        .post(
            "/api/clients",
            json!({
                "first_name": "Marcus",
                "last_name": "Bell",
                "case_number": "24-CR-118",
                "bond_amount_cents": 2_500_000,
                "premium_cents": 250_000,
                "date_of_birth": "1990-05-17",
            }),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["status"], "active");
    assert_eq!(created["full_name"], "Marcus Bell");
    let id = created["id"].as_str().unwrap();

    let (status, updated) = t
        .put(&format!("/api/clients/{id}"), json!({ "phone": "555-0100" }), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["phone"], "555-0100");
    assert_eq!(updated["case_number"], "24-CR-118", "partial update keeps other fields");

    let (status, revoked) = t
        .patch(&format!("/api/clients/{id}/status"), json!({ "status": "revoked" }), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(revoked["status"], "revoked");

    let (status, _) = t.delete(&format!("/api/clients/{id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = t.get(&format!("/api/clients/{id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_by_search_and_status() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let first = t.client(&admin, None, 1_000).await;
    t.client(&admin, None, 1_000).await;
    t.patch(&format!("/api/clients/{first}/status"), json!({ "status": "discharged" }), Some(&admin))
        .await;

    let (status, all) = t.get("/api/clients?q=whitfield", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["meta"]["total"], 2);

    let (_, discharged) = t.get("/api/clients?status=discharged", Some(&admin)).await;
    assert_eq!(discharged["meta"]["total"], 1);
    assert_eq!(discharged["data"][0]["id"], first.as_str());

    let (status, _) = t.get("/api/clients?status=fugitive", Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, paged) = t.get("/api/clients?limit=1&page=2", Some(&admin)).await;
    assert_eq!(paged["data"].as_array().unwrap().len(), 1);
    assert_eq!(paged["meta"]["has_prev"], true);
    assert_eq!(paged["meta"]["has_next"], false);
}

#[tokio::test]
async fn only_client_accounts_can_be_linked() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let (staff_id, _) = t.user("staff@example.com", "maintenance").await;

    let (status, body) = t
        .post(
            "/api/clients",
            json!({ "first_name": "A", "last_name": "B", "bond_amount_cents": 0, "premium_cents": 0, "user_id": staff_id }),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["user_id"].is_string());

    let (user_id, _) = t.user("c@example.com", "client").await;
    t.client(&admin, Some(user_id), 0).await;

    let (status, _) = t
        .post(
            "/api/clients",
            json!({ "first_name": "C", "last_name": "D", "bond_amount_cents": 0, "premium_cents": 0, "user_id": user_id }),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn negative_amounts_rejected() {
    let t = common::test_app().await;
    let admin = t.admin().await;

    let (status, _) = t
        .post(
            "/api/clients",
            json!({ "first_name": "A", "last_name": "B", "bond_amount_cents": -1, "premium_cents": 0 }),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
