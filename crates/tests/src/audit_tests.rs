use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn maintenance_reads_filtered_audit_trail() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let (_, maintenance) = t.user("ops@bondline.test", "maintenance").await;

    let client = t.client(&admin, None, 0).await;
    t.patch(&format!("/api/clients/{client}/status"), json!({ "status": "discharged" }), Some(&admin))
        .await;

    let (status, all) = t.get("/api/audit-logs?entity_type=client", Some(&maintenance)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["meta"]["total"], 2);
    assert_eq!(all["data"][0]["entity_id"], client.as_str());

    let (_, created) = t.get("/api/audit-logs?action=client.create", Some(&maintenance)).await;
    assert_eq!(created["meta"]["total"], 1);
    assert!(created["data"][0]["actor_user_id"].is_number());
}

#[tokio::test]
async fn clients_cannot_read_audit_trail() {
    let t = common::test_app().await;
    let (_, token) = t.user("nosy@example.com", "client").await;

    let (status, body) = t.get("/api/audit-logs", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "Forbidden");
}
