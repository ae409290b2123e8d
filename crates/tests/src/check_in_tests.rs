use axum::body::Body;
use axum::extract::Query;
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;

use server::geolocation::GeoLocator;

use crate::common;

/// Serve string coordinates for 8.8.8.8 (Denver) and 1.1.1.1 (Houston).
async fn geolocation_api() -> String {
    let app = axum::Router::new().route(
        "/ipgeo",
        axum::routing::get(|Query(q): Query<HashMap<String, String>>| async move {
            let body = match q.get("ip").map(String::as_str) {
                Some("8.8.8.8") => json!({
                    "latitude": "39.73915",
                    "longitude": "-104.98470",
                    "city": "Denver",
                    "state_prov": "Colorado",
                }),
                Some("1.1.1.1") => json!({
                    "latitude": "29.76328",
                    "longitude": "-95.36327",
                    "city": "Houston",
                    "state_prov": "Texas",
                }),
                _ => json!({}),
            };
            axum::Json(body)
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind geolocation api");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve geolocation api") });
    format!("http://{addr}/ipgeo")
}

async fn check_in_from(t: &common::TestApp, token: &str, forwarded_for: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/check-ins")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .header("x-forwarded-for", forwarded_for)
        .body(Body::from("{}"))
        .unwrap();
    t.send(req).await
}

#[tokio::test]
async fn check_in_inside_jurisdiction() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    t.set_jurisdiction(&admin).await;
    let (_, token, client) = t.linked_client(&admin, "inside@example.com").await;

    let (status, body) = t
        .post("/api/check-ins", json!({ "latitude": 39.74, "longitude": -104.99 }), Some(&token))
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["check_in"]["client_id"], client.as_str());
    assert_eq!(body["check_in"]["location_source"], "device");
    assert_eq!(body["check_in"]["within_jurisdiction"], true);
    assert!(body["alert_id"].is_null());
    assert_eq!(t.count("SELECT COUNT(*) FROM alerts").await, 0);
}

#[tokio::test]
async fn check_in_outside_opens_alert_and_notifies_admins() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    t.set_jurisdiction(&admin).await;
    let (_, token, _) = t.linked_client(&admin, "roamer@example.com").await;

    let (status, body) = t
        .post("/api/check-ins", json!({ "latitude": 34.05, "longitude": -118.24 }), Some(&token))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["check_in"]["within_jurisdiction"], false);
    let alert_id = body["alert_id"].as_str().expect("alert opened");

    let (_, alert) = t.get(&format!("/api/alerts/{alert_id}"), Some(&admin)).await;
    assert_eq!(alert["alert_type"], "jurisdiction_violation");
    assert_eq!(alert["severity"], "high");
    assert_eq!(alert["status"], "open");

    let (_, notes) = t.get("/api/notifications", Some(&admin)).await;
    assert_eq!(notes["data"][0]["kind"], "alert");

    let (_, violations) = t.get("/api/check-ins?violations_only=true", Some(&admin)).await;
    assert_eq!(violations["meta"]["total"], 1);

    assert_eq!(
        t.count("SELECT COUNT(*) FROM audit_logs WHERE action = 'check_in.create'").await,
        1
    );
}

#[tokio::test]
async fn without_bounds_or_location_the_result_is_unknown() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let (_, token, _) = t.linked_client(&admin, "nowhere@example.com").await;

    let (_, with_point) = t
        .post("/api/check-ins", json!({ "latitude": 10.0, "longitude": 10.0 }), Some(&token))
        .await;
    assert!(with_point["check_in"]["within_jurisdiction"].is_null());

    let (_, without_point) = t.post("/api/check-ins", json!({}), Some(&token)).await;
    assert_eq!(without_point["check_in"]["location_source"], "none");
    assert!(without_point["check_in"]["latitude"].is_null());
}

#[tokio::test]
async fn admin_checks_in_on_behalf_of_client() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let client = t.client(&admin, None, 0).await;

    let (status, body) = t
        .post("/api/check-ins", json!({ "client_id": client, "notes": "Office visit" }), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["check_in"]["notes"], "Office visit");

    let (_, listed) = t.get(&format!("/api/clients/{client}/check-ins"), Some(&admin)).await;
    assert_eq!(listed["meta"]["total"], 1);
}

#[tokio::test]
async fn unlinked_client_account_gets_404() {
    let t = common::test_app().await;
    let (_, token) = t.user("orphan@example.com", "client").await;

    let (status, body) = t.post("/api/check-ins", json!({}), Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No client record is linked to your account");
}

#[tokio::test]
async fn geolocation_check_records_nothing() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    t.set_jurisdiction(&admin).await;

    let (status, body) = t
        .post("/api/geolocation/check", json!({ "latitude": 39.5, "longitude": -104.7 }), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["within_jurisdiction"], true, "edges are inclusive");
    assert_eq!(t.count("SELECT COUNT(*) FROM check_ins").await, 0);
}

#[tokio::test]
async fn ip_lookup_locates_check_in_without_coordinates() {
    let mut t = common::test_app().await;
    t.with_geolocator(GeoLocator::new(geolocation_api().await, "test-key").expect("geolocator"));
    let admin = t.admin().await;
    t.set_jurisdiction(&admin).await;
    let (_, token, _) = t.linked_client(&admin, "traveller@example.com").await;

    let (status, inside) = check_in_from(&t, &token, "8.8.8.8").await;
    assert_eq!(status, StatusCode::CREATED, "{inside}");
    assert_eq!(inside["check_in"]["location_source"], "ip_lookup");
    assert_eq!(inside["check_in"]["city"], "Denver");
    assert_eq!(inside["check_in"]["region"], "Colorado");
    assert_eq!(inside["check_in"]["within_jurisdiction"], true);
    assert!(inside["alert_id"].is_null());

    let (status, outside) = check_in_from(&t, &token, "1.1.1.1").await;
    assert_eq!(status, StatusCode::CREATED, "{outside}");
    assert_eq!(outside["check_in"]["location_source"], "ip_lookup");
    assert_eq!(outside["check_in"]["within_jurisdiction"], false);
    assert!(outside["alert_id"].is_string());
    assert_eq!(t.count("SELECT COUNT(*) FROM alerts").await, 1);
}

#[tokio::test]
async fn check_in_is_not_kept_without_its_violation_alert() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    t.set_jurisdiction(&admin).await;
    let (_, token, _) = t.linked_client(&admin, "stranded@example.com").await;

    sqlx::query(
        "ALTER TABLE alerts ADD CONSTRAINT block_violations \
         CHECK (alert_type <> 'jurisdiction_violation')",
    )
    .execute(&t.pool)
    .await
    .expect("add constraint");
    let (status, body) = t
        .post("/api/check-ins", json!({ "latitude": 34.05, "longitude": -118.24 }), Some(&token))
        .await;
    sqlx::query("ALTER TABLE alerts DROP CONSTRAINT block_violations")
        .execute(&t.pool)
        .await
        .expect("drop constraint");

    assert!(!status.is_success(), "{body}");
    assert_eq!(t.count("SELECT COUNT(*) FROM check_ins").await, 0);
    assert_eq!(t.count("SELECT COUNT(*) FROM alerts").await, 0);
    assert_eq!(t.count("SELECT COUNT(*) FROM notifications").await, 0);
}
