use axum::{body::Body, http::Request, http::StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{self, cookie_header, PASSWORD};

#[tokio::test]
async fn register_creates_client_and_sets_cookies() {
    let t = common::test_app().await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/register")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "email": " New.Client@Example.com ", "password": PASSWORD, "display_name": "New Client" })
                .to_string(),
        ))
        .unwrap();
    let (status, headers, body) = t.send_raw(req).await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user"]["email"], "new.client@example.com");
    assert_eq!(body["user"]["role"], "client");
    assert!(body["access_token"].as_str().is_some_and(|s| !s.is_empty()));

    let cookies = cookie_header(&headers);
    assert!(cookies.contains("bond_access="), "{cookies}");
    assert!(cookies.contains("bond_refresh="), "{cookies}");
    assert_eq!(t.count("SELECT COUNT(*) FROM refresh_tokens").await, 1);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let t = common::test_app().await;
    let body = json!({ "email": "dup@example.com", "password": PASSWORD, "display_name": "Dup" });

    let (first, _) = t.post("/api/auth/register", body.clone(), None).await;
    assert_eq!(first, StatusCode::CREATED);

    let (second, err) = t.post("/api/auth/register", body, None).await;
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(err["kind"], "Conflict");
}

#[tokio::test]
async fn admin_email_is_promoted_on_register() {
    let t = common::test_app().await;
    std::env::set_var("ADMIN_EMAIL", "owner@bondline.test");

    let (status, body) = t
        .post(
            "/api/auth/register",
            json!({ "email": "Owner@Bondline.test", "password": PASSWORD, "display_name": "Owner" }),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "admin");
}

#[tokio::test]
async fn login_checks_password() {
    let t = common::test_app().await;
    t.user("login@example.com", "client").await;

    let (status, body) = t
        .post("/api/auth/login", json!({ "email": "LOGIN@example.com", "password": PASSWORD }), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, me) = t.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "login@example.com");

    let (status, err) = t
        .post("/api/auth/login", json!({ "email": "login@example.com", "password": "wrong-password" }), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["message"], "Invalid email or password");

    let (status, _) = t
        .post("/api/auth/login", json!({ "email": "nobody@example.com", "password": PASSWORD }), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(t.count("SELECT COUNT(*) FROM audit_logs WHERE action = 'auth.login'").await, 1);
}

#[tokio::test]
async fn refresh_cookie_renews_session() {
    let t = common::test_app().await;
    t.user("refresh@example.com", "client").await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "email": "refresh@example.com", "password": PASSWORD }).to_string()))
        .unwrap();
    let (_, headers, _) = t.send_raw(req).await;
    let refresh_only = cookie_header(&headers)
        .split("; ")
        .find(|c| c.starts_with("bond_refresh="))
        .unwrap()
        .to_string();

    let req = Request::builder()
        .uri("/api/auth/me")
        .header("cookie", &refresh_only)
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = t.send_raw(req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "refresh@example.com");
    assert!(cookie_header(&headers).contains("bond_access="));

    // The presented refresh token was rotated out.
    let req = Request::builder()
        .uri("/api/auth/me")
        .header("cookie", &refresh_only)
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = t.send_raw(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_refresh_tokens() {
    let t = common::test_app().await;
    t.user("bye@example.com", "client").await;

    let (_, body) = t
        .post("/api/auth/login", json!({ "email": "bye@example.com", "password": PASSWORD }), None)
        .await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, _) = t.post("/api/auth/logout", json!({}), Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(
        t.count("SELECT COUNT(*) FROM refresh_tokens WHERE revoked = FALSE").await,
        0
    );
}
