use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tower::ServiceExt;

use server::db::AppState;
use server::geolocation::GeoLocator;
use server::rate_limit::RateLimitState;

/// Global mutex ensuring tests run sequentially against the shared database.
static TEST_MUTEX: std::sync::LazyLock<Mutex<()>> = std::sync::LazyLock::new(|| Mutex::new(()));

pub const PASSWORD: &str = "correct-horse-battery";

/// Truncating `users` cascades to every table that references it,
/// `company_configuration` included, so the singleton row is re-seeded.
const TRUNCATE: &str = "TRUNCATE users, refresh_tokens, clients, payments, check_ins, \
    court_dates, court_date_reminders, alerts, notifications, audit_logs, \
    privacy_acknowledgments, terms_acknowledgments, contact_submissions, \
    company_configuration RESTART IDENTITY CASCADE";

/// A router over a freshly truncated database. Hold it for the whole test:
/// it owns the lock that keeps tests from truncating each other's data.
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Postgres>,
    _guard: MutexGuard<'static, ()>,
}

/// Connects through `TEST_DATABASE_URL`, falling back to `DATABASE_URL`.
pub async fn test_app() -> TestApp {
    let guard = TEST_MUTEX.lock().await;
    let _ = dotenvy::dotenv();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("TEST_DATABASE_URL or DATABASE_URL must be set for integration tests");
    if std::env::var("JWT_SECRET").map_or(true, |s| s.is_empty()) {
        std::env::set_var("JWT_SECRET", "integration-test-secret");
    }

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    server::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query(TRUNCATE)
        .execute(&pool)
        .await
        .expect("Failed to truncate");

    sqlx::query("INSERT INTO company_configuration (id, company_name) VALUES (1, 'Test Bonds')")
        .execute(&pool)
        .await
        .expect("Failed to seed company configuration");

    let router = build_router(AppState::new(pool.clone()));

    TestApp {
        router,
        pool,
        _guard: guard,
    }
}

fn build_router(state: AppState) -> Router {
    server::openapi::build_app(state, RateLimitState::new(1_000, Duration::from_secs(60)))
}

impl TestApp {
    /// Rebuild the router with IP geolocation pointed at `geo`.
    pub fn with_geolocator(&mut self, geo: GeoLocator) {
        let mut state = AppState::new(self.pool.clone());
        state.geo = Some(geo);
        self.router = build_router(state);
    }

    /// Insert a user directly and return (id, access token).
    pub async fn user(&self, email: &str, role: &str) -> (i64, String) {
        let hash = server::auth::password::hash_password(PASSWORD).expect("hash");
        let user = server::repo::user::create(&self.pool, email, &hash, "Test User", role)
            .await
            .expect("Failed to create user");
        let token = server::auth::jwt::create_access_token(user.id, &user.email, role)
            .expect("Failed to create test JWT");
        (user.id, token)
    }

    pub async fn admin(&self) -> String {
        self.user("admin@bondline.test", "admin").await.1
    }

    /// Create a client through the API and return its id.
    pub async fn client(&self, admin: &str, user_id: Option<i64>, premium_cents: i64) -> String {
        let (status, body) = self
            .post(
                "/api/clients",
                json!({
                    "first_name": "Dana",
                    "last_name": "Whitfield",
                    "bond_amount_cents": premium_cents * 10,
                    "premium_cents": premium_cents,
                    "user_id": user_id,
                }),
                Some(admin),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().expect("client id").to_string()
    }

    /// A client-role user with a linked client record: (user id, token, client id).
    pub async fn linked_client(&self, admin: &str, email: &str) -> (i64, String, String) {
        let (user_id, token) = self.user(email, "client").await;
        let client_id = self.client(admin, Some(user_id), 100_000).await;
        (user_id, token, client_id)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let req = authed(Request::builder().method("GET").uri(uri), token)
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let req = authed(Request::builder().method("DELETE").uri(uri), token)
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        self.json("POST", uri, body, token).await
    }

    pub async fn put(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        self.json("PUT", uri, body, token).await
    }

    pub async fn patch(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        self.json("PATCH", uri, body, token).await
    }

    async fn json(&self, method: &str, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        let req = authed(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json"),
            token,
        )
        .body(Body::from(body.to_string()))
        .unwrap();
        self.send(req).await
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = self.send_raw(req).await;
        (status, body)
    }

    /// Send a request and keep the response headers (for cookies).
    pub async fn send_raw(&self, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");

        let body = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).to_string()))
        };

        (status, headers, body)
    }

    /// Configure a jurisdiction box around downtown Denver.
    pub async fn set_jurisdiction(&self, admin: &str) {
        let (status, body) = self
            .put(
                "/api/company-config",
                json!({
                    "company_name": "Test Bonds",
                    "min_latitude": 39.5,
                    "max_latitude": 40.0,
                    "min_longitude": -105.2,
                    "max_longitude": -104.7,
                    "check_in_interval_hours": 168,
                    "reminder_days": [7, 3, 1],
                    "privacy_policy_version": "1.0",
                    "terms_version": "1.0",
                }),
                Some(admin),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    pub async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(&self.pool)
            .await
            .expect("count query")
    }
}

fn authed(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header("authorization", format!("Bearer {token}")),
        None => builder,
    }
}

/// Collect `Set-Cookie` values into a single `Cookie` header value.
pub fn cookie_header(headers: &HeaderMap) -> String {
    headers
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}
