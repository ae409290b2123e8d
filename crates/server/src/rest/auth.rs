use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde_json::json;
use sqlx::{Pool, Postgres};

use shared_types::{AppError, AuthResponse, AuthUser, LoginRequest, RegisterRequest, User};

use crate::extract::Json;
use crate::auth::extractors::AuthRequired;
use crate::auth::{cookies, jwt, maybe_promote_admin, password};
use crate::error_convert::{internal_error, ValidateRequest};
use crate::rate_limit::client_ip;
use crate::repo::audit::{self, AuditEntry};

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Issue an access/refresh pair, persist the refresh hash and return the
/// Set-Cookie headers plus the access token for non-browser clients.
async fn start_session(pool: &Pool<Postgres>, user: &User) -> Result<(HeaderMap, String), AppError> {
    let access = jwt::create_access_token(user.id, &user.email, &user.role)
        .map_err(|e| internal_error("Failed to sign access token", e))?;
    let (refresh, expires_at) = jwt::create_refresh_token(user.id, &user.email, &user.role)
        .map_err(|e| internal_error("Failed to sign refresh token", e))?;

    crate::repo::user::store_refresh_token(pool, user.id, &jwt::hash_token(&refresh), expires_at)
        .await?;

    let mut headers = HeaderMap::new();
    cookies::set_auth_cookies(&mut headers, &access, &refresh);
    Ok((headers, access))
}

/// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = AuthResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "Email already registered", body = AppError),
        (status = 429, description = "Rate limited", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(pool, headers, body), fields(email = %body.email))]
pub async fn register(
    State(pool): State<Pool<Postgres>>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, HeaderMap, Json<AuthResponse>), AppError> {
    body.validate_request()?;

    let email = normalize_email(&body.email);
    let hash = password::hash_password(&body.password)
        .map_err(|e| internal_error("Failed to hash password", e))?;

    let mut user =
        crate::repo::user::create(&pool, &email, &hash, body.display_name.trim(), "client").await?;
    user.role = maybe_promote_admin(&pool, user.id, &user.email, user.role).await;

    let (cookie_headers, access_token) = start_session(&pool, &user).await?;

    audit::record(
        &pool,
        AuditEntry::new(Some(user.id), "user.register", "user")
            .entity(user.id)
            .ip(client_ip(&headers)),
    )
    .await;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        cookie_headers,
        Json(AuthResponse {
            user: AuthUser::from(user),
            access_token,
        }),
    ))
}

/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = AppError),
        (status = 429, description = "Rate limited", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(pool, headers, body), fields(email = %body.email))]
pub async fn login(
    State(pool): State<Pool<Postgres>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), AppError> {
    body.validate_request()?;

    let invalid = || AppError::unauthorized("Invalid email or password");
    let email = normalize_email(&body.email);

    let (user_id, hash) = crate::repo::user::find_credentials(&pool, &email)
        .await?
        .ok_or_else(invalid)?;

    let verified = password::verify_password(&body.password, &hash).unwrap_or_else(|e| {
        tracing::error!(user_id, error = %e, "Stored password hash is malformed");
        false
    });
    if !verified {
        tracing::info!(user_id, "Failed login attempt");
        return Err(invalid());
    }

    let mut user = crate::repo::user::find_by_id(&pool, user_id)
        .await?
        .ok_or_else(invalid)?;
    user.role = maybe_promote_admin(&pool, user.id, &user.email, user.role).await;

    let (cookie_headers, access_token) = start_session(&pool, &user).await?;

    audit::record(
        &pool,
        AuditEntry::new(Some(user.id), "auth.login", "user")
            .entity(user.id)
            .ip(client_ip(&headers)),
    )
    .await;

    Ok((
        cookie_headers,
        Json(AuthResponse {
            user: AuthUser::from(user),
            access_token,
        }),
    ))
}

/// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Signed out, session cookies cleared"),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(pool, auth))]
pub async fn logout(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
) -> Result<(StatusCode, HeaderMap), AppError> {
    let revoked = crate::repo::user::revoke_refresh_tokens(&pool, auth.0.sub).await?;

    let mut headers = HeaderMap::new();
    cookies::clear_auth_cookies(&mut headers);

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "auth.logout", "user")
            .entity(auth.0.sub)
            .details(json!({ "revoked_tokens": revoked })),
    )
    .await;

    Ok((StatusCode::NO_CONTENT, headers))
}

/// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = AuthUser),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    tag = "auth"
)]
pub async fn me(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
) -> Result<Json<AuthUser>, AppError> {
    let user = crate::repo::user::find_by_id(&pool, auth.0.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("Account no longer exists"))?;
    Ok(Json(AuthUser::from(user)))
}
