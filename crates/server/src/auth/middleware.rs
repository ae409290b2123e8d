use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use super::cookies;
use super::jwt::{self, hash_token, validate_access_token, validate_refresh_token};

/// Permissive auth middleware.
///
/// On each request:
/// 1. Validates the access token from cookies (or Bearer header fallback)
/// 2. If missing or invalid, attempts a transparent refresh using the refresh cookie
/// 3. Inserts `Claims` into request extensions on success
///
/// Never rejects a request. The extractors in `auth::extractors` decide.
pub async fn auth_middleware(
    State(pool): State<Pool<Postgres>>,
    mut req: Request,
    next: Next,
) -> Response {
    let access_token = cookies::extract_access_token(req.headers());
    let mut needs_refresh = access_token.is_none();

    if let Some(token) = access_token {
        match validate_access_token(&token) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
            }
            Err(_) => needs_refresh = true,
        }
    }

    let mut refreshed: Option<(String, String)> = None;
    if needs_refresh {
        if let Some(refresh_token) = cookies::extract_refresh_token(req.headers()) {
            refreshed = try_transparent_refresh(&pool, &refresh_token, &mut req).await;
        }
    }

    let mut response = next.run(req).await;

    if let Some((access, refresh)) = refreshed {
        cookies::set_auth_cookies(response.headers_mut(), &access, &refresh);
    }

    response
}

/// Rotate the refresh token: revoke the presented one, store the hash of a
/// new one and insert fresh claims into the request. The role is re-read
/// from the database so role changes apply on the next refresh.
async fn try_transparent_refresh(
    pool: &Pool<Postgres>,
    refresh_token: &str,
    req: &mut Request,
) -> Option<(String, String)> {
    let claims = validate_refresh_token(refresh_token).ok()?;

    let token_hash = hash_token(refresh_token);
    let (stored_id, revoked, expires_at): (i64, bool, DateTime<Utc>) = sqlx::query_as(
        "SELECT id, revoked, expires_at FROM refresh_tokens WHERE token_hash = $1 AND user_id = $2",
    )
    .bind(&token_hash)
    .bind(claims.sub)
    .fetch_optional(pool)
    .await
    .map_err(|e| tracing::warn!(error = %e, "Refresh token lookup failed"))
    .ok()
    .flatten()?;

    if revoked || expires_at <= Utc::now() {
        return None;
    }

    let (email, role): (String, String) =
        sqlx::query_as("SELECT email, role FROM users WHERE id = $1")
            .bind(claims.sub)
            .fetch_optional(pool)
            .await
            .ok()
            .flatten()?;

    // Conditional update so two concurrent refreshes cannot both succeed.
    let revoked_rows = sqlx::query(
        "UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1 AND revoked = FALSE",
    )
    .bind(stored_id)
    .execute(pool)
    .await
    .ok()?
    .rows_affected();
    if revoked_rows == 0 {
        return None;
    }

    let new_access = jwt::create_access_token(claims.sub, &email, &role).ok()?;
    let (new_refresh, new_expires_at) = jwt::create_refresh_token(claims.sub, &email, &role).ok()?;

    if let Err(e) = sqlx::query(
        "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
    )
    .bind(claims.sub)
    .bind(hash_token(&new_refresh))
    .bind(new_expires_at)
    .execute(pool)
    .await
    {
        tracing::error!(user_id = claims.sub, error = %e, "Failed to store rotated refresh token");
        return None;
    }

    let new_claims = validate_access_token(&new_access).ok()?;
    tracing::debug!(user_id = new_claims.sub, "Session refreshed");
    req.extensions_mut().insert(new_claims);

    Some((new_access, new_refresh))
}
