use chrono::{DateTime, Utc};
use shared_types::{AppError, User};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

const USER_COLUMNS: &str = "id, email, display_name, role, created_at, updated_at";

/// Insert a new user. `email` must already be normalized (trimmed, lowercase).
pub async fn create(
    pool: &Pool<Postgres>,
    email: &str,
    password_hash: &str,
    display_name: &str,
    role: &str,
) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (email, password_hash, display_name, role)
         VALUES ($1, $2, $3, $4)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(email)
    .bind(password_hash)
    .bind(display_name)
    .bind(role)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<User>, AppError> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Look up the id and password hash for a login attempt.
pub async fn find_credentials(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Option<(i64, String)>, AppError> {
    sqlx::query_as::<_, (i64, String)>("SELECT id, password_hash FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// List users with optional role filter and email/name search.
pub async fn list(
    pool: &Pool<Postgres>,
    role: Option<&str>,
    q: Option<&str>,
    offset: i64,
    limit: i64,
) -> Result<(Vec<User>, i64), AppError> {
    let search = q
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.to_lowercase()));

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users
         WHERE ($1::TEXT IS NULL OR role = $1)
           AND ($2::TEXT IS NULL OR LOWER(email) LIKE $2 OR LOWER(display_name) LIKE $2)",
    )
    .bind(role)
    .bind(search.as_deref())
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let rows = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE ($1::TEXT IS NULL OR role = $1)
           AND ($2::TEXT IS NULL OR LOWER(email) LIKE $2 OR LOWER(display_name) LIKE $2)
         ORDER BY created_at DESC, id DESC
         LIMIT $3 OFFSET $4"
    ))
    .bind(role)
    .bind(search.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}

/// Ids of every user holding `role`, used to fan out notifications.
pub async fn ids_with_role(pool: &Pool<Postgres>, role: &str) -> Result<Vec<i64>, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE role = $1 ORDER BY id")
        .bind(role)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn update_role(
    pool: &Pool<Postgres>,
    id: i64,
    role: &str,
) -> Result<Option<User>, AppError> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(id)
    .bind(role)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Delete a user. Returns true if a row was deleted.
pub async fn delete(pool: &Pool<Postgres>, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected() > 0)
}

/// Persist the SHA-256 hash of a newly issued refresh token.
pub async fn store_refresh_token(
    pool: &Pool<Postgres>,
    user_id: i64,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    Ok(())
}

/// Revoke every outstanding refresh token for a user. Returns the number revoked.
pub async fn revoke_refresh_tokens(pool: &Pool<Postgres>, user_id: i64) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND revoked = FALSE",
    )
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected())
}
