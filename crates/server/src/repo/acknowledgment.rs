use shared_types::{Acknowledgment, AppError, PolicyDocument};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

/// Record that `user_id` accepted `version` of `document`.
/// Repeating the call returns the original acknowledgment unchanged.
pub async fn acknowledge(
    pool: &Pool<Postgres>,
    document: PolicyDocument,
    user_id: i64,
    version: &str,
    ip_address: Option<&str>,
) -> Result<Acknowledgment, AppError> {
    let table = document.table();
    sqlx::query_as::<_, Acknowledgment>(&format!(
        "INSERT INTO {table} (user_id, version, ip_address)
         VALUES ($1, $2, $3)
         ON CONFLICT (user_id, version) DO UPDATE SET version = EXCLUDED.version
         RETURNING id, user_id, version, ip_address, acknowledged_at"
    ))
    .bind(user_id)
    .bind(version)
    .bind(ip_address)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn has_acknowledged(
    pool: &Pool<Postgres>,
    document: PolicyDocument,
    user_id: i64,
    version: &str,
) -> Result<bool, AppError> {
    let table = document.table();
    sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS (SELECT 1 FROM {table} WHERE user_id = $1 AND version = $2)"
    ))
    .bind(user_id)
    .bind(version)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
