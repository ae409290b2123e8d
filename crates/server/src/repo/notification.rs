use shared_types::{AppError, Notification};
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, message, read_at, created_at";

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    user_id: i64,
    kind: &str,
    title: &str,
    message: &str,
) -> Result<Notification, AppError> {
    sqlx::query_as::<_, Notification>(&format!(
        "INSERT INTO notifications (user_id, kind, title, message)
         VALUES ($1, $2, $3, $4)
         RETURNING {NOTIFICATION_COLUMNS}"
    ))
    .bind(user_id)
    .bind(kind)
    .bind(title)
    .bind(message)
    .fetch_one(executor)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Send the same notification to several users in one statement.
pub async fn create_for_users(
    pool: &Pool<Postgres>,
    user_ids: &[i64],
    kind: &str,
    title: &str,
    message: &str,
) -> Result<u64, AppError> {
    if user_ids.is_empty() {
        return Ok(0);
    }
    let result = sqlx::query(
        "INSERT INTO notifications (user_id, kind, title, message)
         SELECT UNNEST($1::BIGINT[]), $2, $3, $4",
    )
    .bind(user_ids)
    .bind(kind)
    .bind(title)
    .bind(message)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected())
}

/// A user's notifications, newest first.
pub async fn list_for_user(
    pool: &Pool<Postgres>,
    user_id: i64,
    unread_only: bool,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Notification>, i64), AppError> {
    let filter = "user_id = $1 AND (NOT $2 OR read_at IS NULL)";

    let total = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM notifications WHERE {filter}"
    ))
    .bind(user_id)
    .bind(unread_only)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let rows = sqlx::query_as::<_, Notification>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE {filter}
         ORDER BY created_at DESC
         LIMIT $3 OFFSET $4"
    ))
    .bind(user_id)
    .bind(unread_only)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}

pub async fn unread_count(pool: &Pool<Postgres>, user_id: i64) -> Result<i64, AppError> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read_at IS NULL",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Mark one of the user's notifications read. Already-read rows keep
/// their original `read_at`. `None` if it does not belong to the user.
pub async fn mark_read(
    pool: &Pool<Postgres>,
    id: Uuid,
    user_id: i64,
) -> Result<Option<Notification>, AppError> {
    sqlx::query_as::<_, Notification>(&format!(
        "UPDATE notifications SET read_at = COALESCE(read_at, NOW())
         WHERE id = $1 AND user_id = $2
         RETURNING {NOTIFICATION_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn mark_all_read(pool: &Pool<Postgres>, user_id: i64) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE notifications SET read_at = NOW() WHERE user_id = $1 AND read_at IS NULL",
    )
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected())
}

/// Delete one of the user's own notifications.
pub async fn delete(pool: &Pool<Postgres>, id: Uuid, user_id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected() > 0)
}
