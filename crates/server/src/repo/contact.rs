use shared_types::{AppError, ContactRequest, ContactSubmission};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const CONTACT_COLUMNS: &str = "id, name, email, phone, message, forwarded, created_at";

pub async fn create(
    pool: &Pool<Postgres>,
    req: &ContactRequest,
) -> Result<ContactSubmission, AppError> {
    sqlx::query_as::<_, ContactSubmission>(&format!(
        "INSERT INTO contact_submissions (name, email, phone, message)
         VALUES ($1, $2, $3, $4)
         RETURNING {CONTACT_COLUMNS}"
    ))
    .bind(req.name.trim())
    .bind(req.email.trim())
    .bind(req.phone.as_deref())
    .bind(req.message.trim())
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn mark_forwarded(pool: &Pool<Postgres>, id: Uuid) -> Result<(), AppError> {
    sqlx::query("UPDATE contact_submissions SET forwarded = TRUE WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    Ok(())
}

pub async fn list(
    pool: &Pool<Postgres>,
    offset: i64,
    limit: i64,
) -> Result<(Vec<ContactSubmission>, i64), AppError> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM contact_submissions")
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let rows = sqlx::query_as::<_, ContactSubmission>(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contact_submissions
         ORDER BY created_at DESC
         LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}
