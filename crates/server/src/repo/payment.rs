use chrono::{DateTime, Utc};
use rand::Rng;
use shared_types::{format_receipt_number, AppError, Payment, PaymentTotals};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const PAYMENT_COLUMNS: &str = "id, client_id, amount_cents, method, status, receipt_number, \
     paid_at, notes, recorded_by, created_at, updated_at";

/// Fields for a new payment row, already validated by the handler.
pub struct NewPayment<'a> {
    pub client_id: Uuid,
    pub amount_cents: i64,
    pub method: &'a str,
    pub status: &'a str,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<&'a str>,
    pub recorded_by: Option<i64>,
}

/// `PMT-YYYYMMDD-XXXXXX` with six random hex digits.
pub fn generate_receipt_number(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..0x0100_0000);
    format_receipt_number(now.date_naive(), &format!("{suffix:06X}"))
}

/// Insert a payment, assigning a receipt number.
pub async fn create(pool: &Pool<Postgres>, new: NewPayment<'_>) -> Result<Payment, AppError> {
    let receipt_number = generate_receipt_number(Utc::now());

    sqlx::query_as::<_, Payment>(&format!(
        "INSERT INTO payments
            (client_id, amount_cents, method, status, receipt_number, paid_at, notes, recorded_by)
         VALUES ($1, $2, $3, $4, $5, COALESCE($6, NOW()), $7, $8)
         RETURNING {PAYMENT_COLUMNS}"
    ))
    .bind(new.client_id)
    .bind(new.amount_cents)
    .bind(new.method)
    .bind(new.status)
    .bind(&receipt_number)
    .bind(new.paid_at)
    .bind(new.notes)
    .bind(new.recorded_by)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Payment>, AppError> {
    sqlx::query_as::<_, Payment>(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// List payments newest first with optional filters.
pub async fn list(
    pool: &Pool<Postgres>,
    client_id: Option<Uuid>,
    status: Option<&str>,
    method: Option<&str>,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Payment>, i64), AppError> {
    let filter = "($1::UUID IS NULL OR client_id = $1)
          AND ($2::TEXT IS NULL OR status = $2)
          AND ($3::TEXT IS NULL OR method = $3)";

    let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM payments WHERE {filter}"))
        .bind(client_id)
        .bind(status)
        .bind(method)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let rows = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE {filter}
         ORDER BY paid_at DESC, created_at DESC
         LIMIT $4 OFFSET $5"
    ))
    .bind(client_id)
    .bind(status)
    .bind(method)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}

/// Move a payment to `status` only if it is still in `expected`.
/// `None` when the row is gone or changed concurrently.
pub async fn update_status(
    pool: &Pool<Postgres>,
    id: Uuid,
    expected: &str,
    status: &str,
) -> Result<Option<Payment>, AppError> {
    sqlx::query_as::<_, Payment>(&format!(
        "UPDATE payments SET status = $3, updated_at = NOW()
         WHERE id = $1 AND status = $2
         RETURNING {PAYMENT_COLUMNS}"
    ))
    .bind(id)
    .bind(expected)
    .bind(status)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn delete(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM payments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected() > 0)
}

/// Sums by status for one client.
pub async fn totals_for_client(
    pool: &Pool<Postgres>,
    client_id: Uuid,
) -> Result<PaymentTotals, AppError> {
    sqlx::query_as::<_, PaymentTotals>(
        "SELECT
            COALESCE(SUM(amount_cents) FILTER (WHERE status = 'completed'), 0)::BIGINT AS completed_cents,
            COALESCE(SUM(amount_cents) FILTER (WHERE status = 'refunded'), 0)::BIGINT AS refunded_cents,
            COALESCE(SUM(amount_cents) FILTER (WHERE status = 'pending'), 0)::BIGINT AS pending_cents,
            COUNT(*) AS payment_count
         FROM payments
         WHERE client_id = $1",
    )
    .bind(client_id)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
