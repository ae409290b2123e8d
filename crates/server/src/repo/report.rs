use chrono::{DateTime, Utc};
use shared_types::{AppError, ClientComplianceRow, DashboardReport, PaymentBucket};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

/// Office-wide counters for the admin dashboard.
pub async fn dashboard(pool: &Pool<Postgres>) -> Result<DashboardReport, AppError> {
    let row: (i64, i64, i64, i64, i64, i64, i64, i64, i64) = sqlx::query_as(
        "SELECT
            (SELECT COUNT(*) FROM clients),
            (SELECT COUNT(*) FROM clients WHERE status = 'active'),
            (SELECT COUNT(*) FROM alerts WHERE status = 'open'),
            (SELECT COUNT(*) FROM alerts WHERE status = 'open' AND severity = 'critical'),
            (SELECT COUNT(*) FROM check_ins WHERE checked_in_at >= NOW() - INTERVAL '7 days'),
            (SELECT COUNT(*) FROM check_ins
              WHERE checked_in_at >= NOW() - INTERVAL '7 days' AND within_jurisdiction = FALSE),
            (SELECT COUNT(*) FROM court_dates
              WHERE status = 'scheduled'
                AND scheduled_at >= NOW() AND scheduled_at < NOW() + INTERVAL '7 days'),
            (SELECT COALESCE(SUM(amount_cents), 0)::BIGINT FROM payments
              WHERE status = 'completed' AND paid_at >= NOW() - INTERVAL '30 days'),
            (SELECT COALESCE(SUM(GREATEST(c.premium_cents - COALESCE(p.paid, 0), 0)), 0)::BIGINT
               FROM clients c
               LEFT JOIN (
                   SELECT client_id, SUM(amount_cents) AS paid
                   FROM payments WHERE status = 'completed'
                   GROUP BY client_id
               ) p ON p.client_id = c.id
              WHERE c.status = 'active')",
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(DashboardReport {
        total_clients: row.0,
        active_clients: row.1,
        open_alerts: row.2,
        critical_open_alerts: row.3,
        check_ins_last_7_days: row.4,
        violations_last_7_days: row.5,
        court_dates_next_7_days: row.6,
        collected_last_30_days_cents: row.7,
        outstanding_balance_cents: row.8,
    })
}

/// Payment counts and sums in `[from, to)` grouped by `column`.
async fn payment_buckets(
    pool: &Pool<Postgres>,
    column: &'static str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<PaymentBucket>, AppError> {
    sqlx::query_as::<_, PaymentBucket>(&format!(
        r#"SELECT {column} AS "key", COUNT(*) AS count, COALESCE(SUM(amount_cents), 0)::BIGINT AS amount_cents
         FROM payments
         WHERE paid_at >= $1 AND paid_at < $2
         GROUP BY {column}
         ORDER BY {column}"#
    ))
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn payments_by_status(
    pool: &Pool<Postgres>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<PaymentBucket>, AppError> {
    payment_buckets(pool, "status", from, to).await
}

pub async fn payments_by_method(
    pool: &Pool<Postgres>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<PaymentBucket>, AppError> {
    payment_buckets(pool, "method", from, to).await
}

/// One row per active client with check-in and court activity.
pub async fn compliance_rows(pool: &Pool<Postgres>) -> Result<Vec<ClientComplianceRow>, AppError> {
    sqlx::query_as::<_, ClientComplianceRow>(
        "SELECT c.id AS client_id, c.first_name, c.last_name, c.created_at,
                (SELECT MAX(checked_in_at) FROM check_ins WHERE client_id = c.id) AS last_check_in_at,
                (SELECT COUNT(*) FROM check_ins
                  WHERE client_id = c.id AND within_jurisdiction = FALSE) AS violation_count,
                (SELECT MIN(scheduled_at) FROM court_dates
                  WHERE client_id = c.id AND status = 'scheduled' AND scheduled_at > NOW()) AS next_court_date
         FROM clients c
         WHERE c.status = 'active'
         ORDER BY c.last_name, c.first_name",
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
