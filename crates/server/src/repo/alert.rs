use chrono::{DateTime, Utc};
use shared_types::{AppError, Alert};
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const ALERT_COLUMNS: &str = "id, client_id, alert_type, severity, status, message, details, \
     acknowledged_by, acknowledged_at, resolved_by, resolved_at, created_at";

pub struct NewAlert<'a> {
    pub client_id: Option<Uuid>,
    pub alert_type: &'a str,
    pub severity: &'a str,
    pub message: &'a str,
    pub details: serde_json::Value,
}

/// An active client as seen by the missed check-in scan.
#[derive(Debug, sqlx::FromRow)]
pub struct ScanCandidate {
    pub client_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub last_check_in_at: Option<DateTime<Utc>>,
    pub has_unresolved_alert: bool,
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    new: NewAlert<'_>,
) -> Result<Alert, AppError> {
    sqlx::query_as::<_, Alert>(&format!(
        "INSERT INTO alerts (client_id, alert_type, severity, message, details)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {ALERT_COLUMNS}"
    ))
    .bind(new.client_id)
    .bind(new.alert_type)
    .bind(new.severity)
    .bind(new.message)
    .bind(new.details)
    .fetch_one(executor)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Alert>, AppError> {
    sqlx::query_as::<_, Alert>(&format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Newest first with optional filters.
pub async fn list(
    pool: &Pool<Postgres>,
    status: Option<&str>,
    severity: Option<&str>,
    alert_type: Option<&str>,
    client_id: Option<Uuid>,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Alert>, i64), AppError> {
    let filter = "($1::TEXT IS NULL OR status = $1)
          AND ($2::TEXT IS NULL OR severity = $2)
          AND ($3::TEXT IS NULL OR alert_type = $3)
          AND ($4::UUID IS NULL OR client_id = $4)";

    let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM alerts WHERE {filter}"))
        .bind(status)
        .bind(severity)
        .bind(alert_type)
        .bind(client_id)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let rows = sqlx::query_as::<_, Alert>(&format!(
        "SELECT {ALERT_COLUMNS} FROM alerts WHERE {filter}
         ORDER BY created_at DESC
         LIMIT $5 OFFSET $6"
    ))
    .bind(status)
    .bind(severity)
    .bind(alert_type)
    .bind(client_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}

/// Move an alert from `expected` to `next`, stamping who did it.
/// `None` when the alert changed status concurrently.
pub async fn transition(
    pool: &Pool<Postgres>,
    id: Uuid,
    expected: &str,
    next: &str,
    user_id: i64,
) -> Result<Option<Alert>, AppError> {
    sqlx::query_as::<_, Alert>(&format!(
        "UPDATE alerts SET
            status = $3,
            acknowledged_by = CASE WHEN $3 = 'acknowledged' THEN $4 ELSE acknowledged_by END,
            acknowledged_at = CASE WHEN $3 = 'acknowledged' THEN NOW() ELSE acknowledged_at END,
            resolved_by = CASE WHEN $3 = 'resolved' THEN $4 ELSE resolved_by END,
            resolved_at = CASE WHEN $3 = 'resolved' THEN NOW() ELSE resolved_at END
         WHERE id = $1 AND status = $2
         RETURNING {ALERT_COLUMNS}"
    ))
    .bind(id)
    .bind(expected)
    .bind(next)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Every active client with its latest check-in and whether a
/// `missed_check_in` alert is still unresolved for it.
pub async fn missed_check_in_candidates(
    pool: &Pool<Postgres>,
) -> Result<Vec<ScanCandidate>, AppError> {
    sqlx::query_as::<_, ScanCandidate>(
        "SELECT c.id AS client_id, c.first_name, c.last_name, c.created_at,
                MAX(ci.checked_in_at) AS last_check_in_at,
                EXISTS (
                    SELECT 1 FROM alerts a
                    WHERE a.client_id = c.id
                      AND a.alert_type = 'missed_check_in'
                      AND a.status <> 'resolved'
                ) AS has_unresolved_alert
         FROM clients c
         LEFT JOIN check_ins ci ON ci.client_id = c.id
         WHERE c.status = 'active'
         GROUP BY c.id
         ORDER BY c.last_name, c.first_name",
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
