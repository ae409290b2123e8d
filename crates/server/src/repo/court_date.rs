use shared_types::{AppError, CourtDate, CreateCourtDateRequest, UpdateCourtDateRequest};
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const COURT_DATE_COLUMNS: &str = "id, client_id, court_name, case_number, hearing_type, \
     scheduled_at, location, status, notes, created_at, updated_at";

/// A scheduled hearing inside the reminder horizon, with the offsets
/// already notified and the linked client login (if any).
#[derive(Debug, sqlx::FromRow)]
pub struct ReminderCandidate {
    #[sqlx(flatten)]
    pub court_date: CourtDate,
    pub client_user_id: Option<i64>,
    pub sent_offsets: Vec<i32>,
}

pub async fn create(
    pool: &Pool<Postgres>,
    req: &CreateCourtDateRequest,
) -> Result<CourtDate, AppError> {
    sqlx::query_as::<_, CourtDate>(&format!(
        "INSERT INTO court_dates
            (client_id, court_name, case_number, hearing_type, scheduled_at, location, notes)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {COURT_DATE_COLUMNS}"
    ))
    .bind(req.client_id)
    .bind(req.court_name.trim())
    .bind(req.case_number.as_deref())
    .bind(req.hearing_type.as_deref())
    .bind(req.scheduled_at)
    .bind(req.location.as_deref())
    .bind(req.notes.as_deref())
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<CourtDate>, AppError> {
    sqlx::query_as::<_, CourtDate>(&format!(
        "SELECT {COURT_DATE_COLUMNS} FROM court_dates WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Soonest first. `upcoming_days` restricts to hearings between now and
/// that many days ahead.
pub async fn list(
    pool: &Pool<Postgres>,
    client_id: Option<Uuid>,
    status: Option<&str>,
    upcoming_days: Option<i32>,
    offset: i64,
    limit: i64,
) -> Result<(Vec<CourtDate>, i64), AppError> {
    let filter = "($1::UUID IS NULL OR client_id = $1)
          AND ($2::TEXT IS NULL OR status = $2)
          AND ($3::INT IS NULL OR (scheduled_at >= NOW()
               AND scheduled_at <= NOW() + make_interval(days => $3::INT)))";

    let total = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM court_dates WHERE {filter}"
    ))
    .bind(client_id)
    .bind(status)
    .bind(upcoming_days)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let rows = sqlx::query_as::<_, CourtDate>(&format!(
        "SELECT {COURT_DATE_COLUMNS} FROM court_dates WHERE {filter}
         ORDER BY scheduled_at ASC
         LIMIT $4 OFFSET $5"
    ))
    .bind(client_id)
    .bind(status)
    .bind(upcoming_days)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}

/// Partial update; `None` fields keep their current value.
pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: &UpdateCourtDateRequest,
) -> Result<Option<CourtDate>, AppError> {
    sqlx::query_as::<_, CourtDate>(&format!(
        "UPDATE court_dates SET
            court_name = COALESCE($2, court_name),
            case_number = COALESCE($3, case_number),
            hearing_type = COALESCE($4, hearing_type),
            scheduled_at = COALESCE($5, scheduled_at),
            location = COALESCE($6, location),
            notes = COALESCE($7, notes),
            updated_at = NOW()
         WHERE id = $1
         RETURNING {COURT_DATE_COLUMNS}"
    ))
    .bind(id)
    .bind(req.court_name.as_deref().map(str::trim))
    .bind(req.case_number.as_deref())
    .bind(req.hearing_type.as_deref())
    .bind(req.scheduled_at)
    .bind(req.location.as_deref())
    .bind(req.notes.as_deref())
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn update_status(
    pool: &Pool<Postgres>,
    id: Uuid,
    status: &str,
) -> Result<Option<CourtDate>, AppError> {
    sqlx::query_as::<_, CourtDate>(&format!(
        "UPDATE court_dates SET status = $2, updated_at = NOW() WHERE id = $1
         RETURNING {COURT_DATE_COLUMNS}"
    ))
    .bind(id)
    .bind(status)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn delete(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM court_dates WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected() > 0)
}

/// Next scheduled hearing for a client.
pub async fn next_for_client(
    pool: &Pool<Postgres>,
    client_id: Uuid,
) -> Result<Option<CourtDate>, AppError> {
    sqlx::query_as::<_, CourtDate>(&format!(
        "SELECT {COURT_DATE_COLUMNS} FROM court_dates
         WHERE client_id = $1 AND status = 'scheduled' AND scheduled_at > NOW()
         ORDER BY scheduled_at ASC
         LIMIT 1"
    ))
    .bind(client_id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Scheduled future hearings within `horizon_days` calendar days.
pub async fn reminder_candidates(
    pool: &Pool<Postgres>,
    horizon_days: i32,
) -> Result<Vec<ReminderCandidate>, AppError> {
    sqlx::query_as::<_, ReminderCandidate>(
        "SELECT cd.id, cd.client_id, cd.court_name, cd.case_number, cd.hearing_type,
                cd.scheduled_at, cd.location, cd.status, cd.notes, cd.created_at, cd.updated_at,
                c.user_id AS client_user_id,
                COALESCE(ARRAY_AGG(r.offset_days) FILTER (WHERE r.offset_days IS NOT NULL),
                         '{}'::INT[]) AS sent_offsets
         FROM court_dates cd
         JOIN clients c ON c.id = cd.client_id
         LEFT JOIN court_date_reminders r ON r.court_date_id = cd.id
         WHERE cd.status = 'scheduled'
           AND cd.scheduled_at > NOW()
           AND cd.scheduled_at < NOW() + make_interval(days => $1 + 1)
         GROUP BY cd.id, c.user_id
         ORDER BY cd.scheduled_at ASC",
    )
    .bind(horizon_days)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Mark offsets as sent. Returns how many were newly recorded; zero means
/// another sweep got there first.
pub async fn record_reminders<'e>(
    executor: impl PgExecutor<'e>,
    court_date_id: Uuid,
    offsets: &[i32],
) -> Result<u64, AppError> {
    let result = sqlx::query(
        "INSERT INTO court_date_reminders (court_date_id, offset_days)
         SELECT $1, UNNEST($2::INT[])
         ON CONFLICT DO NOTHING",
    )
    .bind(court_date_id)
    .bind(offsets)
    .execute(executor)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected())
}
