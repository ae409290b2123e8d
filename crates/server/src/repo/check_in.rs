use shared_types::{AppError, CheckIn};
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const CHECK_IN_COLUMNS: &str = "id, client_id, latitude, longitude, location_source, city, region, \
     within_jurisdiction, ip_address, notes, checked_in_at";

/// Resolved location data for a new check-in.
#[derive(Debug, Default)]
pub struct NewCheckIn<'a> {
    pub client_id: Uuid,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_source: &'a str,
    pub city: Option<&'a str>,
    pub region: Option<&'a str>,
    pub within_jurisdiction: Option<bool>,
    pub ip_address: Option<&'a str>,
    pub notes: Option<&'a str>,
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    new: NewCheckIn<'_>,
) -> Result<CheckIn, AppError> {
    sqlx::query_as::<_, CheckIn>(&format!(
        "INSERT INTO check_ins
            (client_id, latitude, longitude, location_source, city, region,
             within_jurisdiction, ip_address, notes)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {CHECK_IN_COLUMNS}"
    ))
    .bind(new.client_id)
    .bind(new.latitude)
    .bind(new.longitude)
    .bind(new.location_source)
    .bind(new.city)
    .bind(new.region)
    .bind(new.within_jurisdiction)
    .bind(new.ip_address)
    .bind(new.notes)
    .fetch_one(executor)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<CheckIn>, AppError> {
    sqlx::query_as::<_, CheckIn>(&format!("SELECT {CHECK_IN_COLUMNS} FROM check_ins WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Newest first. `violations_only` keeps rows found outside the jurisdiction.
pub async fn list(
    pool: &Pool<Postgres>,
    client_id: Option<Uuid>,
    violations_only: bool,
    offset: i64,
    limit: i64,
) -> Result<(Vec<CheckIn>, i64), AppError> {
    let filter = "($1::UUID IS NULL OR client_id = $1)
          AND (NOT $2 OR within_jurisdiction = FALSE)";

    let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM check_ins WHERE {filter}"))
        .bind(client_id)
        .bind(violations_only)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let rows = sqlx::query_as::<_, CheckIn>(&format!(
        "SELECT {CHECK_IN_COLUMNS} FROM check_ins WHERE {filter}
         ORDER BY checked_in_at DESC
         LIMIT $3 OFFSET $4"
    ))
    .bind(client_id)
    .bind(violations_only)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}

pub async fn latest_for_client(
    pool: &Pool<Postgres>,
    client_id: Uuid,
) -> Result<Option<CheckIn>, AppError> {
    sqlx::query_as::<_, CheckIn>(&format!(
        "SELECT {CHECK_IN_COLUMNS} FROM check_ins
         WHERE client_id = $1
         ORDER BY checked_in_at DESC
         LIMIT 1"
    ))
    .bind(client_id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
