use shared_types::{AppError, Client, CreateClientRequest, UpdateClientRequest};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const CLIENT_COLUMNS: &str = "id, user_id, first_name, last_name, email, phone, date_of_birth, \
     address, case_number, bond_amount_cents, premium_cents, status, notes, created_at, updated_at";

/// Insert a new client record.
pub async fn create(
    pool: &Pool<Postgres>,
    req: &CreateClientRequest,
    status: &str,
) -> Result<Client, AppError> {
    sqlx::query_as::<_, Client>(&format!(
        "INSERT INTO clients
            (user_id, first_name, last_name, email, phone, date_of_birth, address,
             case_number, bond_amount_cents, premium_cents, status, notes)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         RETURNING {CLIENT_COLUMNS}"
    ))
    .bind(req.user_id)
    .bind(req.first_name.trim())
    .bind(req.last_name.trim())
    .bind(req.email.as_deref())
    .bind(req.phone.as_deref())
    .bind(req.date_of_birth)
    .bind(req.address.as_deref())
    .bind(req.case_number.as_deref())
    .bind(req.bond_amount_cents)
    .bind(req.premium_cents)
    .bind(status)
    .bind(req.notes.as_deref())
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Client>, AppError> {
    sqlx::query_as::<_, Client>(&format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// The client record linked to a login account, if any.
pub async fn find_by_user_id(
    pool: &Pool<Postgres>,
    user_id: i64,
) -> Result<Option<Client>, AppError> {
    sqlx::query_as::<_, Client>(&format!(
        "SELECT {CLIENT_COLUMNS} FROM clients WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Search clients by name, email or case number with optional status filter.
pub async fn list(
    pool: &Pool<Postgres>,
    q: Option<&str>,
    status: Option<&str>,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Client>, i64), AppError> {
    let search = q
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.to_lowercase()));

    let filter = "($1::TEXT IS NULL
              OR LOWER(first_name || ' ' || last_name) LIKE $1
              OR LOWER(COALESCE(email, '')) LIKE $1
              OR LOWER(COALESCE(case_number, '')) LIKE $1)
          AND ($2::TEXT IS NULL OR status = $2)";

    let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM clients WHERE {filter}"))
        .bind(search.as_deref())
        .bind(status)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let rows = sqlx::query_as::<_, Client>(&format!(
        "SELECT {CLIENT_COLUMNS} FROM clients WHERE {filter}
         ORDER BY last_name ASC, first_name ASC, created_at ASC
         LIMIT $3 OFFSET $4"
    ))
    .bind(search.as_deref())
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}

/// Apply a partial update. Fields left as `None` keep their current value.
pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: &UpdateClientRequest,
) -> Result<Option<Client>, AppError> {
    sqlx::query_as::<_, Client>(&format!(
        "UPDATE clients SET
            first_name = COALESCE($2, first_name),
            last_name = COALESCE($3, last_name),
            email = COALESCE($4, email),
            phone = COALESCE($5, phone),
            date_of_birth = COALESCE($6, date_of_birth),
            address = COALESCE($7, address),
            case_number = COALESCE($8, case_number),
            bond_amount_cents = COALESCE($9, bond_amount_cents),
            premium_cents = COALESCE($10, premium_cents),
            notes = COALESCE($11, notes),
            user_id = COALESCE($12, user_id),
            updated_at = NOW()
         WHERE id = $1
         RETURNING {CLIENT_COLUMNS}"
    ))
    .bind(id)
    .bind(req.first_name.as_deref().map(str::trim))
    .bind(req.last_name.as_deref().map(str::trim))
    .bind(req.email.as_deref())
    .bind(req.phone.as_deref())
    .bind(req.date_of_birth)
    .bind(req.address.as_deref())
    .bind(req.case_number.as_deref())
    .bind(req.bond_amount_cents)
    .bind(req.premium_cents)
    .bind(req.notes.as_deref())
    .bind(req.user_id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn update_status(
    pool: &Pool<Postgres>,
    id: Uuid,
    status: &str,
) -> Result<Option<Client>, AppError> {
    sqlx::query_as::<_, Client>(&format!(
        "UPDATE clients SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {CLIENT_COLUMNS}"
    ))
    .bind(id)
    .bind(status)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Delete a client and, by cascade, its payments, check-ins and court dates.
pub async fn delete(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM clients WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected() > 0)
}
