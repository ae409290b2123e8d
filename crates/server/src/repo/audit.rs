use shared_types::{AppError, AuditLog};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

const AUDIT_COLUMNS: &str =
    "id, actor_user_id, action, entity_type, entity_id, details, ip_address, created_at";

/// One audit trail entry.
#[derive(Debug)]
pub struct AuditEntry<'a> {
    pub actor_user_id: Option<i64>,
    pub action: &'a str,
    pub entity_type: &'a str,
    pub entity_id: Option<String>,
    pub details: serde_json::Value,
    pub ip_address: Option<String>,
}

impl<'a> AuditEntry<'a> {
    pub fn new(actor_user_id: Option<i64>, action: &'a str, entity_type: &'a str) -> Self {
        Self {
            actor_user_id,
            action,
            entity_type,
            entity_id: None,
            details: serde_json::Value::Object(Default::default()),
            ip_address: None,
        }
    }

    pub fn entity(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }
}

/// Write an audit entry. Failures are logged and never surface to the caller.
pub async fn record(pool: &Pool<Postgres>, entry: AuditEntry<'_>) {
    let result = sqlx::query(
        "INSERT INTO audit_logs (actor_user_id, action, entity_type, entity_id, details, ip_address)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(entry.actor_user_id)
    .bind(entry.action)
    .bind(entry.entity_type)
    .bind(entry.entity_id.as_deref())
    .bind(&entry.details)
    .bind(entry.ip_address.as_deref())
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::error!(
            action = entry.action,
            entity_type = entry.entity_type,
            entity_id = entry.entity_id.as_deref().unwrap_or(""),
            error = %e,
            "Failed to write audit log"
        );
    }
}

/// Newest first with optional filters.
pub async fn list(
    pool: &Pool<Postgres>,
    entity_type: Option<&str>,
    actor_user_id: Option<i64>,
    action: Option<&str>,
    offset: i64,
    limit: i64,
) -> Result<(Vec<AuditLog>, i64), AppError> {
    let filter = "($1::TEXT IS NULL OR entity_type = $1)
          AND ($2::BIGINT IS NULL OR actor_user_id = $2)
          AND ($3::TEXT IS NULL OR action = $3)";

    let total = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM audit_logs WHERE {filter}"
    ))
    .bind(entity_type)
    .bind(actor_user_id)
    .bind(action)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let rows = sqlx::query_as::<_, AuditLog>(&format!(
        "SELECT {AUDIT_COLUMNS} FROM audit_logs WHERE {filter}
         ORDER BY created_at DESC
         LIMIT $4 OFFSET $5"
    ))
    .bind(entity_type)
    .bind(actor_user_id)
    .bind(action)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}
