use axum::extract::State;

use sqlx::{Pool, Postgres};

use shared_types::{
    normalize_pagination, page_offset, AppError, AuditLogListParams, AuditLogResponse,
    PaginatedResponse,
};

use crate::extract::{Json, Query};
use crate::auth::extractors::MaintenanceRequired;

/// GET /api/audit-logs
#[utoipa::path(
    get,
    path = "/api/audit-logs",
    params(AuditLogListParams),
    responses(
        (status = 200, description = "Audit trail, newest first", body = PaginatedResponse<AuditLogResponse>),
        (status = 403, description = "Admin or maintenance role required", body = AppError)
    ),
    tag = "audit"
)]
#[tracing::instrument(skip(pool))]
pub async fn list_audit_logs(
    State(pool): State<Pool<Postgres>>,
    _auth: MaintenanceRequired,
    Query(params): Query<AuditLogListParams>,
) -> Result<Json<PaginatedResponse<AuditLogResponse>>, AppError> {
    let entity_type = params.entity_type.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let action = params.action.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let (page, limit) = normalize_pagination(params.page, params.limit);

    let (entries, total) = crate::repo::audit::list(
        &pool,
        entity_type,
        params.actor_user_id,
        action,
        page_offset(page, limit),
        limit,
    )
    .await?;

    Ok(Json(
        PaginatedResponse::new(entries, page, limit, total).map(AuditLogResponse::from),
    ))
}
