use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::json;
use sqlx::{Pool, Postgres};

use shared_types::{
    next_alert_status, normalize_pagination, page_offset, AlertAction, AlertListParams,
    AlertResponse, AppError, CreateAlertRequest, MissedCheckInScanResponse, PaginatedResponse,
    ALERT_SEVERITIES, ALERT_STATUSES, ALERT_TYPES,
};

use super::{optional_filter, parse_optional_uuid, parse_uuid, require_one_of};
use crate::extract::{Json, Query};
use crate::auth::extractors::AdminRequired;
use crate::error_convert::ValidateRequest;
use crate::repo::alert::NewAlert;
use crate::repo::audit::{self, AuditEntry};

/// GET /api/alerts
#[utoipa::path(
    get,
    path = "/api/alerts",
    params(AlertListParams),
    responses(
        (status = 200, description = "Paginated alerts, newest first", body = PaginatedResponse<AlertResponse>),
        (status = 400, description = "Invalid filter", body = AppError)
    ),
    tag = "alerts"
)]
#[tracing::instrument(skip(pool))]
pub async fn list_alerts(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Query(params): Query<AlertListParams>,
) -> Result<Json<PaginatedResponse<AlertResponse>>, AppError> {
    let status = optional_filter("status", params.status.as_deref(), ALERT_STATUSES)?;
    let severity = optional_filter("severity", params.severity.as_deref(), ALERT_SEVERITIES)?;
    let alert_type = optional_filter("alert_type", params.alert_type.as_deref(), ALERT_TYPES)?;
    let client_id = parse_optional_uuid(params.client_id.as_deref(), "client")?;
    let (page, limit) = normalize_pagination(params.page, params.limit);

    let (alerts, total) = crate::repo::alert::list(
        &pool,
        status,
        severity,
        alert_type,
        client_id,
        page_offset(page, limit),
        limit,
    )
    .await?;

    Ok(Json(
        PaginatedResponse::new(alerts, page, limit, total).map(AlertResponse::from),
    ))
}

/// POST /api/alerts
#[utoipa::path(
    post,
    path = "/api/alerts",
    request_body = CreateAlertRequest,
    responses(
        (status = 201, description = "Alert opened", body = AlertResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Client not found", body = AppError)
    ),
    tag = "alerts"
)]
#[tracing::instrument(skip(pool, body), fields(alert_type = %body.alert_type))]
pub async fn create_alert(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Json(body): Json<CreateAlertRequest>,
) -> Result<(StatusCode, Json<AlertResponse>), AppError> {
    body.validate_request()?;
    require_one_of("alert_type", &body.alert_type, ALERT_TYPES)?;
    require_one_of("severity", &body.severity, ALERT_SEVERITIES)?;
    if let Some(client_id) = body.client_id {
        super::clients::load_client(&pool, client_id).await?;
    }

    let alert = crate::repo::alert::create(
        &pool,
        NewAlert {
            client_id: body.client_id,
            alert_type: &body.alert_type,
            severity: &body.severity,
            message: body.message.trim(),
            details: body.details.clone().unwrap_or_else(|| json!({})),
        },
    )
    .await?;

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "alert.create", "alert")
            .entity(alert.id)
            .details(json!({ "alert_type": alert.alert_type, "severity": alert.severity })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(AlertResponse::from(alert))))
}

/// GET /api/alerts/{id}
#[utoipa::path(
    get,
    path = "/api/alerts/{id}",
    params(("id" = String, Path, description = "Alert UUID")),
    responses(
        (status = 200, description = "Alert found", body = AlertResponse),
        (status = 404, description = "Alert not found", body = AppError)
    ),
    tag = "alerts"
)]
#[tracing::instrument(skip(pool))]
pub async fn get_alert(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Path(id): Path<String>,
) -> Result<Json<AlertResponse>, AppError> {
    let id = parse_uuid(&id, "alert")?;
    let alert = crate::repo::alert::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Alert {} not found", id)))?;
    Ok(Json(AlertResponse::from(alert)))
}

/// Apply a staff action, refusing moves the lifecycle does not allow.
async fn apply_action(
    pool: &Pool<Postgres>,
    auth: &AdminRequired,
    raw_id: &str,
    action: AlertAction,
) -> Result<AlertResponse, AppError> {
    let id = parse_uuid(raw_id, "alert")?;
    let current = crate::repo::alert::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Alert {} not found", id)))?;

    let conflict =
        || AppError::conflict(format!("Cannot {} an alert that is {}", action.as_str(), current.status));
    let next = next_alert_status(&current.status, action).ok_or_else(conflict)?;

    let alert = crate::repo::alert::transition(pool, id, &current.status, next, auth.0.sub)
        .await?
        .ok_or_else(conflict)?;

    audit::record(
        pool,
        AuditEntry::new(Some(auth.0.sub), &format!("alert.{}", action.as_str()), "alert")
            .entity(id)
            .details(json!({ "from": current.status, "to": alert.status })),
    )
    .await;

    Ok(AlertResponse::from(alert))
}

/// POST /api/alerts/{id}/acknowledge
#[utoipa::path(
    post,
    path = "/api/alerts/{id}/acknowledge",
    params(("id" = String, Path, description = "Alert UUID")),
    responses(
        (status = 200, description = "Alert acknowledged", body = AlertResponse),
        (status = 404, description = "Alert not found", body = AppError),
        (status = 409, description = "Alert is not open", body = AppError)
    ),
    tag = "alerts"
)]
#[tracing::instrument(skip(pool))]
pub async fn acknowledge_alert(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Path(id): Path<String>,
) -> Result<Json<AlertResponse>, AppError> {
    Ok(Json(apply_action(&pool, &auth, &id, AlertAction::Acknowledge).await?))
}

/// POST /api/alerts/{id}/resolve
#[utoipa::path(
    post,
    path = "/api/alerts/{id}/resolve",
    params(("id" = String, Path, description = "Alert UUID")),
    responses(
        (status = 200, description = "Alert resolved", body = AlertResponse),
        (status = 404, description = "Alert not found", body = AppError),
        (status = 409, description = "Alert already resolved", body = AppError)
    ),
    tag = "alerts"
)]
#[tracing::instrument(skip(pool))]
pub async fn resolve_alert(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Path(id): Path<String>,
) -> Result<Json<AlertResponse>, AppError> {
    Ok(Json(apply_action(&pool, &auth, &id, AlertAction::Resolve).await?))
}

/// POST /api/alerts/scan/missed-check-ins
#[utoipa::path(
    post,
    path = "/api/alerts/scan/missed-check-ins",
    responses(
        (status = 200, description = "Scan finished", body = MissedCheckInScanResponse),
        (status = 403, description = "Admin role required", body = AppError)
    ),
    tag = "alerts"
)]
#[tracing::instrument(skip(pool))]
pub async fn scan_missed_check_ins(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
) -> Result<Json<MissedCheckInScanResponse>, AppError> {
    let result = crate::sweeps::scan_missed_check_ins(&pool).await?;

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "alert.scan_missed_check_ins", "alert").details(json!({
            "clients_checked": result.clients_checked,
            "alerts_created": result.alerts_created,
        })),
    )
    .await;

    Ok(Json(result))
}
