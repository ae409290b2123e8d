use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde_json::json;
use sqlx::{Pool, Postgres};

use shared_types::{
    normalize_pagination, page_offset, AppError, CourtDateListParams, CourtDateResponse,
    CreateCourtDateRequest, PaginatedResponse, ReminderRunResponse, UpdateCourtDateRequest,
    UpdateCourtDateStatusRequest, COURT_DATE_STATUSES,
};

use super::{optional_filter, parse_optional_uuid, parse_uuid, require_one_of};
use crate::extract::{Json, Query};
use crate::auth::extractors::AdminRequired;
use crate::error_convert::ValidateRequest;
use crate::repo::audit::{self, AuditEntry};

/// Longest look-ahead accepted by `upcoming_days`.
const MAX_UPCOMING_DAYS: i64 = 366;

fn parse_upcoming_days(raw: Option<i64>) -> Result<Option<i32>, AppError> {
    match raw {
        None => Ok(None),
        Some(d) if (0..=MAX_UPCOMING_DAYS).contains(&d) => Ok(Some(d as i32)),
        Some(_) => Err(AppError::invalid_field(
            "upcoming_days",
            format!("upcoming_days must be between 0 and {}", MAX_UPCOMING_DAYS),
        )),
    }
}

/// GET /api/court-dates
#[utoipa::path(
    get,
    path = "/api/court-dates",
    params(CourtDateListParams),
    responses(
        (status = 200, description = "Paginated court dates, soonest first", body = PaginatedResponse<CourtDateResponse>),
        (status = 400, description = "Invalid filter", body = AppError)
    ),
    tag = "court-dates"
)]
#[tracing::instrument(skip(pool))]
pub async fn list_court_dates(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Query(params): Query<CourtDateListParams>,
) -> Result<Json<PaginatedResponse<CourtDateResponse>>, AppError> {
    let client_id = parse_optional_uuid(params.client_id.as_deref(), "client")?;
    let status = optional_filter("status", params.status.as_deref(), COURT_DATE_STATUSES)?;
    let upcoming_days = parse_upcoming_days(params.upcoming_days)?;
    let (page, limit) = normalize_pagination(params.page, params.limit);

    let (court_dates, total) = crate::repo::court_date::list(
        &pool,
        client_id,
        status,
        upcoming_days,
        page_offset(page, limit),
        limit,
    )
    .await?;

    Ok(Json(
        PaginatedResponse::new(court_dates, page, limit, total).map(CourtDateResponse::from),
    ))
}

/// POST /api/court-dates
#[utoipa::path(
    post,
    path = "/api/court-dates",
    request_body = CreateCourtDateRequest,
    responses(
        (status = 201, description = "Court date scheduled", body = CourtDateResponse),
        (status = 400, description = "Validation error or date in the past", body = AppError),
        (status = 404, description = "Client not found", body = AppError)
    ),
    tag = "court-dates"
)]
#[tracing::instrument(skip(pool, body), fields(client_id = %body.client_id))]
pub async fn create_court_date(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Json(body): Json<CreateCourtDateRequest>,
) -> Result<(StatusCode, Json<CourtDateResponse>), AppError> {
    body.validate_request()?;
    if body.scheduled_at <= Utc::now() {
        return Err(AppError::invalid_field(
            "scheduled_at",
            "scheduled_at must be in the future",
        ));
    }
    super::clients::load_client(&pool, body.client_id).await?;

    let court_date = crate::repo::court_date::create(&pool, &body).await?;

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "court_date.create", "court_date")
            .entity(court_date.id)
            .details(json!({
                "client_id": court_date.client_id,
                "scheduled_at": court_date.scheduled_at.to_rfc3339(),
            })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(CourtDateResponse::from(court_date))))
}

/// GET /api/court-dates/{id}
#[utoipa::path(
    get,
    path = "/api/court-dates/{id}",
    params(("id" = String, Path, description = "Court date UUID")),
    responses(
        (status = 200, description = "Court date found", body = CourtDateResponse),
        (status = 404, description = "Court date not found", body = AppError)
    ),
    tag = "court-dates"
)]
#[tracing::instrument(skip(pool))]
pub async fn get_court_date(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Path(id): Path<String>,
) -> Result<Json<CourtDateResponse>, AppError> {
    let id = parse_uuid(&id, "court date")?;
    let court_date = crate::repo::court_date::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Court date {} not found", id)))?;
    Ok(Json(CourtDateResponse::from(court_date)))
}

/// PUT /api/court-dates/{id}
#[utoipa::path(
    put,
    path = "/api/court-dates/{id}",
    params(("id" = String, Path, description = "Court date UUID")),
    request_body = UpdateCourtDateRequest,
    responses(
        (status = 200, description = "Court date updated", body = CourtDateResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Court date not found", body = AppError)
    ),
    tag = "court-dates"
)]
#[tracing::instrument(skip(pool, body))]
pub async fn update_court_date(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Path(id): Path<String>,
    Json(body): Json<UpdateCourtDateRequest>,
) -> Result<Json<CourtDateResponse>, AppError> {
    let id = parse_uuid(&id, "court date")?;
    body.validate_request()?;

    let court_date = crate::repo::court_date::update(&pool, id, &body)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Court date {} not found", id)))?;

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "court_date.update", "court_date").entity(id),
    )
    .await;

    Ok(Json(CourtDateResponse::from(court_date)))
}

/// PATCH /api/court-dates/{id}/status
///
/// Marking a hearing `missed` also opens a high-severity `court_date` alert.
#[utoipa::path(
    patch,
    path = "/api/court-dates/{id}/status",
    params(("id" = String, Path, description = "Court date UUID")),
    request_body = UpdateCourtDateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = CourtDateResponse),
        (status = 400, description = "Invalid status", body = AppError),
        (status = 404, description = "Court date not found", body = AppError)
    ),
    tag = "court-dates"
)]
#[tracing::instrument(skip(pool))]
pub async fn update_court_date_status(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Path(id): Path<String>,
    Json(body): Json<UpdateCourtDateStatusRequest>,
) -> Result<Json<CourtDateResponse>, AppError> {
    let id = parse_uuid(&id, "court date")?;
    require_one_of("status", &body.status, COURT_DATE_STATUSES)?;

    let previous = crate::repo::court_date::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Court date {} not found", id)))?;
    let court_date = crate::repo::court_date::update_status(&pool, id, &body.status)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Court date {} not found", id)))?;

    if court_date.status == "missed" && previous.status != "missed" {
        let message = format!(
            "Missed court appearance at {} on {}",
            court_date.court_name,
            court_date.scheduled_at.format("%Y-%m-%d")
        );
        crate::repo::alert::create(
            &pool,
            crate::repo::alert::NewAlert {
                client_id: Some(court_date.client_id),
                alert_type: "court_date",
                severity: "high",
                message: &message,
                details: json!({ "court_date_id": court_date.id }),
            },
        )
        .await?;
    }

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "court_date.status_change", "court_date")
            .entity(id)
            .details(json!({ "from": previous.status, "to": court_date.status })),
    )
    .await;

    Ok(Json(CourtDateResponse::from(court_date)))
}

/// DELETE /api/court-dates/{id}
#[utoipa::path(
    delete,
    path = "/api/court-dates/{id}",
    params(("id" = String, Path, description = "Court date UUID")),
    responses(
        (status = 204, description = "Court date deleted"),
        (status = 404, description = "Court date not found", body = AppError)
    ),
    tag = "court-dates"
)]
#[tracing::instrument(skip(pool))]
pub async fn delete_court_date(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_uuid(&id, "court date")?;

    if !crate::repo::court_date::delete(&pool, id).await? {
        return Err(AppError::not_found(format!("Court date {} not found", id)));
    }

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "court_date.delete", "court_date").entity(id),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/court-dates/reminders/run
#[utoipa::path(
    post,
    path = "/api/court-dates/reminders/run",
    responses(
        (status = 200, description = "Reminder sweep finished", body = ReminderRunResponse),
        (status = 403, description = "Admin role required", body = AppError)
    ),
    tag = "court-dates"
)]
#[tracing::instrument(skip(pool))]
pub async fn run_reminders(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
) -> Result<Json<ReminderRunResponse>, AppError> {
    let result = crate::sweeps::run_reminder_sweep(&pool).await?;

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "court_date.reminders_run", "court_date").details(
            json!({
                "court_dates_checked": result.court_dates_checked,
                "reminders_sent": result.reminders_sent,
            }),
        ),
    )
    .await;

    Ok(Json(result))
}
