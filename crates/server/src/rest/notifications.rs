use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::json;
use sqlx::{Pool, Postgres};

use shared_types::{
    normalize_pagination, page_offset, AppError, CountResponse, NotificationListParams,
    NotificationResponse, PaginatedResponse, SendNotificationRequest, NOTIFICATION_KINDS,
};

use super::{parse_uuid, require_one_of};
use crate::extract::{Json, Query};
use crate::auth::extractors::{AdminRequired, AuthRequired};
use crate::error_convert::ValidateRequest;
use crate::repo::audit::{self, AuditEntry};

/// GET /api/notifications
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(NotificationListParams),
    responses(
        (status = 200, description = "Caller's notifications, newest first", body = PaginatedResponse<NotificationResponse>),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    tag = "notifications"
)]
#[tracing::instrument(skip(pool))]
pub async fn list_notifications(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Query(params): Query<NotificationListParams>,
) -> Result<Json<PaginatedResponse<NotificationResponse>>, AppError> {
    let (page, limit) = normalize_pagination(params.page, params.limit);

    let (items, total) = crate::repo::notification::list_for_user(
        &pool,
        auth.0.sub,
        params.unread_only.unwrap_or(false),
        page_offset(page, limit),
        limit,
    )
    .await?;

    Ok(Json(
        PaginatedResponse::new(items, page, limit, total).map(NotificationResponse::from),
    ))
}

/// GET /api/notifications/unread-count
#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Unread notification count", body = CountResponse),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    tag = "notifications"
)]
pub async fn unread_count(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
) -> Result<Json<CountResponse>, AppError> {
    let count = crate::repo::notification::unread_count(&pool, auth.0.sub).await?;
    Ok(Json(CountResponse { count }))
}

/// POST /api/notifications/{id}/read
#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification UUID")),
    responses(
        (status = 200, description = "Notification marked read", body = NotificationResponse),
        (status = 404, description = "Notification not found", body = AppError)
    ),
    tag = "notifications"
)]
#[tracing::instrument(skip(pool))]
pub async fn mark_read(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<NotificationResponse>, AppError> {
    let id = parse_uuid(&id, "notification")?;
    // Someone else's notification looks exactly like a missing one.
    let notification = crate::repo::notification::mark_read(&pool, id, auth.0.sub)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Notification {} not found", id)))?;
    Ok(Json(NotificationResponse::from(notification)))
}

/// POST /api/notifications/read-all
#[utoipa::path(
    post,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "Number of notifications marked read", body = CountResponse),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    tag = "notifications"
)]
#[tracing::instrument(skip(pool))]
pub async fn mark_all_read(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
) -> Result<Json<CountResponse>, AppError> {
    let updated = crate::repo::notification::mark_all_read(&pool, auth.0.sub).await?;
    Ok(Json(CountResponse {
        count: updated as i64,
    }))
}

/// DELETE /api/notifications/{id}
#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(("id" = String, Path, description = "Notification UUID")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 404, description = "Notification not found", body = AppError)
    ),
    tag = "notifications"
)]
#[tracing::instrument(skip(pool))]
pub async fn delete_notification(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_uuid(&id, "notification")?;
    if !crate::repo::notification::delete(&pool, id, auth.0.sub).await? {
        return Err(AppError::not_found(format!("Notification {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/notifications
#[utoipa::path(
    post,
    path = "/api/notifications",
    request_body = SendNotificationRequest,
    responses(
        (status = 201, description = "Notification sent", body = NotificationResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "User not found", body = AppError)
    ),
    tag = "notifications"
)]
#[tracing::instrument(skip(pool, body), fields(user_id = body.user_id))]
pub async fn send_notification(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Json(body): Json<SendNotificationRequest>,
) -> Result<(StatusCode, Json<NotificationResponse>), AppError> {
    body.validate_request()?;
    let kind = body.kind.as_deref().unwrap_or("system");
    require_one_of("kind", kind, NOTIFICATION_KINDS)?;

    if crate::repo::user::find_by_id(&pool, body.user_id).await?.is_none() {
        return Err(AppError::not_found(format!("User {} not found", body.user_id)));
    }

    let notification = crate::repo::notification::create(
        &pool,
        body.user_id,
        kind,
        body.title.trim(),
        body.message.trim(),
    )
    .await?;

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "notification.send", "notification")
            .entity(notification.id)
            .details(json!({ "user_id": body.user_id, "kind": kind })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(NotificationResponse::from(notification))))
}
