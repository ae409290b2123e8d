use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::json;
use sqlx::{Pool, Postgres};

use shared_types::{
    can_transition_payment, normalize_pagination, page_offset, AppError, Client,
    CreatePaymentRequest, PaginatedResponse, Payment, PaymentListParams, PaymentResponse,
    UpdatePaymentStatusRequest, PAYMENT_METHODS, PAYMENT_STATUSES,
};

use super::{optional_filter, parse_optional_uuid, parse_uuid, require_one_of};
use crate::extract::{Json, Query};
use crate::auth::extractors::AdminRequired;
use crate::error_convert::ValidateRequest;
use crate::repo::audit::{self, AuditEntry};
use crate::repo::payment::NewPayment;

/// `12345` -> `$123.45`
pub(crate) fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}

/// Tell the client's linked account that a payment went through.
/// Failures are logged; the payment itself already succeeded.
pub(crate) async fn notify_payment_completed(pool: &Pool<Postgres>, client: &Client, payment: &Payment) {
    let Some(user_id) = client.user_id else {
        return;
    };
    let message = format!(
        "We received your payment of {} (receipt {}).",
        format_cents(payment.amount_cents),
        payment.receipt_number
    );
    if let Err(e) =
        crate::repo::notification::create(pool, user_id, "payment", "Payment received", &message)
            .await
    {
        tracing::warn!(payment_id = %payment.id, error = %e, "Failed to send payment notification");
    }
}

/// GET /api/payments
#[utoipa::path(
    get,
    path = "/api/payments",
    params(PaymentListParams),
    responses(
        (status = 200, description = "Paginated payments, newest first", body = PaginatedResponse<PaymentResponse>),
        (status = 400, description = "Invalid filter", body = AppError)
    ),
    tag = "payments"
)]
#[tracing::instrument(skip(pool))]
pub async fn list_payments(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Query(params): Query<PaymentListParams>,
) -> Result<Json<PaginatedResponse<PaymentResponse>>, AppError> {
    let client_id = parse_optional_uuid(params.client_id.as_deref(), "client")?;
    let status = optional_filter("status", params.status.as_deref(), PAYMENT_STATUSES)?;
    let method = optional_filter("method", params.method.as_deref(), PAYMENT_METHODS)?;
    let (page, limit) = normalize_pagination(params.page, params.limit);

    let (payments, total) = crate::repo::payment::list(
        &pool,
        client_id,
        status,
        method,
        page_offset(page, limit),
        limit,
    )
    .await?;

    Ok(Json(
        PaginatedResponse::new(payments, page, limit, total).map(PaymentResponse::from),
    ))
}

/// POST /api/payments
#[utoipa::path(
    post,
    path = "/api/payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Client not found", body = AppError)
    ),
    tag = "payments"
)]
#[tracing::instrument(skip(pool, body), fields(client_id = %body.client_id))]
pub async fn create_payment(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Json(body): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), AppError> {
    body.validate_request()?;
    require_one_of("method", &body.method, PAYMENT_METHODS)?;
    let status = body.status.as_deref().unwrap_or("completed");
    require_one_of("status", status, PAYMENT_STATUSES)?;

    let client = super::clients::load_client(&pool, body.client_id).await?;

    let payment = crate::repo::payment::create(
        &pool,
        NewPayment {
            client_id: client.id,
            amount_cents: body.amount_cents,
            method: &body.method,
            status,
            paid_at: body.paid_at,
            notes: body.notes.as_deref(),
            recorded_by: Some(auth.0.sub),
        },
    )
    .await?;

    if payment.status == "completed" {
        notify_payment_completed(&pool, &client, &payment).await;
    }

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "payment.create", "payment")
            .entity(payment.id)
            .details(json!({
                "client_id": client.id,
                "amount_cents": payment.amount_cents,
                "status": payment.status,
            })),
    )
    .await;

    tracing::info!(payment_id = %payment.id, receipt = %payment.receipt_number, "Payment recorded");

    Ok((StatusCode::CREATED, Json(PaymentResponse::from(payment))))
}

/// GET /api/payments/{id}
#[utoipa::path(
    get,
    path = "/api/payments/{id}",
    params(("id" = String, Path, description = "Payment UUID")),
    responses(
        (status = 200, description = "Payment found", body = PaymentResponse),
        (status = 404, description = "Payment not found", body = AppError)
    ),
    tag = "payments"
)]
#[tracing::instrument(skip(pool))]
pub async fn get_payment(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, AppError> {
    let id = parse_uuid(&id, "payment")?;
    let payment = crate::repo::payment::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Payment {} not found", id)))?;
    Ok(Json(PaymentResponse::from(payment)))
}

/// PATCH /api/payments/{id}/status
#[utoipa::path(
    patch,
    path = "/api/payments/{id}/status",
    params(("id" = String, Path, description = "Payment UUID")),
    request_body = UpdatePaymentStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = PaymentResponse),
        (status = 400, description = "Invalid status", body = AppError),
        (status = 404, description = "Payment not found", body = AppError),
        (status = 409, description = "Transition not allowed", body = AppError)
    ),
    tag = "payments"
)]
#[tracing::instrument(skip(pool))]
pub async fn update_payment_status(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Path(id): Path<String>,
    Json(body): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<PaymentResponse>, AppError> {
    let id = parse_uuid(&id, "payment")?;
    require_one_of("status", &body.status, PAYMENT_STATUSES)?;

    let current = crate::repo::payment::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Payment {} not found", id)))?;

    let conflict = |from: &str| {
        AppError::conflict(format!(
            "Cannot change payment status from {} to {}",
            from, body.status
        ))
    };
    if !can_transition_payment(&current.status, &body.status) {
        return Err(conflict(&current.status));
    }

    // Guarded on the status we just read, so a concurrent change loses cleanly.
    let payment = crate::repo::payment::update_status(&pool, id, &current.status, &body.status)
        .await?
        .ok_or_else(|| conflict(&current.status))?;

    if payment.status == "completed" {
        if let Some(client) = crate::repo::client::find_by_id(&pool, payment.client_id).await? {
            notify_payment_completed(&pool, &client, &payment).await;
        }
    }

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "payment.status_change", "payment")
            .entity(id)
            .details(json!({ "from": current.status, "to": payment.status })),
    )
    .await;

    Ok(Json(PaymentResponse::from(payment)))
}

/// DELETE /api/payments/{id}
#[utoipa::path(
    delete,
    path = "/api/payments/{id}",
    params(("id" = String, Path, description = "Payment UUID")),
    responses(
        (status = 204, description = "Payment deleted"),
        (status = 404, description = "Payment not found", body = AppError)
    ),
    tag = "payments"
)]
#[tracing::instrument(skip(pool))]
pub async fn delete_payment(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_uuid(&id, "payment")?;

    if !crate::repo::payment::delete(&pool, id).await? {
        return Err(AppError::not_found(format!("Payment {} not found", id)));
    }

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "payment.delete", "payment").entity(id),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
