//! Client self-service: everything here is scoped to the client record
//! linked to the caller's account.

use axum::{
    extract::State,
    http::StatusCode,
};
use chrono::Utc;
use serde_json::json;
use sqlx::{Pool, Postgres};

use shared_types::{
    is_check_in_overdue, normalize_pagination, page_offset, AppError, CheckInResponse, Client,
    ClientDashboard, ClientResponse, CourtDateResponse, PageParams, PaginatedResponse,
    PaymentResponse, PaymentSummary, SubmitPaymentRequest, PAYMENT_METHODS,
};

use super::require_one_of;
use crate::extract::{Json, Query};
use crate::auth::extractors::ClientRequired;
use crate::error_convert::ValidateRequest;
use crate::repo::audit::{self, AuditEntry};
use crate::repo::payment::NewPayment;

pub(crate) async fn linked_client(pool: &Pool<Postgres>, user_id: i64) -> Result<Client, AppError> {
    crate::repo::client::find_by_user_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("No client record is linked to your account"))
}

/// GET /api/me/client
#[utoipa::path(
    get,
    path = "/api/me/client",
    responses(
        (status = 200, description = "The caller's client record", body = ClientResponse),
        (status = 404, description = "No linked client record", body = AppError)
    ),
    tag = "me"
)]
pub async fn my_client(
    State(pool): State<Pool<Postgres>>,
    auth: ClientRequired,
) -> Result<Json<ClientResponse>, AppError> {
    let client = linked_client(&pool, auth.0.sub).await?;
    Ok(Json(ClientResponse::from(client)))
}

/// GET /api/me/dashboard
#[utoipa::path(
    get,
    path = "/api/me/dashboard",
    responses(
        (status = 200, description = "Balance, next hearing, check-in status and policies", body = ClientDashboard),
        (status = 404, description = "No linked client record", body = AppError)
    ),
    tag = "me"
)]
#[tracing::instrument(skip(pool))]
pub async fn my_dashboard(
    State(pool): State<Pool<Postgres>>,
    auth: ClientRequired,
) -> Result<Json<ClientDashboard>, AppError> {
    let client = linked_client(&pool, auth.0.sub).await?;
    let config = crate::repo::company_config::get(&pool).await?;

    let totals = crate::repo::payment::totals_for_client(&pool, client.id).await?;
    let next_court_date = crate::repo::court_date::next_for_client(&pool, client.id).await?;
    let last_check_in = crate::repo::check_in::latest_for_client(&pool, client.id).await?;
    let unread_notifications = crate::repo::notification::unread_count(&pool, auth.0.sub).await?;
    let policies = super::acknowledgments::policy_status(&pool, auth.0.sub).await?;

    let check_in_due = is_check_in_overdue(
        last_check_in.as_ref().map(|c| c.checked_in_at),
        client.created_at,
        config.check_in_interval_hours,
        Utc::now(),
    );

    Ok(Json(ClientDashboard {
        payments: PaymentSummary::compute(client.id, client.premium_cents, totals),
        client: ClientResponse::from(client),
        next_court_date: next_court_date.map(CourtDateResponse::from),
        last_check_in: last_check_in.map(CheckInResponse::from),
        check_in_due,
        unread_notifications,
        policies_acknowledged: policies.all_acknowledged(),
        policies,
    }))
}

/// GET /api/me/payments
#[utoipa::path(
    get,
    path = "/api/me/payments",
    params(PageParams),
    responses(
        (status = 200, description = "The caller's payments, newest first", body = PaginatedResponse<PaymentResponse>),
        (status = 404, description = "No linked client record", body = AppError)
    ),
    tag = "me"
)]
#[tracing::instrument(skip(pool))]
pub async fn my_payments(
    State(pool): State<Pool<Postgres>>,
    auth: ClientRequired,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedResponse<PaymentResponse>>, AppError> {
    let client = linked_client(&pool, auth.0.sub).await?;
    let (page, limit) = normalize_pagination(params.page, params.limit);

    let (payments, total) = crate::repo::payment::list(
        &pool,
        Some(client.id),
        None,
        None,
        page_offset(page, limit),
        limit,
    )
    .await?;

    Ok(Json(
        PaginatedResponse::new(payments, page, limit, total).map(PaymentResponse::from),
    ))
}

/// POST /api/me/payments
///
/// Client-submitted payments stay `pending` until staff confirm them.
#[utoipa::path(
    post,
    path = "/api/me/payments",
    request_body = SubmitPaymentRequest,
    responses(
        (status = 201, description = "Pending payment recorded", body = PaymentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "No linked client record", body = AppError)
    ),
    tag = "me"
)]
#[tracing::instrument(skip(pool, body))]
pub async fn submit_payment(
    State(pool): State<Pool<Postgres>>,
    auth: ClientRequired,
    Json(body): Json<SubmitPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), AppError> {
    body.validate_request()?;
    require_one_of("method", &body.method, PAYMENT_METHODS)?;
    let client = linked_client(&pool, auth.0.sub).await?;

    let payment = crate::repo::payment::create(
        &pool,
        NewPayment {
            client_id: client.id,
            amount_cents: body.amount_cents,
            method: &body.method,
            status: "pending",
            paid_at: None,
            notes: body.notes.as_deref(),
            recorded_by: Some(auth.0.sub),
        },
    )
    .await?;

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "payment.submit", "payment")
            .entity(payment.id)
            .details(json!({ "client_id": client.id, "amount_cents": payment.amount_cents })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(PaymentResponse::from(payment))))
}

/// GET /api/me/check-ins
#[utoipa::path(
    get,
    path = "/api/me/check-ins",
    params(PageParams),
    responses(
        (status = 200, description = "The caller's check-ins, newest first", body = PaginatedResponse<CheckInResponse>),
        (status = 404, description = "No linked client record", body = AppError)
    ),
    tag = "me"
)]
#[tracing::instrument(skip(pool))]
pub async fn my_check_ins(
    State(pool): State<Pool<Postgres>>,
    auth: ClientRequired,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedResponse<CheckInResponse>>, AppError> {
    let client = linked_client(&pool, auth.0.sub).await?;
    let (page, limit) = normalize_pagination(params.page, params.limit);

    let (check_ins, total) =
        crate::repo::check_in::list(&pool, Some(client.id), false, page_offset(page, limit), limit)
            .await?;

    Ok(Json(
        PaginatedResponse::new(check_ins, page, limit, total).map(CheckInResponse::from),
    ))
}

/// GET /api/me/court-dates
#[utoipa::path(
    get,
    path = "/api/me/court-dates",
    params(PageParams),
    responses(
        (status = 200, description = "The caller's court dates, soonest first", body = PaginatedResponse<CourtDateResponse>),
        (status = 404, description = "No linked client record", body = AppError)
    ),
    tag = "me"
)]
#[tracing::instrument(skip(pool))]
pub async fn my_court_dates(
    State(pool): State<Pool<Postgres>>,
    auth: ClientRequired,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedResponse<CourtDateResponse>>, AppError> {
    let client = linked_client(&pool, auth.0.sub).await?;
    let (page, limit) = normalize_pagination(params.page, params.limit);

    let (court_dates, total) = crate::repo::court_date::list(
        &pool,
        Some(client.id),
        None,
        None,
        page_offset(page, limit),
        limit,
    )
    .await?;

    Ok(Json(
        PaginatedResponse::new(court_dates, page, limit, total).map(CourtDateResponse::from),
    ))
}
