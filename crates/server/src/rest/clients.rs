use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::json;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use shared_types::{
    normalize_pagination, page_offset, AlertResponse, AppError, CheckInResponse, Client,
    ClientListParams, ClientResponse, CourtDateResponse, CreateClientRequest, PageParams,
    PaginatedResponse, PaymentResponse, PaymentSummary, UpdateClientRequest,
    UpdateClientStatusRequest, UserRole, CLIENT_STATUSES,
};

use super::{optional_filter, parse_uuid, require_one_of};
use crate::extract::{Json, Query};
use crate::auth::extractors::AdminRequired;
use crate::error_convert::ValidateRequest;
use crate::repo::audit::{self, AuditEntry};

/// A client may only be linked to an existing account with the client role.
async fn ensure_client_account(pool: &Pool<Postgres>, user_id: i64) -> Result<(), AppError> {
    let user = crate::repo::user::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::invalid_field("user_id", format!("User {} does not exist", user_id)))?;

    if UserRole::parse(&user.role) != Some(UserRole::Client) {
        return Err(AppError::invalid_field(
            "user_id",
            "Only accounts with the client role can be linked to a client",
        ));
    }
    Ok(())
}

pub(crate) async fn load_client(pool: &Pool<Postgres>, id: Uuid) -> Result<Client, AppError> {
    crate::repo::client::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Client {} not found", id)))
}

/// GET /api/clients
#[utoipa::path(
    get,
    path = "/api/clients",
    params(ClientListParams),
    responses(
        (status = 200, description = "Paginated clients", body = PaginatedResponse<ClientResponse>),
        (status = 400, description = "Invalid filter", body = AppError)
    ),
    tag = "clients"
)]
#[tracing::instrument(skip(pool))]
pub async fn list_clients(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Query(params): Query<ClientListParams>,
) -> Result<Json<PaginatedResponse<ClientResponse>>, AppError> {
    let status = optional_filter("status", params.status.as_deref(), CLIENT_STATUSES)?;
    let q = params.q.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let (page, limit) = normalize_pagination(params.page, params.limit);

    let (clients, total) =
        crate::repo::client::list(&pool, q, status, page_offset(page, limit), limit).await?;

    Ok(Json(
        PaginatedResponse::new(clients, page, limit, total).map(ClientResponse::from),
    ))
}

/// POST /api/clients
#[utoipa::path(
    post,
    path = "/api/clients",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created", body = ClientResponse),
        (status = 400, description = "Validation error", body = AppError)
    ),
    tag = "clients"
)]
#[tracing::instrument(skip(pool, body))]
pub async fn create_client(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Json(body): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ClientResponse>), AppError> {
    body.validate_request()?;

    let status = body.status.as_deref().unwrap_or("active");
    require_one_of("status", status, CLIENT_STATUSES)?;
    if let Some(user_id) = body.user_id {
        ensure_client_account(&pool, user_id).await?;
    }

    let client = crate::repo::client::create(&pool, &body, status).await?;

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "client.create", "client").entity(client.id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(ClientResponse::from(client))))
}

/// GET /api/clients/{id}
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    params(("id" = String, Path, description = "Client UUID")),
    responses(
        (status = 200, description = "Client found", body = ClientResponse),
        (status = 404, description = "Client not found", body = AppError)
    ),
    tag = "clients"
)]
#[tracing::instrument(skip(pool))]
pub async fn get_client(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Path(id): Path<String>,
) -> Result<Json<ClientResponse>, AppError> {
    let id = parse_uuid(&id, "client")?;
    Ok(Json(ClientResponse::from(load_client(&pool, id).await?)))
}

/// PUT /api/clients/{id}
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    params(("id" = String, Path, description = "Client UUID")),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated", body = ClientResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Client not found", body = AppError)
    ),
    tag = "clients"
)]
#[tracing::instrument(skip(pool, body))]
pub async fn update_client(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Path(id): Path<String>,
    Json(body): Json<UpdateClientRequest>,
) -> Result<Json<ClientResponse>, AppError> {
    let id = parse_uuid(&id, "client")?;
    body.validate_request()?;
    if let Some(user_id) = body.user_id {
        ensure_client_account(&pool, user_id).await?;
    }

    let client = crate::repo::client::update(&pool, id, &body)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Client {} not found", id)))?;

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "client.update", "client").entity(id),
    )
    .await;

    Ok(Json(ClientResponse::from(client)))
}

/// PATCH /api/clients/{id}/status
#[utoipa::path(
    patch,
    path = "/api/clients/{id}/status",
    params(("id" = String, Path, description = "Client UUID")),
    request_body = UpdateClientStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ClientResponse),
        (status = 400, description = "Invalid status", body = AppError),
        (status = 404, description = "Client not found", body = AppError)
    ),
    tag = "clients"
)]
#[tracing::instrument(skip(pool))]
pub async fn update_client_status(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Path(id): Path<String>,
    Json(body): Json<UpdateClientStatusRequest>,
) -> Result<Json<ClientResponse>, AppError> {
    let id = parse_uuid(&id, "client")?;
    require_one_of("status", &body.status, CLIENT_STATUSES)?;

    let client = crate::repo::client::update_status(&pool, id, &body.status)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Client {} not found", id)))?;

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "client.status_change", "client")
            .entity(id)
            .details(json!({ "status": body.status })),
    )
    .await;

    Ok(Json(ClientResponse::from(client)))
}

/// DELETE /api/clients/{id}
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    params(("id" = String, Path, description = "Client UUID")),
    responses(
        (status = 204, description = "Client deleted"),
        (status = 404, description = "Client not found", body = AppError)
    ),
    tag = "clients"
)]
#[tracing::instrument(skip(pool))]
pub async fn delete_client(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_uuid(&id, "client")?;

    if !crate::repo::client::delete(&pool, id).await? {
        return Err(AppError::not_found(format!("Client {} not found", id)));
    }

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "client.delete", "client").entity(id),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

// ── Nested collections ──────────────────────────────────────────────

/// GET /api/clients/{id}/payments
#[utoipa::path(
    get,
    path = "/api/clients/{id}/payments",
    params(("id" = String, Path, description = "Client UUID"), PageParams),
    responses(
        (status = 200, description = "Client payments, newest first", body = PaginatedResponse<PaymentResponse>),
        (status = 404, description = "Client not found", body = AppError)
    ),
    tag = "clients"
)]
#[tracing::instrument(skip(pool))]
pub async fn list_client_payments(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedResponse<PaymentResponse>>, AppError> {
    let id = parse_uuid(&id, "client")?;
    load_client(&pool, id).await?;
    let (page, limit) = normalize_pagination(params.page, params.limit);

    let (payments, total) =
        crate::repo::payment::list(&pool, Some(id), None, None, page_offset(page, limit), limit)
            .await?;

    Ok(Json(
        PaginatedResponse::new(payments, page, limit, total).map(PaymentResponse::from),
    ))
}

/// GET /api/clients/{id}/payments/summary
#[utoipa::path(
    get,
    path = "/api/clients/{id}/payments/summary",
    params(("id" = String, Path, description = "Client UUID")),
    responses(
        (status = 200, description = "Premium, paid and outstanding totals", body = PaymentSummary),
        (status = 404, description = "Client not found", body = AppError)
    ),
    tag = "clients"
)]
#[tracing::instrument(skip(pool))]
pub async fn client_payment_summary(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Path(id): Path<String>,
) -> Result<Json<PaymentSummary>, AppError> {
    let id = parse_uuid(&id, "client")?;
    let client = load_client(&pool, id).await?;
    let totals = crate::repo::payment::totals_for_client(&pool, id).await?;
    Ok(Json(PaymentSummary::compute(id, client.premium_cents, totals)))
}

/// GET /api/clients/{id}/check-ins
#[utoipa::path(
    get,
    path = "/api/clients/{id}/check-ins",
    params(("id" = String, Path, description = "Client UUID"), PageParams),
    responses(
        (status = 200, description = "Client check-ins, newest first", body = PaginatedResponse<CheckInResponse>),
        (status = 404, description = "Client not found", body = AppError)
    ),
    tag = "clients"
)]
#[tracing::instrument(skip(pool))]
pub async fn list_client_check_ins(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedResponse<CheckInResponse>>, AppError> {
    let id = parse_uuid(&id, "client")?;
    load_client(&pool, id).await?;
    let (page, limit) = normalize_pagination(params.page, params.limit);

    let (check_ins, total) =
        crate::repo::check_in::list(&pool, Some(id), false, page_offset(page, limit), limit)
            .await?;

    Ok(Json(
        PaginatedResponse::new(check_ins, page, limit, total).map(CheckInResponse::from),
    ))
}

/// GET /api/clients/{id}/court-dates
#[utoipa::path(
    get,
    path = "/api/clients/{id}/court-dates",
    params(("id" = String, Path, description = "Client UUID"), PageParams),
    responses(
        (status = 200, description = "Client court dates by schedule", body = PaginatedResponse<CourtDateResponse>),
        (status = 404, description = "Client not found", body = AppError)
    ),
    tag = "clients"
)]
#[tracing::instrument(skip(pool))]
pub async fn list_client_court_dates(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedResponse<CourtDateResponse>>, AppError> {
    let id = parse_uuid(&id, "client")?;
    load_client(&pool, id).await?;
    let (page, limit) = normalize_pagination(params.page, params.limit);

    let (court_dates, total) = crate::repo::court_date::list(
        &pool,
        Some(id),
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

/// GET /api/clients/{id}/alerts
#[utoipa::path(
    get,
    path = "/api/clients/{id}/alerts",
    params(("id" = String, Path, description = "Client UUID"), PageParams),
    responses(
        (status = 200, description = "Alerts raised for the client", body = PaginatedResponse<AlertResponse>),
        (status = 404, description = "Client not found", body = AppError)
    ),
    tag = "clients"
)]
#[tracing::instrument(skip(pool))]
pub async fn list_client_alerts(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedResponse<AlertResponse>>, AppError> {
    let id = parse_uuid(&id, "client")?;
    load_client(&pool, id).await?;
    let (page, limit) = normalize_pagination(params.page, params.limit);

    let (alerts, total) = crate::repo::alert::list(
        &pool,
        None,
        None,
        None,
        Some(id),
        page_offset(page, limit),
        limit,
    )
    .await?;

    Ok(Json(
        PaginatedResponse::new(alerts, page, limit, total).map(AlertResponse::from),
    ))
}
