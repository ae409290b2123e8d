use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde_json::json;
use sqlx::{Pool, Postgres, Transaction};

use shared_types::{
    normalize_pagination, page_offset, AppError, CheckIn, CheckInListParams, CheckInResponse,
    CheckInResult, Client, CreateCheckInRequest, GeoPoint, JurisdictionBounds, PaginatedResponse,
    UserRole,
};

use super::{parse_optional_uuid, parse_uuid};
use crate::auth::extractors::{AdminRequired, AuthRequired};
use crate::extract::{Json, Query};
use crate::error_convert::{SqlxErrorExt, ValidateRequest};
use crate::geolocation::GeoLocator;
use crate::rate_limit::client_ip;
use crate::repo::audit::{self, AuditEntry};
use crate::repo::check_in::NewCheckIn;

/// Where a check-in's coordinates came from.
#[derive(Debug, Default)]
struct ResolvedLocation {
    point: Option<GeoPoint>,
    source: &'static str,
    city: Option<String>,
    region: Option<String>,
}

/// Device coordinates win. Without them, fall back to an IP lookup when
/// the geolocation integration is enabled. A failed lookup still records
/// the check-in, just without a location.
async fn resolve_location(
    device: Option<GeoPoint>,
    geo: Option<&GeoLocator>,
    ip: Option<&str>,
) -> ResolvedLocation {
    if let Some(point) = device {
        return ResolvedLocation {
            point: Some(point),
            source: "device",
            ..Default::default()
        };
    }

    let none = ResolvedLocation {
        source: "none",
        ..Default::default()
    };
    let (Some(geo), Some(ip)) = (geo, ip) else {
        return none;
    };

    match geo.lookup_ip(ip).await {
        Ok(loc) => ResolvedLocation {
            point: Some(loc.point),
            source: "ip_lookup",
            city: loc.city,
            region: loc.region,
        },
        Err(e) => {
            tracing::warn!(error = %e, "IP geolocation failed, recording check-in without location");
            none
        }
    }
}

/// Clients always check in as themselves; staff must name the client.
async fn target_client(
    pool: &Pool<Postgres>,
    auth: &AuthRequired,
    requested: Option<uuid::Uuid>,
) -> Result<Client, AppError> {
    match auth.0.user_role() {
        UserRole::Client => super::me::linked_client(pool, auth.0.sub).await,
        UserRole::Admin => {
            let id = requested.ok_or_else(|| {
                AppError::invalid_field("client_id", "client_id is required when checking in a client")
            })?;
            super::clients::load_client(pool, id).await
        }
        UserRole::Maintenance => Err(AppError::forbidden("client or admin role required")),
    }
}

fn violation_message(client: &Client) -> String {
    format!(
        "{} {} checked in outside the jurisdiction",
        client.first_name, client.last_name
    )
}

/// Open the violation alert inside the check-in's transaction.
async fn open_violation(
    tx: &mut Transaction<'_, Postgres>,
    client: &Client,
    check_in: &CheckIn,
) -> Result<uuid::Uuid, AppError> {
    let alert = crate::repo::alert::create(
        &mut **tx,
        crate::repo::alert::NewAlert {
            client_id: Some(client.id),
            alert_type: "jurisdiction_violation",
            severity: "high",
            message: &violation_message(client),
            details: json!({
                "check_in_id": check_in.id,
                "latitude": check_in.latitude,
                "longitude": check_in.longitude,
                "location_source": check_in.location_source,
            }),
        },
    )
    .await?;
    Ok(alert.id)
}

/// Tell every admin about a committed violation. Failures are only logged.
async fn notify_admins(pool: &Pool<Postgres>, alert_id: uuid::Uuid, client: &Client) {
    let admins = match crate::repo::user::ids_with_role(pool, "admin").await {
        Ok(admins) => admins,
        Err(e) => {
            tracing::warn!(alert_id = %alert_id, error = %e, "Failed to look up admins for violation");
            return;
        }
    };
    if let Err(e) = crate::repo::notification::create_for_users(
        pool,
        &admins,
        "alert",
        "Jurisdiction violation",
        &violation_message(client),
    )
    .await
    {
        tracing::warn!(alert_id = %alert_id, error = %e, "Failed to notify admins of violation");
    }
}

/// POST /api/check-ins
#[utoipa::path(
    post,
    path = "/api/check-ins",
    request_body = CreateCheckInRequest,
    responses(
        (status = 201, description = "Check-in recorded", body = CheckInResult),
        (status = 400, description = "Invalid coordinates or missing client_id", body = AppError),
        (status = 403, description = "Maintenance accounts cannot check in", body = AppError),
        (status = 404, description = "No client record", body = AppError)
    ),
    tag = "check-ins"
)]
#[tracing::instrument(skip_all, fields(user_id = auth.0.sub))]
pub async fn create_check_in(
    State(pool): State<Pool<Postgres>>,
    State(geo): State<Option<GeoLocator>>,
    auth: AuthRequired,
    headers: HeaderMap,
    Json(body): Json<CreateCheckInRequest>,
) -> Result<(StatusCode, Json<CheckInResult>), AppError> {
    body.validate_request()?;
    let device = GeoPoint::from_optional(body.latitude, body.longitude)?;
    let client = target_client(&pool, &auth, body.client_id).await?;

    let ip = client_ip(&headers);
    let location = resolve_location(device, geo.as_ref(), ip.as_deref()).await;

    let config = crate::repo::company_config::get(&pool).await?;
    let bounds = config.bounds();
    let within_jurisdiction = location
        .point
        .and_then(|p| JurisdictionBounds::check(bounds.as_ref(), &p));

    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;
    let check_in = crate::repo::check_in::create(
        &mut *tx,
        NewCheckIn {
            client_id: client.id,
            latitude: location.point.map(|p| p.latitude),
            longitude: location.point.map(|p| p.longitude),
            location_source: location.source,
            city: location.city.as_deref(),
            region: location.region.as_deref(),
            within_jurisdiction,
            ip_address: ip.as_deref(),
            notes: body.notes.as_deref(),
        },
    )
    .await?;

    let alert_id = if within_jurisdiction == Some(false) {
        Some(open_violation(&mut tx, &client, &check_in).await?)
    } else {
        None
    };
    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;

    if let Some(alert_id) = alert_id {
        tracing::warn!(client_id = %client.id, alert_id = %alert_id, "Check-in outside jurisdiction");
        notify_admins(&pool, alert_id, &client).await;
    }

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "check_in.create", "check_in")
            .entity(check_in.id)
            .details(json!({
                "client_id": client.id,
                "location_source": check_in.location_source,
                "within_jurisdiction": within_jurisdiction,
                "alert_id": alert_id,
            }))
            .ip(ip),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(CheckInResult {
            check_in: CheckInResponse::from(check_in),
            alert_id: alert_id.map(|id| id.to_string()),
        }),
    ))
}

/// GET /api/check-ins
#[utoipa::path(
    get,
    path = "/api/check-ins",
    params(CheckInListParams),
    responses(
        (status = 200, description = "Paginated check-ins, newest first", body = PaginatedResponse<CheckInResponse>),
        (status = 400, description = "Invalid filter", body = AppError)
    ),
    tag = "check-ins"
)]
#[tracing::instrument(skip(pool))]
pub async fn list_check_ins(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Query(params): Query<CheckInListParams>,
) -> Result<Json<PaginatedResponse<CheckInResponse>>, AppError> {
    let client_id = parse_optional_uuid(params.client_id.as_deref(), "client")?;
    let (page, limit) = normalize_pagination(params.page, params.limit);

    let (check_ins, total) = crate::repo::check_in::list(
        &pool,
        client_id,
        params.violations_only.unwrap_or(false),
        page_offset(page, limit),
        limit,
    )
    .await?;

    Ok(Json(
        PaginatedResponse::new(check_ins, page, limit, total).map(CheckInResponse::from),
    ))
}

/// GET /api/check-ins/{id}
#[utoipa::path(
    get,
    path = "/api/check-ins/{id}",
    params(("id" = String, Path, description = "Check-in UUID")),
    responses(
        (status = 200, description = "Check-in found", body = CheckInResponse),
        (status = 404, description = "Check-in not found", body = AppError)
    ),
    tag = "check-ins"
)]
#[tracing::instrument(skip(pool))]
pub async fn get_check_in(
    State(pool): State<Pool<Postgres>>,
    _auth: AdminRequired,
    Path(id): Path<String>,
) -> Result<Json<CheckInResponse>, AppError> {
    let id = parse_uuid(&id, "check-in")?;
    let check_in = crate::repo::check_in::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Check-in {} not found", id)))?;
    Ok(Json(CheckInResponse::from(check_in)))
}
