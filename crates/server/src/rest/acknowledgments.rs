use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde_json::json;
use sqlx::{Pool, Postgres};

use shared_types::{
    AcknowledgeRequest, AcknowledgmentResponse, AcknowledgmentStatus, AppError, PolicyDocument,
};

use crate::extract::Json;
use crate::auth::extractors::AuthRequired;
use crate::error_convert::ValidateRequest;
use crate::rate_limit::client_ip;
use crate::repo::audit::{self, AuditEntry};

/// Current policy versions and whether `user_id` has accepted each.
pub(crate) async fn policy_status(
    pool: &Pool<Postgres>,
    user_id: i64,
) -> Result<AcknowledgmentStatus, AppError> {
    let config = crate::repo::company_config::get(pool).await?;
    let privacy_acknowledged = crate::repo::acknowledgment::has_acknowledged(
        pool,
        PolicyDocument::Privacy,
        user_id,
        &config.privacy_policy_version,
    )
    .await?;
    let terms_acknowledged = crate::repo::acknowledgment::has_acknowledged(
        pool,
        PolicyDocument::Terms,
        user_id,
        &config.terms_version,
    )
    .await?;

    Ok(AcknowledgmentStatus {
        privacy_policy_version: config.privacy_policy_version,
        privacy_acknowledged,
        terms_version: config.terms_version,
        terms_acknowledged,
    })
}

async fn acknowledge(
    pool: &Pool<Postgres>,
    auth: &AuthRequired,
    headers: &HeaderMap,
    document: PolicyDocument,
    body: &AcknowledgeRequest,
) -> Result<AcknowledgmentResponse, AppError> {
    body.validate_request()?;

    let config = crate::repo::company_config::get(pool).await?;
    let current = match document {
        PolicyDocument::Privacy => &config.privacy_policy_version,
        PolicyDocument::Terms => &config.terms_version,
    };
    let version = body.version.trim();
    if version != current {
        return Err(AppError::invalid_field(
            "version",
            format!("Current {} version is {}", document.as_str(), current),
        ));
    }

    let ip = client_ip(headers);
    let ack = crate::repo::acknowledgment::acknowledge(
        pool,
        document,
        auth.0.sub,
        version,
        ip.as_deref(),
    )
    .await?;

    audit::record(
        pool,
        AuditEntry::new(Some(auth.0.sub), "policy.acknowledge", "acknowledgment")
            .entity(ack.id)
            .details(json!({ "document": document.as_str(), "version": version }))
            .ip(ip),
    )
    .await;

    Ok(AcknowledgmentResponse::new(document, ack))
}

/// POST /api/acknowledgments/privacy
#[utoipa::path(
    post,
    path = "/api/acknowledgments/privacy",
    request_body = AcknowledgeRequest,
    responses(
        (status = 201, description = "Privacy policy acknowledged", body = AcknowledgmentResponse),
        (status = 400, description = "Version is not the current one", body = AppError)
    ),
    tag = "acknowledgments"
)]
#[tracing::instrument(skip(pool, headers))]
pub async fn acknowledge_privacy(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    headers: HeaderMap,
    Json(body): Json<AcknowledgeRequest>,
) -> Result<(StatusCode, Json<AcknowledgmentResponse>), AppError> {
    let ack = acknowledge(&pool, &auth, &headers, PolicyDocument::Privacy, &body).await?;
    Ok((StatusCode::CREATED, Json(ack)))
}

/// POST /api/acknowledgments/terms
#[utoipa::path(
    post,
    path = "/api/acknowledgments/terms",
    request_body = AcknowledgeRequest,
    responses(
        (status = 201, description = "Terms acknowledged", body = AcknowledgmentResponse),
        (status = 400, description = "Version is not the current one", body = AppError)
    ),
    tag = "acknowledgments"
)]
#[tracing::instrument(skip(pool, headers))]
pub async fn acknowledge_terms(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
    headers: HeaderMap,
    Json(body): Json<AcknowledgeRequest>,
) -> Result<(StatusCode, Json<AcknowledgmentResponse>), AppError> {
    let ack = acknowledge(&pool, &auth, &headers, PolicyDocument::Terms, &body).await?;
    Ok((StatusCode::CREATED, Json(ack)))
}

/// GET /api/acknowledgments/status
#[utoipa::path(
    get,
    path = "/api/acknowledgments/status",
    responses(
        (status = 200, description = "Current versions and the caller's acceptance", body = AcknowledgmentStatus),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    tag = "acknowledgments"
)]
pub async fn acknowledgment_status(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
) -> Result<Json<AcknowledgmentStatus>, AppError> {
    Ok(Json(policy_status(&pool, auth.0.sub).await?))
}
