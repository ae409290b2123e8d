use axum::extract::State;
use serde_json::json;
use sqlx::{Pool, Postgres};

use shared_types::{AppError, CompanyConfigResponse, UpdateCompanyConfigRequest};

use crate::extract::Json;
use crate::auth::extractors::{AdminRequired, AuthRequired};
use crate::error_convert::ValidateRequest;
use crate::repo::audit::{self, AuditEntry};

/// GET /api/company-config
#[utoipa::path(
    get,
    path = "/api/company-config",
    responses(
        (status = 200, description = "Company configuration", body = CompanyConfigResponse),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    tag = "company-config"
)]
pub async fn get_company_config(
    State(pool): State<Pool<Postgres>>,
    _auth: AuthRequired,
) -> Result<Json<CompanyConfigResponse>, AppError> {
    let config = crate::repo::company_config::get(&pool).await?;
    Ok(Json(CompanyConfigResponse::from(config)))
}

/// PUT /api/company-config
///
/// Replaces the whole configuration; omitted optional fields are cleared.
#[utoipa::path(
    put,
    path = "/api/company-config",
    request_body = UpdateCompanyConfigRequest,
    responses(
        (status = 200, description = "Configuration replaced", body = CompanyConfigResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Admin role required", body = AppError)
    ),
    tag = "company-config"
)]
#[tracing::instrument(skip(pool, body))]
pub async fn update_company_config(
    State(pool): State<Pool<Postgres>>,
    auth: AdminRequired,
    Json(body): Json<UpdateCompanyConfigRequest>,
) -> Result<Json<CompanyConfigResponse>, AppError> {
    body.validate_request()?;
    let validated = body.validate_rules()?;

    let config = crate::repo::company_config::replace(&pool, &body, &validated, auth.0.sub).await?;

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "company_config.update", "company_configuration")
            .entity(config.id)
            .details(json!({
                "jurisdiction_configured": validated.bounds.is_some(),
                "check_in_interval_hours": config.check_in_interval_hours,
                "reminder_days": config.reminder_days,
                "privacy_policy_version": config.privacy_policy_version,
                "terms_version": config.terms_version,
            })),
    )
    .await;

    tracing::info!(user_id = auth.0.sub, "Company configuration updated");

    Ok(Json(CompanyConfigResponse::from(config)))
}
