use shared_types::{AppError, CompanyConfiguration, UpdateCompanyConfigRequest, ValidatedCompanyConfig};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

const CONFIG_COLUMNS: &str = "id, company_name, contact_email, contact_phone, address, \
     min_latitude, max_latitude, min_longitude, max_longitude, check_in_interval_hours, \
     reminder_days, privacy_policy_version, terms_version, updated_by, updated_at";

/// The single configuration row, seeded by migration.
pub async fn get(pool: &Pool<Postgres>) -> Result<CompanyConfiguration, AppError> {
    sqlx::query_as::<_, CompanyConfiguration>(&format!(
        "SELECT {CONFIG_COLUMNS} FROM company_configuration WHERE id = 1"
    ))
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?
    .ok_or_else(|| {
        tracing::error!("company_configuration row is missing");
        AppError::internal("Company configuration is missing")
    })
}

/// Replace the configuration with `req`. `validated` carries the checked
/// bounds and normalized reminder days.
pub async fn replace(
    pool: &Pool<Postgres>,
    req: &UpdateCompanyConfigRequest,
    validated: &ValidatedCompanyConfig,
    updated_by: i64,
) -> Result<CompanyConfiguration, AppError> {
    let bounds = validated.bounds;
    sqlx::query_as::<_, CompanyConfiguration>(&format!(
        "UPDATE company_configuration SET
            company_name = $1,
            contact_email = $2,
            contact_phone = $3,
            address = $4,
            min_latitude = $5,
            max_latitude = $6,
            min_longitude = $7,
            max_longitude = $8,
            check_in_interval_hours = $9,
            reminder_days = $10,
            privacy_policy_version = $11,
            terms_version = $12,
            updated_by = $13,
            updated_at = NOW()
         WHERE id = 1
         RETURNING {CONFIG_COLUMNS}"
    ))
    .bind(req.company_name.trim())
    .bind(req.contact_email.as_deref())
    .bind(req.contact_phone.as_deref())
    .bind(req.address.as_deref())
    .bind(bounds.map(|b| b.min_latitude))
    .bind(bounds.map(|b| b.max_latitude))
    .bind(bounds.map(|b| b.min_longitude))
    .bind(bounds.map(|b| b.max_longitude))
    .bind(req.check_in_interval_hours)
    .bind(&validated.reminder_days)
    .bind(req.privacy_policy_version.trim())
    .bind(req.terms_version.trim())
    .bind(updated_by)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
