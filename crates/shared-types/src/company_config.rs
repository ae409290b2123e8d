use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AppError, JurisdictionBounds};

/// Longest allowed gap between check-ins (90 days).
pub const MAX_CHECK_IN_INTERVAL_HOURS: i32 = 2160;

/// Furthest ahead a court reminder may be scheduled.
pub const MAX_REMINDER_DAYS: i32 = 60;

/// The single company-wide settings row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct CompanyConfiguration {
    pub id: i32,
    pub company_name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub min_latitude: Option<f64>,
    pub max_latitude: Option<f64>,
    pub min_longitude: Option<f64>,
    pub max_longitude: Option<f64>,
    pub check_in_interval_hours: i32,
    pub reminder_days: Vec<i32>,
    pub privacy_policy_version: String,
    pub terms_version: String,
    pub updated_by: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyConfiguration {
    /// Configured jurisdiction, if any. The table constraint keeps the four
    /// columns all-or-nothing, so a partial row reads as unconfigured.
    pub fn bounds(&self) -> Option<JurisdictionBounds> {
        JurisdictionBounds::from_parts(
            self.min_latitude,
            self.max_latitude,
            self.min_longitude,
            self.max_longitude,
        )
        .ok()
        .flatten()
    }
}

/// Validate and canonicalize reminder offsets: each in `0..=60`,
/// duplicates removed, largest first.
pub fn normalize_reminder_days(days: &[i32]) -> Result<Vec<i32>, AppError> {
    if let Some(bad) = days.iter().find(|d| !(0..=MAX_REMINDER_DAYS).contains(*d)) {
        return Err(AppError::invalid_field(
            "reminder_days",
            format!("reminder day {} must be between 0 and {}", bad, MAX_REMINDER_DAYS),
        ));
    }
    let mut out = days.to_vec();
    out.sort_unstable_by(|a, b| b.cmp(a));
    out.dedup();
    Ok(out)
}

pub fn validate_check_in_interval(hours: i32) -> Result<(), AppError> {
    if !(1..=MAX_CHECK_IN_INTERVAL_HOURS).contains(&hours) {
        return Err(AppError::invalid_field(
            "check_in_interval_hours",
            format!(
                "check_in_interval_hours must be between 1 and {}",
                MAX_CHECK_IN_INTERVAL_HOURS
            ),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CompanyConfigResponse {
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// `null` when no jurisdiction is configured.
    pub jurisdiction: Option<JurisdictionBounds>,
    pub check_in_interval_hours: i32,
    pub reminder_days: Vec<i32>,
    pub privacy_policy_version: String,
    pub terms_version: String,
    pub updated_at: String,
}

impl From<CompanyConfiguration> for CompanyConfigResponse {
    fn from(c: CompanyConfiguration) -> Self {
        let jurisdiction = c.bounds();
        Self {
            company_name: c.company_name,
            contact_email: c.contact_email,
            contact_phone: c.contact_phone,
            address: c.address,
            jurisdiction,
            check_in_interval_hours: c.check_in_interval_hours,
            reminder_days: c.reminder_days,
            privacy_policy_version: c.privacy_policy_version,
            terms_version: c.terms_version,
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

/// Full replacement of the company settings. Omitting all four bounds
/// clears the jurisdiction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(validator::Validate))]
pub struct UpdateCompanyConfigRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 200, message = "Company name is required"))
    )]
    pub company_name: String,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(email(message = "Contact email must be a valid address"))
    )]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub min_latitude: Option<f64>,
    #[serde(default)]
    pub max_latitude: Option<f64>,
    #[serde(default)]
    pub min_longitude: Option<f64>,
    #[serde(default)]
    pub max_longitude: Option<f64>,
    pub check_in_interval_hours: i32,
    #[serde(default)]
    pub reminder_days: Vec<i32>,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 32, message = "Privacy policy version is required"))
    )]
    pub privacy_policy_version: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 32, message = "Terms version is required"))
    )]
    pub terms_version: String,
}

/// An update request after cross-field validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCompanyConfig {
    pub bounds: Option<JurisdictionBounds>,
    pub reminder_days: Vec<i32>,
}

impl UpdateCompanyConfigRequest {
    /// Checks that the derive-based validation cannot express.
    pub fn validate_rules(&self) -> Result<ValidatedCompanyConfig, AppError> {
        let bounds = JurisdictionBounds::from_parts(
            self.min_latitude,
            self.max_latitude,
            self.min_longitude,
            self.max_longitude,
        )?;
        validate_check_in_interval(self.check_in_interval_hours)?;
        let reminder_days = normalize_reminder_days(&self.reminder_days)?;
        Ok(ValidatedCompanyConfig {
            bounds,
            reminder_days,
        })
    }
}
