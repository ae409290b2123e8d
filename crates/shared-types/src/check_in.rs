use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A client's periodic check-in, optionally with a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct CheckIn {
    pub id: Uuid,
    pub client_id: Uuid,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// One of [`LOCATION_SOURCES`].
    pub location_source: String,
    pub city: Option<String>,
    pub region: Option<String>,
    /// `None` when no location or no jurisdiction was available.
    pub within_jurisdiction: Option<bool>,
    pub ip_address: Option<String>,
    pub notes: Option<String>,
    pub checked_in_at: DateTime<Utc>,
}

pub const LOCATION_SOURCES: &[&str] = &["device", "ip_lookup", "none"];

/// Whether a client is overdue for a check-in.
///
/// `last_check_in` falls back to `since` (usually the client's creation
/// time) when the client has never checked in. Exactly `interval_hours`
/// elapsed is not yet overdue.
pub fn is_check_in_overdue(
    last_check_in: Option<DateTime<Utc>>,
    since: DateTime<Utc>,
    interval_hours: i32,
    now: DateTime<Utc>,
) -> bool {
    let reference = last_check_in.unwrap_or(since);
    now - reference > Duration::hours(interval_hours as i64)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CheckInResponse {
    pub id: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub location_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub within_jurisdiction: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub checked_in_at: String,
}

impl From<CheckIn> for CheckInResponse {
    fn from(c: CheckIn) -> Self {
        Self {
            id: c.id.to_string(),
            client_id: c.client_id.to_string(),
            latitude: c.latitude,
            longitude: c.longitude,
            location_source: c.location_source,
            city: c.city,
            region: c.region,
            within_jurisdiction: c.within_jurisdiction,
            notes: c.notes,
            checked_in_at: c.checked_in_at.to_rfc3339(),
        }
    }
}

/// Result of recording a check-in. `alert_id` is set when the check-in
/// fell outside the jurisdiction and an alert was opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CheckInResult {
    pub check_in: CheckInResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(validator::Validate))]
pub struct CreateCheckInRequest {
    /// Required for staff; ignored for clients, who always check in as themselves.
    #[serde(default)]
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(length(max = 1000, message = "Notes must be at most 1000 characters"))
    )]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct CheckInListParams {
    pub client_id: Option<String>,
    /// Only check-ins outside the jurisdiction.
    pub violations_only: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
