use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A compliance alert raised for staff attention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Alert {
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    pub alert_type: String,
    pub severity: String,
    pub status: String,
    pub message: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub details: serde_json::Value,
    pub acknowledged_by: Option<i64>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<i64>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ── Alert validation constants ──────────────────────────────────────

pub const ALERT_TYPES: &[&str] = &[
    "jurisdiction_violation",
    "missed_check_in",
    "missed_payment",
    "court_date",
    "other",
];

pub const ALERT_SEVERITIES: &[&str] = &["low", "medium", "high", "critical"];

pub const ALERT_STATUSES: &[&str] = &["open", "acknowledged", "resolved"];

pub fn is_valid_alert_type(s: &str) -> bool {
    ALERT_TYPES.contains(&s)
}

pub fn is_valid_alert_severity(s: &str) -> bool {
    ALERT_SEVERITIES.contains(&s)
}

pub fn is_valid_alert_status(s: &str) -> bool {
    ALERT_STATUSES.contains(&s)
}

/// Staff action on an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    Acknowledge,
    Resolve,
}

impl AlertAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertAction::Acknowledge => "acknowledge",
            AlertAction::Resolve => "resolve",
        }
    }
}

/// Status an alert moves to when `action` is applied, or `None` if the
/// move is not allowed. Resolved alerts are final; an open alert may be
/// resolved without being acknowledged first.
pub fn next_alert_status(current: &str, action: AlertAction) -> Option<&'static str> {
    match (current, action) {
        ("open", AlertAction::Acknowledge) => Some("acknowledged"),
        ("open", AlertAction::Resolve) | ("acknowledged", AlertAction::Resolve) => {
            Some("resolved")
        }
        _ => None,
    }
}

// ── Alert API response ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AlertResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub alert_type: String,
    pub severity: String,
    pub status: String,
    pub message: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
    pub created_at: String,
}

impl From<Alert> for AlertResponse {
    fn from(a: Alert) -> Self {
        Self {
            id: a.id.to_string(),
            client_id: a.client_id.map(|id| id.to_string()),
            alert_type: a.alert_type,
            severity: a.severity,
            status: a.status,
            message: a.message,
            details: a.details,
            acknowledged_by: a.acknowledged_by,
            acknowledged_at: a.acknowledged_at.map(|d| d.to_rfc3339()),
            resolved_by: a.resolved_by,
            resolved_at: a.resolved_at.map(|d| d.to_rfc3339()),
            created_at: a.created_at.to_rfc3339(),
        }
    }
}

// ── Alert request types ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(validator::Validate))]
pub struct CreateAlertRequest {
    #[serde(default)]
    pub client_id: Option<Uuid>,
    pub alert_type: String,
    pub severity: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 2000, message = "Message is required"))
    )]
    pub message: String,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct AlertListParams {
    pub status: Option<String>,
    pub severity: Option<String>,
    pub alert_type: Option<String>,
    pub client_id: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Outcome of a missed check-in scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MissedCheckInScanResponse {
    pub clients_checked: i64,
    pub alerts_created: i64,
}
