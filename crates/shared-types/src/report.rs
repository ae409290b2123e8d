use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AcknowledgmentStatus, CheckInResponse, ClientResponse, CourtDateResponse, PaymentSummary,
};

/// Office-wide counters for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DashboardReport {
    pub total_clients: i64,
    pub active_clients: i64,
    pub open_alerts: i64,
    pub critical_open_alerts: i64,
    pub check_ins_last_7_days: i64,
    pub violations_last_7_days: i64,
    pub court_dates_next_7_days: i64,
    pub collected_last_30_days_cents: i64,
    pub outstanding_balance_cents: i64,
}

/// One aggregate bucket (by status or by method).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct PaymentBucket {
    pub key: String,
    pub count: i64,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaymentReport {
    pub from: String,
    pub to: String,
    pub by_status: Vec<PaymentBucket>,
    pub by_method: Vec<PaymentBucket>,
    pub collected_cents: i64,
}

/// Date range for the payment report, inclusive, `YYYY-MM-DD`.
/// Defaults to the last 30 days.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct PaymentReportParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Compliance row for one active client, as read from the database.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct ClientComplianceRow {
    pub client_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub last_check_in_at: Option<DateTime<Utc>>,
    pub violation_count: i64,
    pub next_court_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClientCompliance {
    pub client_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check_in_at: Option<String>,
    pub check_in_overdue: bool,
    pub violation_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_court_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ComplianceReport {
    pub generated_at: String,
    pub check_in_interval_hours: i32,
    pub overdue_count: i64,
    pub clients: Vec<ClientCompliance>,
}

/// Everything a client sees on their portal landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClientDashboard {
    pub client: ClientResponse,
    pub payments: PaymentSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_court_date: Option<CourtDateResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check_in: Option<CheckInResponse>,
    pub check_in_due: bool,
    pub unread_notifications: i64,
    pub policies: AcknowledgmentStatus,
    pub policies_acknowledged: bool,
}
