pub mod acknowledgments;
pub mod alerts;
pub mod audit_logs;
pub mod auth;
pub mod check_ins;
pub mod clients;
pub mod company_config;
pub mod contact;
pub mod court_dates;
pub mod geolocation;
pub mod maintenance;
pub mod me;
pub mod notifications;
pub mod payments;
pub mod reports;
pub mod users;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};
use shared_types::{AppError, UserRole};
use uuid::Uuid;

use crate::db::AppState;
use crate::rate_limit::{rate_limit_middleware, RateLimitState};

/// Parse a path or query UUID, naming the resource in the error.
pub(crate) fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::bad_request(format!("Invalid {} UUID format", what)))
}

pub(crate) fn parse_optional_uuid(raw: Option<&str>, what: &str) -> Result<Option<Uuid>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_uuid(s, what).map(Some),
        None => Ok(None),
    }
}

/// Reject `value` unless it is one of `allowed`.
pub(crate) fn require_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), AppError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(AppError::invalid_field(
            field,
            format!("Invalid {}: {}. Valid values: {}", field, value, allowed.join(", ")),
        ))
    }
}

/// A query-string filter: blank means unset, anything else must be allowed.
pub(crate) fn optional_filter<'a>(
    field: &str,
    value: Option<&'a str>,
    allowed: &[&str],
) -> Result<Option<&'a str>, AppError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(v) => require_one_of(field, v, allowed).map(|_| Some(v)),
        None => Ok(None),
    }
}

pub(crate) fn parse_role(raw: &str) -> Result<UserRole, AppError> {
    UserRole::parse(raw.trim()).ok_or_else(|| {
        AppError::invalid_field(
            "role",
            format!(
                "Invalid role: {}. Valid values: {}",
                raw,
                shared_types::USER_ROLES.join(", ")
            ),
        )
    })
}

/// Build the REST API router. Login, register and the public contact form
/// sit behind the per-IP rate limiter.
pub fn api_router(rate_limit: RateLimitState) -> Router<AppState> {
    let limited = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/contact", post(contact::submit_contact))
        .layer(from_fn_with_state(rate_limit, rate_limit_middleware));

    Router::new()
        .merge(limited)
        // Auth
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // Users
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/{id}", get(users::get_user).delete(users::delete_user))
        .route("/api/users/{id}/role", patch(users::update_user_role))
        // Clients
        .route("/api/clients", get(clients::list_clients).post(clients::create_client))
        .route(
            "/api/clients/{id}",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .route("/api/clients/{id}/status", patch(clients::update_client_status))
        .route("/api/clients/{id}/payments", get(clients::list_client_payments))
        .route("/api/clients/{id}/payments/summary", get(clients::client_payment_summary))
        .route("/api/clients/{id}/check-ins", get(clients::list_client_check_ins))
        .route("/api/clients/{id}/court-dates", get(clients::list_client_court_dates))
        .route("/api/clients/{id}/alerts", get(clients::list_client_alerts))
        // Payments
        .route("/api/payments", get(payments::list_payments).post(payments::create_payment))
        .route("/api/payments/{id}", get(payments::get_payment).delete(payments::delete_payment))
        .route("/api/payments/{id}/status", patch(payments::update_payment_status))
        // Check-ins
        .route("/api/check-ins", get(check_ins::list_check_ins).post(check_ins::create_check_in))
        .route("/api/check-ins/{id}", get(check_ins::get_check_in))
        .route("/api/geolocation/check", post(geolocation::check_location))
        // Court dates
        .route("/api/court-dates/reminders/run", post(court_dates::run_reminders))
        .route(
            "/api/court-dates",
            get(court_dates::list_court_dates).post(court_dates::create_court_date),
        )
        .route(
            "/api/court-dates/{id}",
            get(court_dates::get_court_date)
                .put(court_dates::update_court_date)
                .delete(court_dates::delete_court_date),
        )
        .route("/api/court-dates/{id}/status", patch(court_dates::update_court_date_status))
        // Alerts
        .route("/api/alerts/scan/missed-check-ins", post(alerts::scan_missed_check_ins))
        .route("/api/alerts", get(alerts::list_alerts).post(alerts::create_alert))
        .route("/api/alerts/{id}", get(alerts::get_alert))
        .route("/api/alerts/{id}/acknowledge", post(alerts::acknowledge_alert))
        .route("/api/alerts/{id}/resolve", post(alerts::resolve_alert))
        // Notifications
        .route(
            "/api/notifications",
            get(notifications::list_notifications).post(notifications::send_notification),
        )
        .route("/api/notifications/unread-count", get(notifications::unread_count))
        .route("/api/notifications/read-all", post(notifications::mark_all_read))
        .route("/api/notifications/{id}", delete(notifications::delete_notification))
        .route("/api/notifications/{id}/read", post(notifications::mark_read))
        // Audit
        .route("/api/audit-logs", get(audit_logs::list_audit_logs))
        // Acknowledgments
        .route("/api/acknowledgments/privacy", post(acknowledgments::acknowledge_privacy))
        .route("/api/acknowledgments/terms", post(acknowledgments::acknowledge_terms))
        .route("/api/acknowledgments/status", get(acknowledgments::acknowledgment_status))
        // Company configuration
        .route(
            "/api/company-config",
            get(company_config::get_company_config).put(company_config::update_company_config),
        )
        // Contact (POST is rate limited above)
        .route("/api/contact", get(contact::list_contact_submissions))
        // Reports
        .route("/api/reports/dashboard", get(reports::dashboard))
        .route("/api/reports/payments", get(reports::payment_report))
        .route("/api/reports/compliance", get(reports::compliance_report))
        // Client self-service
        .route("/api/me/client", get(me::my_client))
        .route("/api/me/dashboard", get(me::my_dashboard))
        .route("/api/me/payments", get(me::my_payments).post(me::submit_payment))
        .route("/api/me/check-ins", get(me::my_check_ins))
        .route("/api/me/court-dates", get(me::my_court_dates))
        // Maintenance
        .route(
            "/api/maintenance/performance",
            get(maintenance::performance_summary).delete(maintenance::reset_performance),
        )
        .route("/api/maintenance/status", get(maintenance::system_status))
}
