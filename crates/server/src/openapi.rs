use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use shared_types::{
    AcknowledgeRequest, AcknowledgmentResponse, AcknowledgmentStatus, AlertResponse, AppError,
    AppErrorKind, AuditLogResponse, AuthResponse, AuthUser, CheckInResponse, CheckInResult,
    ClientCompliance, ClientDashboard, ClientResponse, CompanyConfigResponse, ComplianceReport,
    ContactRequest, ContactSubmissionResponse, CountResponse, CourtDateResponse,
    CreateAlertRequest, CreateCheckInRequest, CreateClientRequest, CreateCourtDateRequest,
    CreatePaymentRequest, CreateUserRequest, DashboardReport, FeatureFlags, GeoPoint,
    GeolocationCheckRequest, GeolocationCheckResponse, JurisdictionBounds, LoginRequest,
    MessageResponse, MissedCheckInScanResponse, NotificationResponse, PaginationMeta,
    PaymentBucket, PaymentReport, PaymentResponse, PaymentSummary, PerformanceSummary,
    RegisterRequest, ReminderRunResponse, RouteStats, SendNotificationRequest,
    SubmitPaymentRequest, SystemStatus, UpdateClientRequest, UpdateClientStatusRequest,
    UpdateCompanyConfigRequest, UpdateCourtDateRequest, UpdateCourtDateStatusRequest,
    UpdatePaymentStatusRequest, UpdateUserRoleRequest, UserResponse, UserRole,
};

use crate::config::{env_non_empty, env_or, feature_flags};
use crate::db::AppState;
use crate::health;
use crate::perf::perf_middleware;
use crate::rate_limit::RateLimitState;
use crate::rest;

/// Default request body cap: 1 MiB.
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// OpenAPI documentation for the API.
#[derive(OpenApi)]
#[openapi(
    paths(
        rest::auth::register,
        rest::auth::login,
        rest::auth::logout,
        rest::auth::me,
        rest::users::list_users,
        rest::users::create_user,
        rest::users::get_user,
        rest::users::update_user_role,
        rest::users::delete_user,
        rest::clients::list_clients,
        rest::clients::create_client,
        rest::clients::get_client,
        rest::clients::update_client,
        rest::clients::update_client_status,
        rest::clients::delete_client,
        rest::clients::list_client_payments,
        rest::clients::client_payment_summary,
        rest::clients::list_client_check_ins,
        rest::clients::list_client_court_dates,
        rest::clients::list_client_alerts,
        rest::payments::list_payments,
        rest::payments::create_payment,
        rest::payments::get_payment,
        rest::payments::update_payment_status,
        rest::payments::delete_payment,
        rest::check_ins::create_check_in,
        rest::check_ins::list_check_ins,
        rest::check_ins::get_check_in,
        rest::geolocation::check_location,
        rest::court_dates::list_court_dates,
        rest::court_dates::create_court_date,
        rest::court_dates::get_court_date,
        rest::court_dates::update_court_date,
        rest::court_dates::update_court_date_status,
        rest::court_dates::delete_court_date,
        rest::court_dates::run_reminders,
        rest::alerts::list_alerts,
        rest::alerts::create_alert,
        rest::alerts::get_alert,
        rest::alerts::acknowledge_alert,
        rest::alerts::resolve_alert,
        rest::alerts::scan_missed_check_ins,
        rest::notifications::list_notifications,
        rest::notifications::unread_count,
        rest::notifications::mark_read,
        rest::notifications::mark_all_read,
        rest::notifications::delete_notification,
        rest::notifications::send_notification,
        rest::audit_logs::list_audit_logs,
        rest::acknowledgments::acknowledge_privacy,
        rest::acknowledgments::acknowledge_terms,
        rest::acknowledgments::acknowledgment_status,
        rest::company_config::get_company_config,
        rest::company_config::update_company_config,
        rest::contact::submit_contact,
        rest::contact::list_contact_submissions,
        rest::reports::dashboard,
        rest::reports::payment_report,
        rest::reports::compliance_report,
        rest::me::my_client,
        rest::me::my_dashboard,
        rest::me::my_payments,
        rest::me::submit_payment,
        rest::me::my_check_ins,
        rest::me::my_court_dates,
        rest::maintenance::performance_summary,
        rest::maintenance::reset_performance,
        rest::maintenance::system_status,
        health::health_check,
    ),
    components(schemas(
        AppError, AppErrorKind, MessageResponse, CountResponse, PaginationMeta, FeatureFlags,
        // Accounts
        UserRole, AuthUser, AuthResponse, LoginRequest, RegisterRequest, UserResponse,
        CreateUserRequest, UpdateUserRoleRequest,
        // Clients and money
        ClientResponse, CreateClientRequest, UpdateClientRequest, UpdateClientStatusRequest,
        PaymentResponse, CreatePaymentRequest, SubmitPaymentRequest, UpdatePaymentStatusRequest,
        PaymentSummary,
        // Supervision
        GeoPoint, JurisdictionBounds, GeolocationCheckRequest, GeolocationCheckResponse,
        CheckInResponse, CreateCheckInRequest, CheckInResult,
        CourtDateResponse, CreateCourtDateRequest, UpdateCourtDateRequest,
        UpdateCourtDateStatusRequest, ReminderRunResponse,
        AlertResponse, CreateAlertRequest, MissedCheckInScanResponse,
        NotificationResponse, SendNotificationRequest,
        // Records and policy
        AuditLogResponse, AcknowledgeRequest, AcknowledgmentResponse, AcknowledgmentStatus,
        CompanyConfigResponse, UpdateCompanyConfigRequest,
        ContactRequest, ContactSubmissionResponse,
        // Reporting
        DashboardReport, PaymentBucket, PaymentReport, ClientCompliance, ComplianceReport,
        ClientDashboard, PerformanceSummary, RouteStats, SystemStatus,
        health::HealthResponse,
    )),
    tags(
        (name = "auth", description = "Registration, login and session endpoints"),
        (name = "users", description = "User account management"),
        (name = "clients", description = "Bonded client records"),
        (name = "payments", description = "Premium payments and receipts"),
        (name = "check-ins", description = "Client check-ins and jurisdiction checks"),
        (name = "geolocation", description = "Point-in-jurisdiction evaluation"),
        (name = "court-dates", description = "Court dates and reminders"),
        (name = "alerts", description = "Compliance alerts"),
        (name = "notifications", description = "In-app notifications"),
        (name = "audit", description = "Audit log"),
        (name = "acknowledgments", description = "Privacy policy and terms acknowledgments"),
        (name = "company-config", description = "Company configuration"),
        (name = "contact", description = "Public contact form"),
        (name = "reports", description = "Office reports"),
        (name = "me", description = "Client self-service"),
        (name = "maintenance", description = "Performance monitor and system status"),
        (name = "health", description = "Health check endpoint")
    ),
    info(
        title = "Bondline API",
        description = "Bail bond case management API",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

/// Allowed origins come from `CORS_ALLOWED_ORIGINS` (comma separated).
/// Without it no cross-origin request is allowed.
fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = env_non_empty("CORS_ALLOWED_ORIGINS")
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| HeaderValue::from_str(origin.trim()).ok())
                .collect()
        })
        .unwrap_or_default();

    if origins.is_empty() {
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Build the full application: REST API under `/api/*`, `/health`, API
/// docs at `/docs`, and the middleware stack (request ids, tracing, auth,
/// optional OpenTelemetry spans, body limit, per-route timing).
pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let pool = state.pool.clone();
    let perf = state.perf.clone();

    let mut router = Router::new()
        .merge(rest::api_router(rate_limit))
        .route("/health", get(health::health_check))
        .route_layer(from_fn_with_state(perf, perf_middleware))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(env_or(
            "MAX_BODY_BYTES",
            DEFAULT_MAX_BODY_BYTES,
        )));

    if feature_flags().telemetry {
        router = router.layer(crate::telemetry::OtelTraceLayer);
    }

    router
        .layer(from_fn_with_state(
            pool,
            crate::auth::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors_layer())
}
