use axum::{extract::State, http::StatusCode};
use sqlx::{Pool, Postgres};

use shared_types::{AppError, PerformanceSummary, SystemStatus};

use crate::extract::Json;
use crate::auth::extractors::MaintenanceRequired;
use crate::perf::PerfMonitor;
use crate::repo::audit::{self, AuditEntry};

/// GET /api/maintenance/performance
#[utoipa::path(
    get,
    path = "/api/maintenance/performance",
    responses(
        (status = 200, description = "Request timing summary", body = PerformanceSummary),
        (status = 403, description = "Admin or maintenance role required", body = AppError)
    ),
    tag = "maintenance"
)]
pub async fn performance_summary(
    State(monitor): State<PerfMonitor>,
    _auth: MaintenanceRequired,
) -> Json<PerformanceSummary> {
    Json(monitor.summary())
}

/// DELETE /api/maintenance/performance
#[utoipa::path(
    delete,
    path = "/api/maintenance/performance",
    responses(
        (status = 204, description = "Samples cleared"),
        (status = 403, description = "Admin or maintenance role required", body = AppError)
    ),
    tag = "maintenance"
)]
#[tracing::instrument(skip(pool, monitor))]
pub async fn reset_performance(
    State(pool): State<Pool<Postgres>>,
    State(monitor): State<PerfMonitor>,
    auth: MaintenanceRequired,
) -> StatusCode {
    let cleared = monitor.len();
    monitor.reset();

    audit::record(
        &pool,
        AuditEntry::new(Some(auth.0.sub), "maintenance.perf_reset", "performance")
            .details(serde_json::json!({ "cleared_samples": cleared })),
    )
    .await;

    StatusCode::NO_CONTENT
}

/// GET /api/maintenance/status
#[utoipa::path(
    get,
    path = "/api/maintenance/status",
    responses(
        (status = 200, description = "Database, uptime, version and feature flags", body = SystemStatus),
        (status = 403, description = "Admin or maintenance role required", body = AppError)
    ),
    tag = "maintenance"
)]
pub async fn system_status(
    State(pool): State<Pool<Postgres>>,
    State(monitor): State<PerfMonitor>,
    _auth: MaintenanceRequired,
) -> Json<SystemStatus> {
    let database = crate::health::database_status(&pool).await;

    Json(SystemStatus {
        status: if database == "connected" { "ok" } else { "degraded" }.to_string(),
        database: database.to_string(),
        uptime_seconds: crate::health::uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: crate::config::feature_flags().clone(),
        perf_samples: monitor.len(),
    })
}
