use serde::{Deserialize, Serialize};

use crate::FeatureFlags;

/// One timed request as seen by the performance middleware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RequestSample {
    pub method: String,
    /// Matched route template, e.g. `/api/clients/{id}`.
    pub route: String,
    pub status: u16,
    pub duration_ms: f64,
    pub recorded_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RouteStats {
    pub method: String,
    pub route: String,
    pub count: u64,
    pub avg_ms: f64,
    pub max_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PerformanceSummary {
    pub capacity: usize,
    pub sample_count: usize,
    pub avg_ms: f64,
    pub max_ms: f64,
    /// Share of sampled responses with a 5xx status, 0.0 to 1.0.
    pub error_rate: f64,
    /// Slowest average first.
    pub routes: Vec<RouteStats>,
    pub recent: Vec<RequestSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SystemStatus {
    pub status: String,
    pub database: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub features: FeatureFlags,
    pub perf_samples: usize,
}
