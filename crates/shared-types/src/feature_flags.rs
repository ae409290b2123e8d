use serde::{Deserialize, Serialize};

/// Feature flags controlling which optional integrations are active.
///
/// Loaded from `config.toml` at server startup and reported by the
/// maintenance status endpoint. Every field defaults to `false` so that a
/// missing or incomplete config file disables all optional features.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FeatureFlags {
    /// OTLP trace/log export.
    #[serde(default)]
    pub telemetry: bool,
    /// IP geolocation fallback for check-ins without coordinates.
    #[serde(default)]
    pub geolocation: bool,
    /// Forward contact submissions to the hosted Supabase table.
    #[serde(default)]
    pub contact_forward: bool,
    /// Periodic court-date reminder sweep.
    #[serde(default)]
    pub reminder_sweep: bool,
}

/// Top-level config file structure matching `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub features: FeatureFlags,
}
