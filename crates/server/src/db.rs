use axum::extract::FromRef;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;

use crate::contact_forward::ContactForwarder;
use crate::geolocation::GeoLocator;
use crate::perf::PerfMonitor;

/// Shared application state passed to Axum handlers via `State`.
/// Derives `FromRef` so handlers can extract `State<PgPool>`,
/// `State<PerfMonitor>` etc. directly.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: Pool<Postgres>,
    pub perf: PerfMonitor,
    /// Present when the `geolocation` flag is on and the API is configured.
    pub geo: Option<GeoLocator>,
    /// Present when the `contact_forward` flag is on and Supabase is configured.
    pub contact: Option<ContactForwarder>,
}

impl AppState {
    /// State with no optional integrations, used by tests and tools.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            pool,
            perf: PerfMonitor::new(crate::perf::DEFAULT_CAPACITY, Duration::from_secs(1)),
            geo: None,
            contact: None,
        }
    }

    /// Full state for the running server, honouring feature flags.
    pub fn from_env(pool: Pool<Postgres>) -> Self {
        let flags = crate::config::feature_flags();
        let geo = if flags.geolocation {
            let geo = GeoLocator::from_env();
            if geo.is_none() {
                tracing::warn!("geolocation flag on but GEOLOCATION_API_URL/KEY not set");
            }
            geo
        } else {
            None
        };
        let contact = if flags.contact_forward {
            let contact = ContactForwarder::from_env();
            if contact.is_none() {
                tracing::warn!("contact_forward flag on but SUPABASE_URL/ANON_KEY not set");
            }
            contact
        } else {
            None
        };

        Self {
            pool,
            perf: PerfMonitor::from_env(),
            geo,
            contact,
        }
    }
}

/// Create a new database connection pool from environment variables.
/// Uses `connect_lazy` so no connections open until the first query.
pub fn create_pool() -> Result<Pool<Postgres>, sqlx::Error> {
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| sqlx::Error::Configuration("DATABASE_URL must be set".into()))?;

    let max_connections: u32 = crate::config::env_or("DATABASE_MAX_CONNECTIONS", 10);

    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(&database_url)
}

/// Run database migrations against the given pool.
pub async fn run_migrations(pool: &Pool<Postgres>) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
