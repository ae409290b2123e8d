use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

use server::config::{env_or, feature_flags, load_feature_flags};
use server::db::AppState;
use server::rate_limit::RateLimitState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    server::telemetry::init_tracing();

    load_feature_flags();
    let flags = feature_flags();
    if flags.telemetry {
        server::telemetry::init_telemetry();
    }

    server::health::record_start_time();

    let pool = server::db::create_pool().context("failed to configure database pool")?;
    server::db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    if flags.reminder_sweep {
        let minutes: u64 = env_or("REMINDER_SWEEP_MINUTES", 60);
        server::sweeps::spawn_reminder_loop(pool.clone(), Duration::from_secs(60 * minutes.max(1)));
    }

    let state = AppState::from_env(pool);
    let app = server::openapi::build_app(state, RateLimitState::from_env());

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %addr, version = env!("CARGO_PKG_VERSION"), "Bondline listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
