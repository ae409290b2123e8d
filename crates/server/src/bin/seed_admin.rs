//! Create the first admin account, or promote an existing user.
//!
//! Reads `ADMIN_EMAIL` and `ADMIN_PASSWORD` (plus `DATABASE_URL`) from the
//! environment or `.env`. Runs pending migrations first.

use anyhow::{anyhow, Context};

use server::auth::password::hash_password;
use server::repo::user;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    server::telemetry::init_tracing();

    let email = std::env::var("ADMIN_EMAIL")
        .context("ADMIN_EMAIL must be set")?
        .trim()
        .to_lowercase();
    if email.is_empty() {
        return Err(anyhow!("ADMIN_EMAIL must not be empty"));
    }

    let pool = server::db::create_pool().context("failed to configure database pool")?;
    server::db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    if let Some((id, _)) = user::find_credentials(&pool, &email)
        .await
        .map_err(|e| anyhow!(e.message))?
    {
        user::update_role(&pool, id, "admin")
            .await
            .map_err(|e| anyhow!(e.message))?;
        tracing::info!(user_id = id, email = %email, "Existing user promoted to admin");
        return Ok(());
    }

    let password = std::env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD must be set")?;
    if password.len() < 8 {
        return Err(anyhow!("ADMIN_PASSWORD must be at least 8 characters"));
    }
    let hash = hash_password(&password).map_err(|e| anyhow!("failed to hash password: {e}"))?;

    let admin = user::create(&pool, &email, &hash, "Administrator", "admin")
        .await
        .map_err(|e| anyhow!(e.message))?;
    tracing::info!(user_id = admin.id, email = %admin.email, "Admin account created");

    Ok(())
}
