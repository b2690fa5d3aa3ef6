use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::telemetry::{self};
use crate::telemetry::ops::init::Phase as InitPhase;

pub async fn connect(dsn: &str) -> Result<PgPool> {
    let log = telemetry::init();
    let _s = log.span(&InitPhase::Connect).entered();
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(dsn)
        .await?;
    Ok(pool)
}

pub async fn run(pool: &PgPool) -> Result<()> {
    let log = telemetry::init();
    let _g = log.root_span().entered();
    let _s = log.span(&InitPhase::Migrate).entered();

    // Apply any pending migrations (idempotent)
    sqlx::migrate!().run(pool).await?;

    log.info("🗄️  Database initialized successfully");
    Ok(())
}

/// Migrated pool for database tests, or `None` when `DATABASE_URL` is unset.
#[cfg(test)]
pub async fn test_pool() -> Option<PgPool> {
    let dsn = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new().max_connections(2).connect(&dsn).await.ok()?;
    sqlx::migrate!().run(&pool).await.ok()?;
    Some(pool)
}
