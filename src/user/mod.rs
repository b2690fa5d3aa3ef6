use anyhow::{bail, Result};
use serde::Serialize;
use sqlx::PgPool;

use crate::config::Config;
use crate::store::{StoreError, User};
use crate::telemetry::{self};
use crate::telemetry::ops::user::Phase as UserPhase;

pub(crate) mod db;

#[derive(Serialize)]
struct UserRow {
    name: String,
    current: bool,
}

pub async fn register(pool: &PgPool, cfg: &mut Config, name: &str) -> Result<()> {
    let log = telemetry::user();
    let _g = log.root_span_kv([("name", name.to_string())]).entered();
    let _s = log.span(&UserPhase::Register).entered();

    let user = match db::create_user(pool, name).await {
        Ok(user) => user,
        Err(StoreError::UniqueViolation(_)) => bail!("user {} already exists", name),
        Err(e) => return Err(e.into()),
    };
    cfg.set_user(&user.name)?;
    log.info(format!("➕ User {} created and logged in", user.name));
    if telemetry::config::json_mode() {
        log.result(&user)?;
    }
    Ok(())
}

pub async fn login(pool: &PgPool, cfg: &mut Config, name: &str) -> Result<()> {
    let log = telemetry::user();
    let _g = log.root_span_kv([("name", name.to_string())]).entered();
    let _s = log.span(&UserPhase::Login).entered();

    let Some(user) = db::get_user(pool, name).await? else { bail!("user {} not found", name) };
    cfg.set_user(&user.name)?;
    log.info(format!("🔑 Logged in as {}", user.name));
    if telemetry::config::json_mode() {
        log.result(&user)?;
    }
    Ok(())
}

pub async fn reset(pool: &PgPool) -> Result<()> {
    let log = telemetry::user();
    let _g = log.root_span().entered();
    let _s = log.span(&UserPhase::Reset).entered();

    let deleted = db::delete_users(pool).await?;
    log.info(format!("🧹 Users table reset ({} removed)", deleted));
    if telemetry::config::json_mode() {
        #[derive(Serialize)]
        struct ResetResult { deleted: u64 }
        log.result(&ResetResult { deleted })?;
    }
    Ok(())
}

pub async fn list(pool: &PgPool, cfg: &Config) -> Result<()> {
    let log = telemetry::user();
    let _g = log.root_span().entered();
    let _s = log.span(&UserPhase::List).entered();

    let rows = mark_current(db::list_users(pool).await?, cfg.current_user());
    for row in &rows {
        if row.current { log.info(format!("* {} (current)", row.name)); } else { log.info(format!("* {}", row.name)); }
    }
    if telemetry::config::json_mode() {
        log.result(&rows)?;
    }
    Ok(())
}

/// Resolve the configured user; commands that act on behalf of a user call
/// this before doing anything else.
pub async fn require_user(pool: &PgPool, cfg: &Config) -> Result<User> {
    let Some(name) = cfg.current_user() else { bail!("not logged in; run `gator login <name>` first") };
    match db::get_user(pool, name).await? {
        Some(user) => Ok(user),
        None => bail!("current user {} no longer exists; log in again", name),
    }
}

fn mark_current(users: Vec<User>, current: Option<&str>) -> Vec<UserRow> {
    users
        .into_iter()
        .map(|u| UserRow { current: Some(u.name.as_str()) == current, name: u.name })
        .collect()
}
