use anyhow::{bail, Result};
use sqlx::PgPool;
use url::Url;

use crate::store::{StoreError, User};
use crate::telemetry::{self};
use crate::telemetry::ops::feed::Phase as FeedPhase;

mod db;
pub mod types;

pub async fn add_feed(pool: &PgPool, user: &User, name: &str, url: &str) -> Result<()> {
    let log = telemetry::feed();
    let _g = log.root_span_kv([
        ("name", name.to_string()),
        ("url", url.to_string()),
        ("user", user.name.clone()),
    ]).entered();

    // URL validation (friendly error before DB I/O)
    validate_url(url)?;

    let _s = log.span(&FeedPhase::Add).entered();
    let feed = match db::create_followed_feed(pool, name, url, user.id).await {
        Ok((feed, _follow)) => feed,
        Err(StoreError::UniqueViolation(_)) => bail!("a feed with url {} already exists; use `gator follow {}`", url, url),
        Err(e) => return Err(e.into()),
    };

    log.info("➕ Feed created and followed");
    log.info(format!("* ID:      {}", feed.id));
    log.info(format!("* Name:    {}", feed.name));
    log.info(format!("* URL:     {}", feed.url));
    log.info(format!("* User:    {}", user.name));
    if telemetry::config::json_mode() {
        log.result(&types::FeedAddResult { feed, followed: true })?;
    }
    Ok(())
}

pub async fn list_feeds(pool: &PgPool) -> Result<()> {
    let log = telemetry::feed();
    let _g = log.root_span().entered();
    let _s = log.span(&FeedPhase::List).entered();

    let feeds = db::list_feeds(pool).await?;
    log.info("📡 Feeds:");
    for row in &feeds {
        log.info(format!(
            "{} ({}) owner={} last_fetched_at={:?}",
            row.name, row.url, row.owner, row.last_fetched_at
        ));
    }
    if telemetry::config::json_mode() {
        log.result(&types::FeedList { feeds })?;
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<()> {
    match Url::parse(url) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(()),
        Ok(u) => bail!("Unsupported URL scheme {}: {}", u.scheme(), url),
        Err(_) => bail!("Invalid URL: {}", url),
    }
}
