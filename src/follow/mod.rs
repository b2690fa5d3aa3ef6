use anyhow::{bail, Result};
use serde::Serialize;
use sqlx::PgPool;

use crate::store::{Feed, FeedStore, StoreError, User};
use crate::telemetry::{self};
use crate::telemetry::ops::follow::Phase as FollowPhase;

pub mod db;

pub async fn follow(pool: &PgPool, store: &dyn FeedStore, user: &User, url: &str) -> Result<()> {
    let log = telemetry::follow();
    let _g = log.root_span_kv([("url", url.to_string()), ("user", user.name.clone())]).entered();
    let _s = log.span(&FollowPhase::Follow).entered();

    let feed = feed_by_url(store, url).await?;
    let row = match db::create_feed_follow(pool, user.id, feed.id).await {
        Ok(row) => row,
        Err(StoreError::UniqueViolation(_)) => bail!("{} already follows {}", user.name, feed.name),
        Err(e) => return Err(e.into()),
    };
    log.info(format!("➕ {} now follows {}", row.user_name, row.feed_name));
    if telemetry::config::json_mode() {
        log.result(&row)?;
    }
    Ok(())
}

pub async fn following(pool: &PgPool, user: &User) -> Result<()> {
    let log = telemetry::follow();
    let _g = log.root_span_kv([("user", user.name.clone())]).entered();
    let _s = log.span(&FollowPhase::List).entered();

    let rows = db::feed_follows_for_user(pool, user.id).await?;
    log.info(format!("📚 {} follows {} feed(s):", user.name, rows.len()));
    for row in &rows {
        log.info(format!("* {} ({})", row.feed_name, row.feed_url));
    }
    if telemetry::config::json_mode() {
        log.result(&rows)?;
    }
    Ok(())
}

pub async fn unfollow(pool: &PgPool, store: &dyn FeedStore, user: &User, url: &str) -> Result<()> {
    let log = telemetry::follow();
    let _g = log.root_span_kv([("url", url.to_string()), ("user", user.name.clone())]).entered();
    let _s = log.span(&FollowPhase::Unfollow).entered();

    let feed = feed_by_url(store, url).await?;
    let removed = db::delete_feed_follow(pool, user.id, feed.id).await?;
    if removed == 0 {
        bail!("{} does not follow {}", user.name, feed.name);
    }
    log.info(format!("➖ {} unfollowed", feed.name));
    if telemetry::config::json_mode() {
        #[derive(Serialize)]
        struct UnfollowResult { feed: String, removed: u64 }
        log.result(&UnfollowResult { feed: feed.name, removed })?;
    }
    Ok(())
}

async fn feed_by_url(store: &dyn FeedStore, url: &str) -> Result<Feed> {
    match store.get_feed_by_url(url).await {
        Ok(feed) => Ok(feed),
        Err(StoreError::NotFound) => bail!("no feed registered with url {}; add it with `gator addfeed`", url),
        Err(e) => Err(e.into()),
    }
}
