use anyhow::{bail, Result};
use serde::Serialize;
use sqlx::PgPool;

use crate::store::User;
use crate::telemetry::{self};
use crate::telemetry::ops::browse::Phase as BrowsePhase;

mod db;

use db::PostRow;

pub const DEFAULT_LIMIT: i64 = 2;

pub async fn run(pool: &PgPool, user: &User, limit: i64) -> Result<()> {
    let log = telemetry::browse();
    let _g = log.root_span_kv([("user", user.name.clone()), ("limit", limit.to_string())]).entered();
    if limit < 1 {
        bail!("limit must be a positive integer, got {}", limit);
    }

    let posts = { let _s = log.span(&BrowsePhase::Query).entered(); db::posts_for_user(pool, user.id, limit).await? };
    log.info(format!("📰 Found {} post(s) for user {}:", posts.len(), user.name));
    for post in &posts {
        for line in render(post) {
            log.info(line);
        }
    }
    if telemetry::config::json_mode() {
        #[derive(Serialize)]
        struct BrowseResult<'a> { user: &'a str, posts: &'a [PostRow] }
        log.result(&BrowseResult { user: &user.name, posts: &posts })?;
    }
    Ok(())
}

fn render(post: &PostRow) -> Vec<String> {
    let date = post
        .published_at
        .map(|d| d.format("%a %b %-d").to_string())
        .unwrap_or_else(|| "undated".to_string());
    let mut lines = vec![
        format!("{} from {}", date, post.feed_name),
        format!("--- {} ---", post.title),
    ];
    if let Some(desc) = post.description.as_deref() {
        lines.push(format!("    {}", desc));
    }
    lines.push(format!("Link: {}", post.url));
    lines.push("=====================================".to_string());
    lines
}
