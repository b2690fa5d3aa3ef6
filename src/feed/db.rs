use anyhow::Result;
use chrono::Utc;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::follow::db::{create_feed_follow, FollowRow};
use crate::store::{Feed, StoreError};

use super::types::FeedRow;

/// Registers a feed and its owner's follow together; neither row survives alone.
pub async fn create_followed_feed(
    pool: &PgPool,
    name: &str,
    url: &str,
    user_id: Uuid,
) -> Result<(Feed, FollowRow), StoreError> {
    let mut tx = pool.begin().await?;
    let feed = create_feed(&mut *tx, name, url, user_id).await?;
    let follow = create_feed_follow(&mut *tx, user_id, feed.id).await?;
    tx.commit().await?;
    Ok((feed, follow))
}

async fn create_feed<'e>(conn: impl PgExecutor<'e>, name: &str, url: &str, user_id: Uuid) -> Result<Feed, StoreError> {
    let now = Utc::now();
    let feed = sqlx::query_as::<_, Feed>(
        r#"
        INSERT INTO feeds (id, created_at, updated_at, name, url, user_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, created_at, updated_at, name, url, user_id, last_fetched_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(now)
    .bind(now)
    .bind(name)
    .bind(url)
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(feed)
}

pub async fn list_feeds(pool: &PgPool) -> Result<Vec<FeedRow>> {
    let rows = sqlx::query_as::<_, FeedRow>(
        r#"
        SELECT f.id, f.name, f.url, u.name AS owner, f.created_at, f.last_fetched_at
        FROM feeds f
        JOIN users u ON u.id = f.user_id
        ORDER BY f.created_at, f.id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
