use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{with_deadline, Feed, FeedStore, NewPost, Post, StoreError};

const FEED_COLUMNS: &str = "id, created_at, updated_at, name, url, user_id, last_fetched_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl FeedStore for PgStore {
    async fn get_next_feed_to_fetch(&self) -> Result<Option<Feed>, StoreError> {
        let sql = format!(
            "SELECT {FEED_COLUMNS} FROM feeds \
             ORDER BY last_fetched_at ASC NULLS FIRST, created_at ASC, id ASC \
             LIMIT 1"
        );
        with_deadline(self.timeout, sqlx::query_as::<_, Feed>(&sql).fetch_optional(&self.pool)).await
    }

    async fn mark_feed_fetched(&self, feed_id: Uuid) -> Result<Feed, StoreError> {
        // GREATEST skips NULL, so a never-fetched feed just gets now()
        let sql = format!(
            "UPDATE feeds \
             SET last_fetched_at = GREATEST(last_fetched_at, now()), updated_at = now() \
             WHERE id = $1 \
             RETURNING {FEED_COLUMNS}"
        );
        with_deadline(self.timeout, sqlx::query_as::<_, Feed>(&sql).bind(feed_id).fetch_one(&self.pool)).await
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let query = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, created_at, updated_at, title, url, description, published_at, feed_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, created_at, updated_at, title, url, description, published_at, feed_id
            "#,
        )
        .bind(post.id)
        .bind(post.created_at)
        .bind(post.updated_at)
        .bind(post.title)
        .bind(post.url)
        .bind(post.description)
        .bind(post.published_at)
        .bind(post.feed_id);
        with_deadline(self.timeout, query.fetch_one(&self.pool)).await
    }

    async fn get_feed_by_url(&self, url: &str) -> Result<Feed, StoreError> {
        let sql = format!("SELECT {FEED_COLUMNS} FROM feeds WHERE url = $1");
        with_deadline(self.timeout, sqlx::query_as::<_, Feed>(&sql).bind(url).fetch_one(&self.pool)).await
    }
}
