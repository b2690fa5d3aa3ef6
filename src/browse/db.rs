use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PostRow {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub feed_name: String,
}

// newest first; undated posts sort after dated ones
pub async fn posts_for_user(pool: &PgPool, user_id: Uuid, limit: i64) -> Result<Vec<PostRow>> {
    let rows = sqlx::query_as::<_, PostRow>(
        r#"
        SELECT p.title, p.url, p.description, p.published_at, f.name AS feed_name
        FROM posts p
        JOIN feed_follows ff ON ff.feed_id = p.feed_id
        JOIN feeds f ON f.id = p.feed_id
        WHERE ff.user_id = $1
        ORDER BY p.published_at DESC NULLS LAST, p.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
