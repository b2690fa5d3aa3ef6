use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::store::StoreError;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct FollowRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub feed_id: Uuid,
    pub feed_name: String,
    pub feed_url: String,
    pub user_name: String,
}

pub async fn create_feed_follow<'e>(
    conn: impl PgExecutor<'e>,
    user_id: Uuid,
    feed_id: Uuid,
) -> Result<FollowRow, StoreError> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, FollowRow>(
        r#"
        WITH inserted AS (
            INSERT INTO feed_follows (id, created_at, updated_at, user_id, feed_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at, user_id, feed_id
        )
        SELECT i.id, i.created_at, i.feed_id, f.name AS feed_name, f.url AS feed_url, u.name AS user_name
        FROM inserted i
        JOIN feeds f ON f.id = i.feed_id
        JOIN users u ON u.id = i.user_id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(now)
    .bind(now)
    .bind(user_id)
    .bind(feed_id)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

pub async fn feed_follows_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<FollowRow>> {
    let rows = sqlx::query_as::<_, FollowRow>(
        r#"
        SELECT ff.id, ff.created_at, ff.feed_id, f.name AS feed_name, f.url AS feed_url, u.name AS user_name
        FROM feed_follows ff
        JOIN feeds f ON f.id = ff.feed_id
        JOIN users u ON u.id = ff.user_id
        WHERE ff.user_id = $1
        ORDER BY ff.created_at, f.name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn delete_feed_follow(pool: &PgPool, user_id: Uuid, feed_id: Uuid) -> Result<u64> {
    let res = sqlx::query("DELETE FROM feed_follows WHERE user_id = $1 AND feed_id = $2")
        .bind(user_id)
        .bind(feed_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
