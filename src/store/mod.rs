//! Store contract consumed by the fetch cycle.
//!
//! The scheduler and the post ingestor only ever talk to a [`FeedStore`]; the
//! Postgres implementation lives in [`pg`], and an in-memory one backs the
//! unit tests.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

pub mod pg;
pub mod types;
#[cfg(test)]
pub mod memory;

pub use pg::PgStore;
pub use types::{Feed, NewPost, Post, User};

#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Feed with the oldest `last_fetched_at`, never-fetched feeds first.
    async fn get_next_feed_to_fetch(&self) -> Result<Option<Feed>, StoreError>;

    /// Stamp `last_fetched_at = now` and return the updated record.
    async fn mark_feed_fetched(&self, feed_id: Uuid) -> Result<Feed, StoreError>;

    /// Fails with [`StoreError::UniqueViolation`] when the link is already stored.
    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError>;

    async fn get_feed_by_url(&self, url: &str) -> Result<Feed, StoreError>;
}

#[derive(Debug)]
pub enum StoreError {
    NotFound,
    UniqueViolation(String),
    Timeout(Duration),
    Db(sqlx::Error),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::UniqueViolation(db.constraint().unwrap_or("unique").to_string())
            }
            other => StoreError::Db(other),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "record not found"),
            StoreError::UniqueViolation(constraint) => write!(f, "unique constraint violated: {constraint}"),
            StoreError::Timeout(after) => write!(f, "store call timed out after {after:?}"),
            StoreError::Db(err) => write!(f, "database error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Db(err) => Some(err),
            _ => None,
        }
    }
}

/// Run a store call under a deadline so one hung query cannot stall the loop.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res.map_err(StoreError::from),
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}
