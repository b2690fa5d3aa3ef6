use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::store::Feed;

/// A feed joined with its owner's name, for listings.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct FeedRow {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct FeedAddResult {
    pub feed: Feed,
    pub followed: bool,
}

#[derive(Serialize)]
pub struct FeedList {
    pub feeds: Vec<FeedRow>,
}
