use chrono::Utc;
use uuid::Uuid;

use crate::store::{FeedStore, NewPost};
use crate::telemetry::{self};
use crate::telemetry::ops::agg::Phase as AggPhase;

use super::parse::parse_pub_date;
use super::types::{IngestSummary, ParsedItem};

pub fn new_post(feed_id: Uuid, item: &ParsedItem) -> NewPost {
    let now = Utc::now();
    NewPost {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        title: item.title.clone(),
        url: item.link.clone(),
        description: item.description.clone(),
        published_at: item.pub_date.as_deref().and_then(parse_pub_date),
        feed_id,
    }
}

/// Insert each item as its own unit of work, in document order.
///
/// A duplicate link is the normal re-fetch path and is only counted. Any other
/// failure is logged and skips that one item; nothing here aborts the batch.
pub async fn ingest_items(store: &dyn FeedStore, feed_id: Uuid, items: &[ParsedItem]) -> IngestSummary {
    let log = telemetry::agg();
    let mut summary = IngestSummary::default();

    for item in items {
        let post = new_post(feed_id, item);
        if post.published_at.is_none() {
            summary.undated += 1;
            if let Some(raw) = item.pub_date.as_deref() {
                log.debug_kv("unparseable pubDate", [("link", item.link.clone()), ("raw", raw.to_string())]);
            }
        }

        let _ws = log.span(&AggPhase::WritePost).entered();
        match store.create_post(post).await {
            Ok(_) => {
                summary.inserted += 1;
                log.debug_kv("➕ post", [("title", item.title.clone()), ("link", item.link.clone())]);
            }
            Err(e) if e.is_unique_violation() => summary.duplicates += 1,
            Err(e) => {
                summary.errors += 1;
                log.warn_kv("post insert failed", [("link", item.link.clone()), ("error", e.to_string())]);
            }
        }
    }
    summary
}
