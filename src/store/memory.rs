use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Feed, FeedStore, NewPost, Post, StoreError};

/// In-memory [`FeedStore`] with the same ordering and uniqueness rules as the
/// Postgres schema, plus failure injection for tests.
#[derive(Default)]
pub struct MemStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    feeds: Vec<Feed>,
    posts: Vec<Post>,
    last_stamp: Option<DateTime<Utc>>,
    failing_reads: usize,
    failing_marks: usize,
    failing_links: HashSet<String>,
    create_calls: usize,
}

impl State {
    // strictly increasing so back-to-back marks never tie
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(prev) if now <= prev => prev + chrono::Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_feed(&self, name: &str, url: &str, last_fetched_at: Option<DateTime<Utc>>) -> Feed {
        let mut st = self.state.lock().unwrap();
        let now = st.tick();
        let feed = Feed {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            name: name.to_string(),
            url: url.to_string(),
            user_id: Uuid::nil(),
            last_fetched_at,
        };
        st.feeds.push(feed.clone());
        feed
    }

    pub fn feed(&self, id: Uuid) -> Option<Feed> {
        self.state.lock().unwrap().feeds.iter().find(|f| f.id == id).cloned()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.state.lock().unwrap().posts.clone()
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    /// The next `n` calls to `get_next_feed_to_fetch` fail.
    pub fn fail_reads(&self, n: usize) {
        self.state.lock().unwrap().failing_reads = n;
    }

    /// The next `n` calls to `mark_feed_fetched` fail and leave the feed untouched.
    pub fn fail_marks(&self, n: usize) {
        self.state.lock().unwrap().failing_marks = n;
    }

    /// Inserts of this link fail with a non-duplicate error.
    pub fn fail_link(&self, link: &str) {
        self.state.lock().unwrap().failing_links.insert(link.to_string());
    }
}

#[async_trait]
impl FeedStore for MemStore {
    async fn get_next_feed_to_fetch(&self) -> Result<Option<Feed>, StoreError> {
        let mut st = self.state.lock().unwrap();
        if st.failing_reads > 0 {
            st.failing_reads -= 1;
            return Err(StoreError::Timeout(Duration::from_secs(10)));
        }
        // min_by_key keeps the first of equal keys, i.e. insertion order
        let next = st
            .feeds
            .iter()
            .min_by_key(|f| (f.last_fetched_at.is_some(), f.last_fetched_at, f.created_at))
            .cloned();
        Ok(next)
    }

    async fn mark_feed_fetched(&self, feed_id: Uuid) -> Result<Feed, StoreError> {
        let mut st = self.state.lock().unwrap();
        if st.failing_marks > 0 {
            st.failing_marks -= 1;
            return Err(StoreError::Timeout(Duration::from_secs(10)));
        }
        let now = st.tick();
        let feed = st.feeds.iter_mut().find(|f| f.id == feed_id).ok_or(StoreError::NotFound)?;
        feed.last_fetched_at = Some(feed.last_fetched_at.map_or(now, |prev| prev.max(now)));
        feed.updated_at = now;
        Ok(feed.clone())
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let mut st = self.state.lock().unwrap();
        st.create_calls += 1;
        if st.failing_links.contains(&post.url) {
            return Err(StoreError::Timeout(Duration::from_secs(10)));
        }
        if !st.feeds.iter().any(|f| f.id == post.feed_id) {
            return Err(StoreError::NotFound);
        }
        if st.posts.iter().any(|p| p.url == post.url) {
            return Err(StoreError::UniqueViolation("posts_url_key".to_string()));
        }
        let row = Post {
            id: post.id,
            created_at: post.created_at,
            updated_at: post.updated_at,
            title: post.title,
            url: post.url,
            description: post.description,
            published_at: post.published_at,
            feed_id: post.feed_id,
        };
        st.posts.push(row.clone());
        Ok(row)
    }

    async fn get_feed_by_url(&self, url: &str) -> Result<Feed, StoreError> {
        let st = self.state.lock().unwrap();
        st.feeds.iter().find(|f| f.url == url).cloned().ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn never_fetched_feeds_come_first() {
        let store = MemStore::new();
        let old = store.add_feed("old", "https://a/rss", Some(Utc::now() - chrono::Duration::minutes(10)));
        let fresh = store.add_feed("fresh", "https://b/rss", None);

        let next = store.get_next_feed_to_fetch().await.unwrap().unwrap();
        assert_eq!(next.id, fresh.id);

        store.mark_feed_fetched(fresh.id).await.unwrap();
        let next = store.get_next_feed_to_fetch().await.unwrap().unwrap();
        assert_eq!(next.id, old.id);
    }

    #[tokio::test]
    async fn mark_never_moves_timestamp_backwards() {
        let store = MemStore::new();
        let future = Utc::now() + chrono::Duration::hours(1);
        let feed = store.add_feed("f", "https://f/rss", Some(future));
        let marked = store.mark_feed_fetched(feed.id).await.unwrap();
        assert_eq!(marked.last_fetched_at, Some(future));
    }

    #[tokio::test]
    async fn empty_store_has_no_next_feed() {
        let store = MemStore::new();
        assert!(store.get_next_feed_to_fetch().await.unwrap().is_none());
        assert!(matches!(store.get_feed_by_url("https://x").await, Err(StoreError::NotFound)));
    }
}
