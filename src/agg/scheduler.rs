use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::ingestion::write::ingest_items;
use crate::ingestion::{FeedSource, IngestSummary};
use crate::store::{Feed, FeedStore};
use crate::telemetry::{self};
use crate::telemetry::ops::agg::Phase as AggPhase;

/// How one fetch cycle ended. Every variant is terminal for that feed's turn.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The store holds no feeds.
    Idle,
    SelectFailed,
    MarkFailed { feed: String },
    FetchFailed { feed: String, error: String },
    Ingested { feed: String, found: usize, summary: IngestSummary },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub cycles: u64,
    pub idle: u64,
    pub failed: u64,
    pub posts_inserted: u64,
}

impl RunStats {
    fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::Idle => self.idle += 1,
            CycleOutcome::Ingested { summary, .. } => self.posts_inserted += summary.inserted as u64,
            CycleOutcome::SelectFailed | CycleOutcome::MarkFailed { .. } | CycleOutcome::FetchFailed { .. } => self.failed += 1,
        }
    }
}

pub struct Scheduler {
    store: Arc<dyn FeedStore>,
    source: Arc<dyn FeedSource>,
}

impl Scheduler {
    pub fn new(store: Arc<dyn FeedStore>, source: Arc<dyn FeedSource>) -> Self {
        Self { store, source }
    }

    /// Drive one cycle per tick until `shutdown` fires.
    ///
    /// The first tick fires immediately. Cycles run inline, so a cycle longer
    /// than `interval` delays the next one instead of overlapping it; missed
    /// ticks collapse into a single immediate tick. Shutdown is only observed
    /// between cycles.
    pub async fn run(&self, interval: Duration, shutdown: CancellationToken) -> RunStats {
        let log = telemetry::agg();
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut stats = RunStats::default();
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {
                    let outcome = self.tick().await;
                    stats.record(&outcome);
                }
            }
        }
        log.info(format!("🛑 Scheduler stopped after {} cycle(s)", stats.cycles));
        stats
    }

    /// Select the oldest-fetched feed and run one cycle for it.
    pub async fn tick(&self) -> CycleOutcome {
        let log = telemetry::agg();
        let next = {
            let _s = log.span(&AggPhase::Select).entered();
            self.store.get_next_feed_to_fetch().await
        };
        match next {
            Ok(Some(feed)) => self.scrape_feed(feed).await,
            Ok(None) => {
                log.info("ℹ️  No feeds to fetch");
                CycleOutcome::Idle
            }
            Err(e) => {
                log.error_kv("error selecting next feed", [("error", e.to_string())]);
                CycleOutcome::SelectFailed
            }
        }
    }

    /// Mark, fetch, ingest. The mark happens before the request and is never
    /// rolled back, so a failing feed still rotates to the back of the queue.
    pub async fn scrape_feed(&self, feed: Feed) -> CycleOutcome {
        let log = telemetry::agg();
        let _g = log.span_kv(&AggPhase::Fetch, [("feed", feed.name.clone()), ("url", feed.url.clone())]).entered();
        log.info(format!("📡 Fetching feed {}", feed.name));

        let marked = {
            let _s = log.span(&AggPhase::Mark).entered();
            self.store.mark_feed_fetched(feed.id).await
        };
        let feed = match marked {
            Ok(feed) => feed,
            Err(e) => {
                log.error_kv("error marking feed as fetched", [("feed", feed.name.clone()), ("error", e.to_string())]);
                return CycleOutcome::MarkFailed { feed: feed.name };
            }
        };

        let parsed = match self.source.fetch(&feed.url).await {
            Ok(parsed) => parsed,
            Err(e) => {
                log.error_kv("error fetching feed", [("feed", feed.name.clone()), ("url", feed.url.clone()), ("error", e.to_string())]);
                return CycleOutcome::FetchFailed { feed: feed.name, error: e.to_string() };
            }
        };
        log.debug_kv("parsed feed", [("title", parsed.title.clone()), ("link", parsed.link.clone())]);
        if parsed.skipped > 0 {
            log.warn_kv("items without a link skipped", [("feed", feed.name.clone()), ("count", parsed.skipped.to_string())]);
        }

        let summary = {
            let _s = log.span(&AggPhase::Ingest).entered();
            ingest_items(self.store.as_ref(), feed.id, &parsed.items).await
        };
        log.cycle_summary(&feed.name, parsed.items.len(), summary.inserted, summary.duplicates, summary.errors);
        CycleOutcome::Ingested { feed: feed.name, found: parsed.items.len(), summary }
    }
}
