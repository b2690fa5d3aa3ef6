use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Args;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::config::Timeouts;
use crate::ingestion::HttpFetcher;
use crate::store::PgStore;
use crate::telemetry::{self};
use crate::util::time::parse_interval;

pub mod scheduler;

pub use scheduler::Scheduler;

/// gator agg <time_between_reqs>
#[derive(Args)]
pub struct AggCmd {
    /// Time between requests, e.g. 30s, 1m, 1h30m
    #[arg(value_parser = parse_interval)]
    pub time_between_reqs: Duration,
}

pub async fn run(pool: &PgPool, timeouts: Timeouts, args: AggCmd, shutdown: CancellationToken) -> Result<()> {
    let log = telemetry::agg();
    let _g = log.root_span_kv([
        ("interval", format!("{:?}", args.time_between_reqs)),
        ("fetch_timeout", format!("{:?}", timeouts.fetch)),
        ("store_timeout", format!("{:?}", timeouts.store)),
    ]).entered();

    let interval = args.time_between_reqs;
    let store = Arc::new(PgStore::new(pool.clone(), timeouts.store));
    let source = Arc::new(HttpFetcher::new(timeouts.fetch)?);
    let scheduler = Scheduler::new(store, source);

    log.info(format!("⏱️  Collecting feeds every {:?}", interval));
    let started = Instant::now();
    let stats = scheduler.run(interval, shutdown).await;

    if telemetry::config::json_mode() {
        log.result_timed(&stats, started.elapsed())?;
    }
    Ok(())
}
