use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::env;
use tokio_util::sync::CancellationToken;

mod agg;
mod browse;
mod config;
mod feed;
mod follow;
mod ingestion;
mod init;
mod store;
mod telemetry;
mod user;
mod util;

use config::{Config, Timeouts};
use store::PgStore;

#[derive(Parser)]
#[command(name = "gator", about = "Multi-user RSS feed aggregator")]
struct Cli {
    /// Postgres connection string; overrides DATABASE_URL and the config file
    #[arg(global = true, short, long)]
    dsn: Option<String>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Init,
    /// Create a user and log in as them
    Register { name: String },
    /// Switch the current user
    Login { name: String },
    /// Delete every user (and everything they own)
    Reset,
    /// List users
    Users,
    /// Fetch feeds forever, one every interval
    Agg(agg::AggCmd),
    /// Register a feed and follow it
    Addfeed { name: String, url: String },
    /// List all feeds
    Feeds,
    /// Follow an existing feed by URL
    Follow { url: String },
    /// List feeds the current user follows
    Following,
    /// Stop following a feed
    Unfollow { url: String },
    /// Show the newest posts from followed feeds
    Browse {
        #[arg(default_value_t = browse::DEFAULT_LIMIT)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and GATOR_LOG_FORMAT
    telemetry::config::init_tracing();

    let mut cfg = Config::load()?;
    let timeouts = Timeouts::from_env();
    let dsn = cfg.resolve_dsn(cli.dsn, env::var("DATABASE_URL").ok())?;
    let pool = init::connect(&dsn).await?;
    let store = PgStore::new(pool.clone(), timeouts.store);

    match cli.command {
        Commands::Init => init::run(&pool).await?,
        Commands::Register { name } => user::register(&pool, &mut cfg, &name).await?,
        Commands::Login { name } => user::login(&pool, &mut cfg, &name).await?,
        Commands::Reset => user::reset(&pool).await?,
        Commands::Users => user::list(&pool, &cfg).await?,
        Commands::Agg(args) => {
            let shutdown = CancellationToken::new();
            let trigger = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    trigger.cancel();
                }
            });
            agg::run(&pool, timeouts, args, shutdown).await?
        }
        Commands::Addfeed { name, url } => {
            let me = user::require_user(&pool, &cfg).await?;
            feed::add_feed(&pool, &me, &name, &url).await?
        }
        Commands::Feeds => feed::list_feeds(&pool).await?,
        Commands::Follow { url } => {
            let me = user::require_user(&pool, &cfg).await?;
            follow::follow(&pool, &store, &me, &url).await?
        }
        Commands::Following => {
            let me = user::require_user(&pool, &cfg).await?;
            follow::following(&pool, &me).await?
        }
        Commands::Unfollow { url } => {
            let me = user::require_user(&pool, &cfg).await?;
            follow::unfollow(&pool, &store, &me, &url).await?
        }
        Commands::Browse { limit } => {
            let me = user::require_user(&pool, &cfg).await?;
            browse::run(&pool, &me, limit).await?
        }
    }

    Ok(())
}
