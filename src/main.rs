mod api;
mod config;
mod court;
mod db;
mod error;
mod export;
mod state;
mod stats;
mod ticker;
mod types;

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, CHANNEL_CAPACITY};
use crate::db::reader::load_all;
use crate::db::writer::ArchiveWriter;
use crate::error::Result;
use crate::state::{ArchiveCache, MatchSession};
use crate::ticker::SessionTicker;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", cfg.db_path)).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Archive database ready at {}", cfg.db_path);

    // --- Archive cache: past matches for replay ---
    let cache = ArchiveCache::new();
    match load_all(&pool).await {
        Ok(matches) => cache.replace_all(matches),
        Err(e) => warn!("Archive load failed, starting with an empty cache: {e}"),
    }

    // --- Live session ---
    let info = cfg.match_info();
    info!(
        title = %info.title,
        date = %info.date,
        ally = %info.ally_name,
        opponent = %info.opponent_name,
        "Match session ready: {}",
        info.archive_label(),
    );
    let session = Arc::new(Mutex::new(MatchSession::new(info)));
    let health = Arc::new(HealthState::new());

    // --- Spawn tasks ---

    // Archive writer
    let (archive_tx, archive_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let writer = ArchiveWriter::new(pool.clone(), archive_rx);
    tokio::spawn(async move { writer.run().await });

    // Session ticker (suspensions + health, every 100ms)
    let ticker = SessionTicker::new(Arc::clone(&session), Arc::clone(&health));
    tokio::spawn(async move { ticker.run().await });

    // HTTP API server
    let api_state = ApiState {
        session,
        pool,
        archive_tx,
        cache,
        health,
        sync_lock: Arc::new(Mutex::new(())),
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
