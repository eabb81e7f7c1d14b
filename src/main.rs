//! oddsboard: throttled NBA totals and scores feed.
//!
//! Single-binary Tokio application that:
//! 1. Serves totals lines per game from The Odds API
//! 2. Serves normalized live scores, clock-merged with the ESPN scoreboard
//! 3. Records an intraday history of totals lines per game
//! 4. Holds every upstream fetch behind a TTL + fetch-window gate

mod api;
mod config;
mod service;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use crate::service::FeedService;

/// Throttled NBA odds and scores feed
#[derive(Parser)]
#[command(name = "oddsboard", about = "Throttled NBA odds and scores feed")]
struct Cli {
    /// Path to a config.toml (defaults to ./config.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address override, e.g. 0.0.0.0:8080.
    #[arg(long)]
    bind: Option<String>,

    /// Fetch one odds payload to verify the key and quota, then exit.
    #[arg(long)]
    check_upstream: bool,
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "oddsboard=info,feed=info,oddsapi_client=info,espn_client=info".into()
            }),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    info!("🏀 oddsboard starting up...");

    // Load configuration.
    let mut cfg = match config::load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(bind) = cli.bind {
        if bind.parse::<SocketAddr>().is_err() {
            error!("Invalid --bind address: {}", bind);
            std::process::exit(1);
        }
        cfg.bind = bind;
    }

    info!(
        "Sport: {}, regions: {}, bookmaker fallback: {}",
        cfg.sport_key, cfg.regions, cfg.bookmaker
    );
    info!(
        "Throttle (ttl/window): odds {}s/{}s, scores {}s/{}s, clock {}s/{}s",
        cfg.throttle.odds_ttl_secs,
        cfg.throttle.odds_window_secs,
        cfg.throttle.scores_ttl_secs,
        cfg.throttle.scores_window_secs,
        cfg.throttle.clock_ttl_secs,
        cfg.throttle.clock_window_secs,
    );

    let bind = cfg.bind.clone();
    let service = Arc::new(FeedService::new(cfg));

    // ── Check-upstream mode ──────────────────────────────────────────
    if cli.check_upstream {
        info!("Running upstream check...");
        match service.check_upstream().await {
            Ok(()) => info!("✅ Upstream check passed"),
            Err(e) => {
                error!("❌ Upstream check failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // ── Serve ────────────────────────────────────────────────────────
    let app = api::create_router(service);
    let listener = match tokio::net::TcpListener::bind(&bind).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind {}: {}", bind, e);
            std::process::exit(1);
        }
    };

    info!("🚀 oddsboard listening on {}. Press Ctrl+C to stop.", bind);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("oddsboard shut down.");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
