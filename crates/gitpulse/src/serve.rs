// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `gitpulse serve` command implementation.
//!
//! Wires the pipeline together and schedules the periodic tasks: the
//! event poller, the retention sweeper, and the stats recomputes. Each
//! task is an independent short-lived batch job on its own interval;
//! nothing blocks anything else, and they share only the database handle,
//! whose writes serialize on one background thread.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gitpulse_analytics::{ProfileAnalytics, StatsAggregator};
use gitpulse_config::GitpulseConfig;
use gitpulse_core::types::Commit;
use gitpulse_core::PulseError;
use gitpulse_gateway::{GatewayState, ServerConfig};
use gitpulse_geocode::GeocodeClient;
use gitpulse_github::GithubClient;
use gitpulse_ingest::{EnrichmentCache, EventPoller};
use gitpulse_query::{QueryEngine, QueryLimits};
use gitpulse_storage::{Database, RetentionSweeper};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::shutdown;

/// Capacity of the live commit broadcast channel. One poll cycle stores
/// at most one events page, so consumers only lag if they stall.
const LIVE_CHANNEL_CAPACITY: usize = 1024;

/// The wired ingestion pipeline shared by `serve` and `poll`.
struct Pipeline {
    db: Arc<Database>,
    poller: Arc<EventPoller>,
    live_tx: broadcast::Sender<Commit>,
}

async fn build_pipeline(config: &GitpulseConfig) -> Result<Pipeline, PulseError> {
    let db = Arc::new(Database::open(&config.storage.database_path).await?);

    let github = Arc::new(GithubClient::new(
        config.github.api_base.clone(),
        config.github.token.clone(),
        config.github.page_size,
    )?);
    let geocoder = Arc::new(GeocodeClient::new(
        config.geocoder.endpoint.clone(),
        &config.geocoder.client_tag,
    )?);

    let cache = Arc::new(EnrichmentCache::new(db.clone()));
    let (live_tx, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);

    let poller = Arc::new(EventPoller::new(
        db.clone(),
        cache,
        github.clone(),
        github.clone(),
        geocoder,
        github,
        config.github.enrichment_floor,
        live_tx.clone(),
    ));

    Ok(Pipeline {
        db,
        poller,
        live_tx,
    })
}

/// Runs the `gitpulse serve` command.
pub async fn run_serve(config: GitpulseConfig) -> Result<(), PulseError> {
    init_tracing(&config.service.log_level);
    info!("starting gitpulse serve");

    let pipeline = build_pipeline(&config).await?;
    let cancel = shutdown::install_signal_handler();

    // Poller task: first tick fires immediately so the globe lights up
    // without waiting a full interval.
    if config.poller.enabled {
        let poller = pipeline.poller.clone();
        let poll_cancel = cancel.clone();
        let interval_secs = config.poller.interval_secs;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let outcome = poller.poll().await;
                        if outcome.rate_limited {
                            warn!("poll cycle rate limited; deferring to next tick");
                        }
                    }
                    _ = poll_cancel.cancelled() => {
                        info!("poller task shutting down");
                        break;
                    }
                }
            }
        });
        info!(interval_secs, "event poller started");
    } else {
        info!("event poller disabled by configuration; serving queries only");
    }

    // Retention sweeper.
    {
        let sweeper = RetentionSweeper::new(
            pipeline.db.clone(),
            Duration::from_secs(config.retention.window_secs),
            config.retention.evict_batch,
        );
        let sweep_cancel = cancel.clone();
        let interval_secs = config.retention.sweep_interval_secs;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            // Skip the first immediate tick; a fresh start has no backlog.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = sweeper.sweep(Utc::now().timestamp_millis()).await {
                            warn!(error = %e, "retention sweep failed (non-fatal)");
                        }
                    }
                    _ = sweep_cancel.cancelled() => {
                        info!("retention task shutting down");
                        break;
                    }
                }
            }
        });
        info!(
            window_secs = config.retention.window_secs,
            interval_secs, "retention sweeper started"
        );
    }

    // Stats recompute.
    {
        let aggregator = StatsAggregator::new(pipeline.db.clone());
        let stats_cancel = cancel.clone();
        let interval_secs = config.stats.interval_secs;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let now = Utc::now();
                        if let Err(e) = aggregator.recompute_monthly(now).await {
                            warn!(error = %e, "monthly rollup failed (non-fatal)");
                        }
                        if let Err(e) = aggregator.recompute_daily(now).await {
                            warn!(error = %e, "daily rollup failed (non-fatal)");
                        }
                    }
                    _ = stats_cancel.cancelled() => {
                        info!("stats task shutting down");
                        break;
                    }
                }
            }
        });
        info!(interval_secs, "stats aggregator started");
    }

    // Gateway in the foreground; without it, just wait for shutdown.
    if config.gateway.enabled {
        let limits = QueryLimits {
            result_cap: config.query.result_cap,
            scan_cap: config.query.scan_cap,
            live_window: Duration::from_secs(config.query.live_window_secs),
        };
        let state = GatewayState {
            engine: Arc::new(QueryEngine::new(pipeline.db.clone(), limits)),
            profiles: Arc::new(ProfileAnalytics::new(pipeline.db.clone())),
            live_tx: pipeline.live_tx.clone(),
            start_time: std::time::Instant::now(),
        };
        let server_config = ServerConfig {
            host: config.gateway.host.clone(),
            port: config.gateway.port,
        };
        gitpulse_gateway::start_server(&server_config, state, cancel.clone()).await?;
    } else {
        debug!("gateway disabled by configuration");
        cancel.cancelled().await;
    }

    info!("shutting down");
    pipeline.db.close().await?;
    Ok(())
}

/// Runs a single poll cycle and prints the structured outcome.
pub async fn run_poll_once(config: GitpulseConfig) -> Result<(), PulseError> {
    init_tracing(&config.service.log_level);

    let pipeline = build_pipeline(&config).await?;
    let outcome = pipeline.poller.poll().await;
    println!(
        "{}",
        serde_json::to_string(&outcome)
            .map_err(|e| PulseError::Internal(format!("outcome encode: {e}")))?
    );
    pipeline.db.close().await?;
    Ok(())
}

/// Recomputes the monthly and daily rollups once.
pub async fn run_stats_once(config: GitpulseConfig) -> Result<(), PulseError> {
    init_tracing(&config.service.log_level);

    let db = Arc::new(Database::open(&config.storage.database_path).await?);
    let aggregator = StatsAggregator::new(db.clone());
    let now = Utc::now();
    let monthly = aggregator.recompute_monthly(now).await?;
    let daily = aggregator.recompute_daily(now).await?;
    println!(
        "month {}: {} commits, {} contributors; day {}: {} commits",
        monthly.month,
        monthly.total_commits,
        monthly.unique_contributors,
        daily.day,
        daily.total_commits
    );
    db.close().await?;
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gitpulse={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
