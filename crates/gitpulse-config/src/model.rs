// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Gitpulse service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Gitpulse configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GitpulseConfig {
    /// Service-wide settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Upstream GitHub API settings.
    #[serde(default)]
    pub github: GithubConfig,

    /// Geocoding provider settings.
    #[serde(default)]
    pub geocoder: GeocoderConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Event poller settings.
    #[serde(default)]
    pub poller: PollerConfig,

    /// Commit retention settings.
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Stats recomputation settings.
    #[serde(default)]
    pub stats: StatsConfig,

    /// Query engine limits.
    #[serde(default)]
    pub query: QueryConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Service-wide configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Upstream GitHub API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GithubConfig {
    /// API base URL. Overridable for testing against a mock server.
    #[serde(default = "default_github_api_base")]
    pub api_base: String,

    /// Optional bearer token; raises the unauthenticated rate budget.
    #[serde(default)]
    pub token: Option<String>,

    /// Events page size per poll.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Remaining-budget floor below which language enrichment is skipped
    /// for the cycle. Ingestion itself is never skipped.
    #[serde(default = "default_enrichment_floor")]
    pub enrichment_floor: u32,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: default_github_api_base(),
            token: None,
            page_size: default_page_size(),
            enrichment_floor: default_enrichment_floor(),
        }
    }
}

fn default_github_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_enrichment_floor() -> u32 {
    500
}

/// Geocoding provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeocoderConfig {
    /// Search endpoint base URL (Nominatim-compatible).
    #[serde(default = "default_geocoder_endpoint")]
    pub endpoint: String,

    /// Identifying client tag sent as the User-Agent, required by the
    /// provider's usage policy.
    #[serde(default = "default_client_tag")]
    pub client_tag: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_geocoder_endpoint(),
            client_tag: default_client_tag(),
        }
    }
}

fn default_geocoder_endpoint() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_client_tag() -> String {
    "gitpulse".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("gitpulse").join("gitpulse.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "gitpulse.db".to_string())
}

/// Event poller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollerConfig {
    /// Whether the poller runs at all. Disabled yields a query-only node.
    #[serde(default = "default_poller_enabled")]
    pub enabled: bool,

    /// Seconds between poll cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            enabled: default_poller_enabled(),
            interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_poller_enabled() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    60
}

/// Commit retention configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    /// Rolling retention window for commits, in seconds.
    #[serde(default = "default_retention_window_secs")]
    pub window_secs: u64,

    /// Seconds between eviction sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Maximum rows deleted per eviction batch.
    #[serde(default = "default_evict_batch")]
    pub evict_batch: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            window_secs: default_retention_window_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            evict_batch: default_evict_batch(),
        }
    }
}

fn default_retention_window_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_evict_batch() -> usize {
    500
}

/// Stats recomputation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StatsConfig {
    /// Seconds between monthly/daily recompute cycles.
    #[serde(default = "default_stats_interval_secs")]
    pub interval_secs: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_stats_interval_secs(),
        }
    }
}

fn default_stats_interval_secs() -> u64 {
    600
}

/// Query engine limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
    /// Maximum commits returned by a spatial query.
    #[serde(default = "default_result_cap")]
    pub result_cap: usize,

    /// Maximum candidates pulled from the time-range scan before the
    /// spatial filter narrows them.
    #[serde(default = "default_scan_cap")]
    pub scan_cap: usize,

    /// Live-mode lookback window, in seconds.
    #[serde(default = "default_live_window_secs")]
    pub live_window_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            result_cap: default_result_cap(),
            scan_cap: default_scan_cap(),
            live_window_secs: default_live_window_secs(),
        }
    }
}

fn default_result_cap() -> usize {
    5000
}

fn default_scan_cap() -> usize {
    10_000
}

fn default_live_window_secs() -> u64 {
    300
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Whether the HTTP surface is served.
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8480
}
