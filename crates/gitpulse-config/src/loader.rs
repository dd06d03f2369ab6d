// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./gitpulse.toml` > `~/.config/gitpulse/gitpulse.toml`
//! > `/etc/gitpulse/gitpulse.toml` with environment variable overrides via
//! `GITPULSE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::GitpulseConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/gitpulse/gitpulse.toml` (system-wide)
/// 3. `~/.config/gitpulse/gitpulse.toml` (user XDG config)
/// 4. `./gitpulse.toml` (local directory)
/// 5. `GITPULSE_*` environment variables
pub fn load_config() -> Result<GitpulseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GitpulseConfig::default()))
        .merge(Toml::file("/etc/gitpulse/gitpulse.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("gitpulse/gitpulse.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("gitpulse.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<GitpulseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GitpulseConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<GitpulseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GitpulseConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `GITPULSE_STORAGE_DATABASE_PATH` must
/// map to `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("GITPULSE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: GITPULSE_GITHUB_ENRICHMENT_FLOOR -> "github_enrichment_floor"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("github_", "github.", 1)
            .replacen("geocoder_", "geocoder.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("poller_", "poller.", 1)
            .replacen("retention_", "retention.", 1)
            .replacen("stats_", "stats.", 1)
            .replacen("query_", "query.", 1)
            .replacen("gateway_", "gateway.", 1);
        mapped.into()
    })
}
