// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as bounded page sizes and non-zero intervals.

use thiserror::Error;

use crate::model::GitpulseConfig;

/// A configuration error surfaced to the operator at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config sources failed to parse or merge.
    #[error("{message}")]
    Parse { message: String },

    /// A parsed value violates a semantic constraint.
    #[error("{message}")]
    Validation { message: String },
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or all collected validation
/// errors (does not fail fast).
pub fn validate_config(config: &GitpulseConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.github.page_size == 0 || config.github.page_size > 100 {
        errors.push(ConfigError::Validation {
            message: format!(
                "github.page_size must be between 1 and 100, got {}",
                config.github.page_size
            ),
        });
    }

    if config.poller.interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "poller.interval_secs must be greater than zero".to_string(),
        });
    }

    if config.retention.window_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "retention.window_secs must be greater than zero".to_string(),
        });
    }

    if config.retention.evict_batch == 0 {
        errors.push(ConfigError::Validation {
            message: "retention.evict_batch must be greater than zero".to_string(),
        });
    }

    if config.query.result_cap == 0 {
        errors.push(ConfigError::Validation {
            message: "query.result_cap must be greater than zero".to_string(),
        });
    }

    if config.query.scan_cap < config.query.result_cap {
        errors.push(ConfigError::Validation {
            message: format!(
                "query.scan_cap ({}) must not be smaller than query.result_cap ({})",
                config.query.scan_cap, config.query.result_cap
            ),
        });
    }

    if config.gateway.enabled && config.gateway.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    }

    let level = config.service.log_level.as_str();
    if !matches!(level, "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level must be one of trace/debug/info/warn/error, got `{level}`"
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
