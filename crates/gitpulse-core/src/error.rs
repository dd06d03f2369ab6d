// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Gitpulse pipeline.

use thiserror::Error;

/// The primary error type used across all Gitpulse crates.
#[derive(Debug, Error)]
pub enum PulseError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Upstream provider errors (event feed, profile lookup, geocoding).
    #[error("upstream error: {message}")]
    Upstream {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The upstream feed refused the request because the rate budget is spent.
    ///
    /// A poll cycle that sees this aborts cleanly and reports it in the
    /// structured poll outcome; the next scheduled tick retries.
    #[error("upstream rate limit exhausted")]
    RateLimited,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
