// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source traits decoupling the poller from concrete upstream clients.
//!
//! The poller works entirely against these traits; the `gitpulse-github`
//! and `gitpulse-geocode` crates provide the production implementations,
//! and tests substitute in-memory doubles.

use async_trait::async_trait;

use crate::error::PulseError;
use crate::types::{FeedPage, GeoPoint};

/// The upstream public-event feed.
#[async_trait]
pub trait EventFeed: Send + Sync {
    /// Fetch the latest page of public events along with the remaining
    /// rate-budget signal.
    ///
    /// Returns [`PulseError::RateLimited`] when the feed refuses the
    /// request for budget reasons; callers treat that as a clean abort.
    async fn latest_events(&self) -> Result<FeedPage, PulseError>;
}

/// User profile lookup yielding an optional free-text location string.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn location_text(&self, username: &str) -> Result<Option<String>, PulseError>;
}

/// Free-text geocoding, first result only.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, PulseError>;
}

/// Repository metadata lookup yielding an optional primary language.
#[async_trait]
pub trait RepoMetadata: Send + Sync {
    async fn primary_language(&self, repository: &str) -> Result<Option<String>, PulseError>;
}
