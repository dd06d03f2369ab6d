// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the GitHub REST API.
//!
//! Provides [`GithubClient`] which handles request construction,
//! authentication, the rate-budget signal, and mapping rate-limit
//! responses onto [`PulseError::RateLimited`].

use std::time::Duration;

use async_trait::async_trait;
use gitpulse_core::types::{FeedEvent, FeedPage};
use gitpulse_core::{EventFeed, ProfileSource, PulseError, RepoMetadata};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::types::{ApiEvent, ApiRepoDetails, ApiUser};

/// Remaining-budget response header on every GitHub API reply.
const RATE_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Per-request timeout; external calls must never block a poll cycle.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for GitHub API communication.
///
/// Covers the three calls the pipeline makes: the public events page,
/// user profile lookup, and repository metadata lookup. An optional
/// bearer token raises the unauthenticated rate budget.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    api_base: String,
    page_size: u32,
}

impl GithubClient {
    /// Creates a new GitHub API client.
    ///
    /// # Arguments
    /// * `api_base` - API base URL (overridable for tests)
    /// * `token` - optional bearer token
    /// * `page_size` - events page size, 1..=100
    pub fn new(api_base: String, token: Option<String>, page_size: u32) -> Result<Self, PulseError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "accept",
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("user-agent", HeaderValue::from_static("gitpulse"));
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );
        if let Some(token) = token {
            headers.insert(
                "authorization",
                HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                    PulseError::Config(format!("invalid github token header value: {e}"))
                })?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PulseError::Upstream {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            page_size,
        })
    }

    /// Fetch the latest page of public events with the rate-budget signal.
    pub async fn events_page(&self) -> Result<FeedPage, PulseError> {
        let url = format!("{}/events?per_page={}", self.api_base, self.page_size);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PulseError::Upstream {
                message: format!("events fetch failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            warn!(status = %status, "events fetch refused for rate-budget reasons");
            return Err(PulseError::RateLimited);
        }

        let rate_remaining = response
            .headers()
            .get(RATE_REMAINING_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PulseError::Upstream {
                message: format!("events fetch returned {status}: {body}"),
                source: None,
            });
        }

        let events: Vec<ApiEvent> =
            response.json().await.map_err(|e| PulseError::Upstream {
                message: format!("failed to parse events page: {e}"),
                source: Some(Box::new(e)),
            })?;

        debug!(
            count = events.len(),
            rate_remaining, "events page received"
        );
        Ok(FeedPage {
            events: events.into_iter().map(FeedEvent::from).collect(),
            rate_remaining,
        })
    }

    /// Look up a user's free-text profile location. Unknown users and
    /// blank locations both yield `None`.
    pub async fn user_location(&self, username: &str) -> Result<Option<String>, PulseError> {
        let url = format!("{}/users/{username}", self.api_base);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PulseError::Upstream {
                message: format!("profile fetch failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(PulseError::Upstream {
                message: format!("profile fetch for {username} returned {status}"),
                source: None,
            });
        }

        let user: ApiUser = response.json().await.map_err(|e| PulseError::Upstream {
            message: format!("failed to parse profile for {username}: {e}"),
            source: Some(Box::new(e)),
        })?;

        Ok(user
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty()))
    }

    /// Look up a repository's primary language. Missing or blocked
    /// repositories yield `None`.
    pub async fn repo_language(&self, repository: &str) -> Result<Option<String>, PulseError> {
        let url = format!("{}/repos/{repository}", self.api_base);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PulseError::Upstream {
                message: format!("repository fetch failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(PulseError::Upstream {
                message: format!("repository fetch for {repository} returned {status}"),
                source: None,
            });
        }

        let details: ApiRepoDetails =
            response.json().await.map_err(|e| PulseError::Upstream {
                message: format!("failed to parse repository {repository}: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(details.language)
    }
}

#[async_trait]
impl EventFeed for GithubClient {
    async fn latest_events(&self) -> Result<FeedPage, PulseError> {
        self.events_page().await
    }
}

#[async_trait]
impl ProfileSource for GithubClient {
    async fn location_text(&self, username: &str) -> Result<Option<String>, PulseError> {
        self.user_location(username).await
    }
}

#[async_trait]
impl RepoMetadata for GithubClient {
    async fn primary_language(&self, repository: &str) -> Result<Option<String>, PulseError> {
        self.repo_language(repository).await
    }
}
