// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serde types for the GitHub REST API responses the client consumes.
//!
//! Only the fields the pipeline reads are modeled; everything else in the
//! payloads is ignored.

use chrono::{DateTime, Utc};
use gitpulse_core::types::{FeedCommit, FeedEvent};
use serde::Deserialize;

/// One entry from `GET /events`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub actor: ApiActor,
    pub repo: ApiRepo,
    #[serde(default)]
    pub payload: ApiPayload,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiActor {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRepo {
    /// Full name in `owner/name` form.
    pub name: String,
}

/// Push payload fields. Non-push events deserialize into the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiPayload {
    /// Head commit SHA of the push.
    #[serde(default)]
    pub head: Option<String>,
    /// Commits carried in the payload; the feed truncates long pushes.
    #[serde(default)]
    pub commits: Vec<ApiPushCommit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPushCommit {
    pub sha: String,
    pub message: String,
}

/// Response of `GET /users/{username}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    #[serde(default)]
    pub location: Option<String>,
}

/// Response of `GET /repos/{owner}/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRepoDetails {
    #[serde(default)]
    pub language: Option<String>,
}

impl From<ApiEvent> for FeedEvent {
    fn from(event: ApiEvent) -> Self {
        FeedEvent {
            id: event.id,
            event_type: event.event_type,
            actor: event.actor.login,
            repository: event.repo.name,
            head: event.payload.head,
            commits: event
                .payload
                .commits
                .into_iter()
                .map(|c| FeedCommit {
                    sha: c.sha,
                    message: c.message,
                })
                .collect(),
            created_at_ms: event.created_at.timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_event_parses_and_converts() {
        let json = r#"{
            "id": "44123",
            "type": "PushEvent",
            "actor": {"id": 1, "login": "octocat", "url": "https://api.github.com/users/octocat"},
            "repo": {"id": 2, "name": "octocat/hello", "url": "https://api.github.com/repos/octocat/hello"},
            "payload": {
                "push_id": 9,
                "head": "deadbeef",
                "commits": [{"sha": "deadbeef", "message": "fix parser", "distinct": true}]
            },
            "created_at": "2026-08-06T12:00:00Z",
            "public": true
        }"#;
        let event: ApiEvent = serde_json::from_str(json).unwrap();
        let feed: FeedEvent = event.into();
        assert_eq!(feed.event_type, "PushEvent");
        assert_eq!(feed.actor, "octocat");
        assert_eq!(feed.repository, "octocat/hello");
        assert_eq!(feed.head.as_deref(), Some("deadbeef"));
        assert_eq!(feed.commits.len(), 1);
        assert_eq!(feed.created_at_ms, 1_786_017_600_000);
    }

    #[test]
    fn non_push_event_defaults_payload() {
        let json = r#"{
            "id": "44124",
            "type": "WatchEvent",
            "actor": {"login": "octocat"},
            "repo": {"name": "octocat/hello"},
            "payload": {"action": "started"},
            "created_at": "2026-08-06T12:00:00Z"
        }"#;
        let event: ApiEvent = serde_json::from_str(json).unwrap();
        assert!(event.payload.head.is_none());
        assert!(event.payload.commits.is_empty());
    }
}
