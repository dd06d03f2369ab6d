// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The event poller: one bounded batch job per tick.
//!
//! Each cycle fetches one page of public events, keeps the push events,
//! enriches them through the cache under the rate budget, and batch
//! inserts with insert-if-absent semantics — which is what makes
//! re-polling overlapping event windows idempotent. A cycle never throws:
//! every failure mode folds into the structured [`PollOutcome`], and
//! retry is simply the next scheduled tick.

use std::sync::Arc;

use gitpulse_core::types::{Commit, FeedEvent, GeoPoint, PollOutcome};
use gitpulse_core::{EventFeed, Geocoder, ProfileSource, PulseError, RepoMetadata};
use gitpulse_storage::queries::commits;
use gitpulse_storage::Database;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::enrich::{EnrichmentCache, LanguageLookup};

/// Commit messages are truncated to this many characters at ingestion.
pub const MESSAGE_MAX_CHARS: usize = 200;

/// Stand-in when a push payload carries no matching commit message.
const DEFAULT_MESSAGE: &str = "New commit";

const PUSH_EVENT: &str = "PushEvent";

/// Polls the upstream feed and feeds the commit store.
pub struct EventPoller {
    db: Arc<Database>,
    cache: Arc<EnrichmentCache>,
    feed: Arc<dyn EventFeed>,
    profiles: Arc<dyn ProfileSource>,
    geocoder: Arc<dyn Geocoder>,
    repos: Arc<dyn RepoMetadata>,
    /// Remaining-budget floor below which language enrichment is skipped
    /// for the whole cycle.
    enrichment_floor: u32,
    live_tx: broadcast::Sender<Commit>,
}

impl EventPoller {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Arc<Database>,
        cache: Arc<EnrichmentCache>,
        feed: Arc<dyn EventFeed>,
        profiles: Arc<dyn ProfileSource>,
        geocoder: Arc<dyn Geocoder>,
        repos: Arc<dyn RepoMetadata>,
        enrichment_floor: u32,
        live_tx: broadcast::Sender<Commit>,
    ) -> Self {
        Self {
            db,
            cache,
            feed,
            profiles,
            geocoder,
            repos,
            enrichment_floor,
            live_tx,
        }
    }

    /// Run one poll cycle.
    ///
    /// A rate-limited feed fetch aborts cleanly with `rate_limited = true`
    /// and zero side effects; any other fetch failure is logged and yields
    /// a zero outcome. Per-event enrichment errors degrade that event's
    /// metadata only.
    pub async fn poll(&self) -> PollOutcome {
        let page = match self.feed.latest_events().await {
            Ok(page) => page,
            Err(PulseError::RateLimited) => {
                warn!("poll cycle aborted: feed rate limited");
                return PollOutcome {
                    rate_limited: true,
                    ..Default::default()
                };
            }
            Err(e) => {
                warn!(error = %e, "poll cycle aborted: feed fetch failed");
                return PollOutcome::default();
            }
        };

        // When the budget runs low, language enrichment is skipped for the
        // whole cycle to preserve budget for the next poll. Ingestion and
        // cache-only location lookups still proceed. A feed that reports
        // no budget signal is treated as unconstrained.
        let should_enrich = page
            .rate_remaining
            .map(|remaining| remaining > self.enrichment_floor)
            .unwrap_or(true);
        if !should_enrich {
            info!(
                remaining = page.rate_remaining,
                floor = self.enrichment_floor,
                "rate budget low: skipping language enrichment this cycle"
            );
        }

        let mut batch: Vec<Commit> = Vec::new();
        let mut processed = 0usize;

        for event in &page.events {
            if event.event_type != PUSH_EVENT {
                continue;
            }
            processed += 1;

            let Some(commit) = self.build_commit(event, should_enrich).await else {
                continue;
            };
            batch.push(commit);
        }

        let inserted_ids = match commits::insert_batch(&self.db, batch.clone()).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "poll cycle aborted: batch insert failed");
                return PollOutcome {
                    processed,
                    ..Default::default()
                };
            }
        };

        // Publish only what this cycle actually stored; duplicates are
        // never re-announced to live consumers.
        for commit in &batch {
            if inserted_ids.contains(&commit.id) {
                let _ = self.live_tx.send(commit.clone());
            }
        }

        info!(
            stored = inserted_ids.len(),
            processed,
            page = page.events.len(),
            "poll cycle complete"
        );
        PollOutcome {
            stored: inserted_ids.len(),
            processed,
            rate_limited: false,
        }
    }

    /// Construct an enriched commit from one push event, or `None` when
    /// the payload carries no head SHA to deduplicate on.
    async fn build_commit(&self, event: &FeedEvent, should_enrich: bool) -> Option<Commit> {
        let head = event.head.clone()?;

        let message = event
            .commits
            .iter()
            .find(|c| c.sha == head)
            .map(|c| c.message.chars().take(MESSAGE_MAX_CHARS).collect())
            .unwrap_or_else(|| DEFAULT_MESSAGE.to_string());

        // An unresolvable location is an unlocated pulse, not an error.
        let coordinates = match self.resolve_location(&event.actor).await {
            Ok(point) => point,
            Err(e) => {
                debug!(actor = %event.actor, error = %e, "location enrichment degraded");
                None
            }
        };

        let language = if should_enrich {
            match self.resolve_language(&event.repository).await {
                Ok(language) => language,
                Err(e) => {
                    debug!(
                        repository = %event.repository,
                        error = %e,
                        "language enrichment degraded"
                    );
                    None
                }
            }
        } else {
            None
        };

        Some(Commit {
            id: head,
            author: event.actor.clone(),
            author_url: format!("https://github.com/{}", event.actor),
            message,
            repository: event.repository.clone(),
            timestamp: event.created_at_ms,
            coordinates,
            language,
        })
    }

    /// Cache lookup, then profile lookup, then geocode, with write-through
    /// on success. Only successful geocodes are cached.
    async fn resolve_location(&self, username: &str) -> Result<Option<GeoPoint>, PulseError> {
        if let Some(point) = self.cache.location(username).await? {
            return Ok(Some(point));
        }

        let Some(location_text) = self.profiles.location_text(username).await? else {
            return Ok(None);
        };

        let Some(point) = self.geocoder.geocode(&location_text).await? else {
            debug!(username, location_text, "location did not geocode");
            return Ok(None);
        };

        self.cache
            .store_location(username, &location_text, point)
            .await?;
        Ok(Some(point))
    }

    /// Cache lookup, then repository metadata lookup, with write-through
    /// of both positive and negative results.
    async fn resolve_language(&self, repository: &str) -> Result<Option<String>, PulseError> {
        if let LanguageLookup::Hit(language) = self.cache.language(repository).await? {
            return Ok(language);
        }

        let language = self.repos.primary_language(repository).await?;
        self.cache
            .store_language(repository, language.clone())
            .await?;
        Ok(language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use gitpulse_core::types::{FeedCommit, FeedPage};
    use tempfile::tempdir;

    struct StaticFeed {
        pages: Mutex<Vec<Result<FeedPage, PulseError>>>,
    }

    impl StaticFeed {
        fn new(result: Result<FeedPage, PulseError>) -> Self {
            Self {
                pages: Mutex::new(vec![result]),
            }
        }

        fn repeating(page: FeedPage) -> Self {
            Self {
                pages: Mutex::new(vec![Ok(page.clone()), Ok(page)]),
            }
        }
    }

    #[async_trait]
    impl EventFeed for StaticFeed {
        async fn latest_events(&self) -> Result<FeedPage, PulseError> {
            self.pages.lock().unwrap().remove(0)
        }
    }

    #[derive(Default)]
    struct StaticProfiles {
        locations: HashMap<String, String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProfileSource for StaticProfiles {
        async fn location_text(&self, username: &str) -> Result<Option<String>, PulseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.locations.get(username).cloned())
        }
    }

    #[derive(Default)]
    struct StaticGeocoder {
        points: HashMap<String, GeoPoint>,
        fail: bool,
    }

    #[async_trait]
    impl Geocoder for StaticGeocoder {
        async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, PulseError> {
            if self.fail {
                return Err(PulseError::Upstream {
                    message: "geocoder down".into(),
                    source: None,
                });
            }
            Ok(self.points.get(query).copied())
        }
    }

    #[derive(Default)]
    struct StaticRepos {
        languages: HashMap<String, String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RepoMetadata for StaticRepos {
        async fn primary_language(&self, repository: &str) -> Result<Option<String>, PulseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.languages.get(repository).cloned())
        }
    }

    fn push_event(id: &str, head: &str, actor: &str, repo: &str, message: &str) -> FeedEvent {
        FeedEvent {
            id: id.to_string(),
            event_type: PUSH_EVENT.to_string(),
            actor: actor.to_string(),
            repository: repo.to_string(),
            head: Some(head.to_string()),
            commits: vec![FeedCommit {
                sha: head.to_string(),
                message: message.to_string(),
            }],
            created_at_ms: 1_700_000_000_000,
        }
    }

    struct Harness {
        poller: EventPoller,
        db: Arc<Database>,
        rx: broadcast::Receiver<Commit>,
        _dir: tempfile::TempDir,
    }

    async fn harness(
        feed: StaticFeed,
        profiles: StaticProfiles,
        geocoder: StaticGeocoder,
        repos: StaticRepos,
    ) -> Harness {
        let dir = tempdir().unwrap();
        let db = Arc::new(
            Database::open(dir.path().join("poller.db").to_str().unwrap())
                .await
                .unwrap(),
        );
        let (live_tx, rx) = broadcast::channel(64);
        let poller = EventPoller::new(
            db.clone(),
            Arc::new(EnrichmentCache::new(db.clone())),
            Arc::new(feed),
            Arc::new(profiles),
            Arc::new(geocoder),
            Arc::new(repos),
            500,
            live_tx,
        );
        Harness {
            poller,
            db,
            rx,
            _dir: dir,
        }
    }

    fn berlin_profiles() -> StaticProfiles {
        StaticProfiles {
            locations: HashMap::from([("alice".to_string(), "Berlin".to_string())]),
            calls: AtomicUsize::new(0),
        }
    }

    fn berlin_geocoder() -> StaticGeocoder {
        StaticGeocoder {
            points: HashMap::from([("Berlin".to_string(), GeoPoint::new(52.5, 13.4))]),
            fail: false,
        }
    }

    fn rust_repos(repo: &str) -> StaticRepos {
        StaticRepos {
            languages: HashMap::from([(repo.to_string(), "Rust".to_string())]),
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn stores_new_commits_and_skips_known_ids() {
        let page = FeedPage {
            events: vec![
                push_event("1", "sha-a", "alice", "alice/one", "first"),
                push_event("2", "sha-b", "bob", "bob/two", "second"),
                push_event("3", "sha-known", "carol", "carol/three", "third"),
            ],
            rate_remaining: Some(4000),
        };
        let mut h = harness(
            StaticFeed::new(Ok(page)),
            berlin_profiles(),
            berlin_geocoder(),
            rust_repos("alice/one"),
        )
        .await;

        // Pre-store the duplicate id.
        commits::insert_if_absent(
            &h.db,
            &Commit {
                id: "sha-known".into(),
                author: "carol".into(),
                author_url: "https://github.com/carol".into(),
                message: "third".into(),
                repository: "carol/three".into(),
                timestamp: 1,
                coordinates: None,
                language: None,
            },
        )
        .await
        .unwrap();

        let outcome = h.poller.poll().await;
        assert_eq!(outcome.processed, 3);
        assert_eq!(outcome.stored, 2);
        assert!(!outcome.rate_limited);

        // Located actor carries coordinates; unknown actors stay unlocated.
        let stored = commits::by_author(&h.db, "alice", None).await.unwrap();
        assert_eq!(stored[0].coordinates, Some(GeoPoint::new(52.5, 13.4)));
        assert_eq!(stored[0].language.as_deref(), Some("Rust"));
        let stored = commits::by_author(&h.db, "bob", None).await.unwrap();
        assert_eq!(stored[0].coordinates, None);

        // The live feed sees exactly the two new commits.
        let first = h.rx.recv().await.unwrap();
        let second = h.rx.recv().await.unwrap();
        let mut ids = vec![first.id, second.id];
        ids.sort();
        assert_eq!(ids, vec!["sha-a".to_string(), "sha-b".to_string()]);
        assert!(h.rx.try_recv().is_err(), "duplicate must not be published");
    }

    #[tokio::test]
    async fn rate_limited_fetch_aborts_with_zero_side_effects() {
        let h = harness(
            StaticFeed::new(Err(PulseError::RateLimited)),
            StaticProfiles::default(),
            StaticGeocoder::default(),
            StaticRepos::default(),
        )
        .await;

        let outcome = h.poller.poll().await;
        assert!(outcome.rate_limited);
        assert_eq!(outcome.stored, 0);
        assert_eq!(outcome.processed, 0);
        assert_eq!(commits::count_in_range(&h.db, None, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn other_fetch_failure_yields_zero_outcome() {
        let h = harness(
            StaticFeed::new(Err(PulseError::Upstream {
                message: "boom".into(),
                source: None,
            })),
            StaticProfiles::default(),
            StaticGeocoder::default(),
            StaticRepos::default(),
        )
        .await;

        let outcome = h.poller.poll().await;
        assert_eq!(outcome, PollOutcome::default());
    }

    #[tokio::test]
    async fn low_budget_skips_language_but_not_ingestion() {
        let page = FeedPage {
            events: vec![push_event("1", "sha-a", "alice", "alice/one", "msg")],
            rate_remaining: Some(120),
        };
        let h = harness(
            StaticFeed::new(Ok(page)),
            berlin_profiles(),
            berlin_geocoder(),
            rust_repos("alice/one"),
        )
        .await;

        let outcome = h.poller.poll().await;
        assert_eq!(outcome.stored, 1);

        let stored = commits::by_author(&h.db, "alice", None).await.unwrap();
        assert_eq!(stored[0].language, None, "language enrichment skipped");
        assert_eq!(
            stored[0].coordinates,
            Some(GeoPoint::new(52.5, 13.4)),
            "location enrichment still runs"
        );
    }

    #[tokio::test]
    async fn non_push_events_are_filtered_out() {
        let mut watch = push_event("9", "sha-w", "dave", "dave/x", "msg");
        watch.event_type = "WatchEvent".to_string();
        let page = FeedPage {
            events: vec![watch, push_event("1", "sha-a", "alice", "alice/one", "msg")],
            rate_remaining: Some(4000),
        };
        let h = harness(
            StaticFeed::new(Ok(page)),
            StaticProfiles::default(),
            StaticGeocoder::default(),
            StaticRepos::default(),
        )
        .await;

        let outcome = h.poller.poll().await;
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.stored, 1);
    }

    #[tokio::test]
    async fn geocoder_failure_degrades_to_unlocated() {
        let page = FeedPage {
            events: vec![push_event("1", "sha-a", "alice", "alice/one", "msg")],
            rate_remaining: Some(4000),
        };
        let geocoder = StaticGeocoder {
            points: HashMap::new(),
            fail: true,
        };
        let h = harness(
            StaticFeed::new(Ok(page)),
            berlin_profiles(),
            geocoder,
            StaticRepos::default(),
        )
        .await;

        let outcome = h.poller.poll().await;
        assert_eq!(outcome.stored, 1, "the event is stored anyway");
        let stored = commits::by_author(&h.db, "alice", None).await.unwrap();
        assert_eq!(stored[0].coordinates, None);
    }

    #[tokio::test]
    async fn negative_language_result_is_not_re_resolved() {
        let page = FeedPage {
            events: vec![push_event("1", "sha-a", "alice", "alice/one", "msg")],
            rate_remaining: Some(4000),
        };
        let mut second_page = page.clone();
        second_page.events[0].head = Some("sha-b".to_string());
        let repos = StaticRepos::default(); // knows no languages

        let dir = tempdir().unwrap();
        let db = Arc::new(
            Database::open(dir.path().join("neg.db").to_str().unwrap())
                .await
                .unwrap(),
        );
        let (live_tx, _rx) = broadcast::channel(64);
        let repos = Arc::new(repos);
        let poller = EventPoller::new(
            db.clone(),
            Arc::new(EnrichmentCache::new(db.clone())),
            Arc::new(StaticFeed {
                pages: Mutex::new(vec![Ok(page), Ok(second_page)]),
            }),
            Arc::new(StaticProfiles::default()),
            Arc::new(StaticGeocoder::default()),
            repos.clone(),
            500,
            live_tx,
        );

        poller.poll().await;
        assert_eq!(repos.calls.load(Ordering::SeqCst), 1);
        poller.poll().await;
        assert_eq!(
            repos.calls.load(Ordering::SeqCst),
            1,
            "cached negative suppresses the second lookup"
        );
    }

    #[tokio::test]
    async fn message_truncated_and_defaulted() {
        let long_message = "x".repeat(500);
        let mut with_message = push_event("1", "sha-a", "alice", "alice/one", &long_message);
        with_message.commits[0].message = long_message;
        let mut without_message = push_event("2", "sha-b", "bob", "bob/two", "unused");
        without_message.commits.clear();

        let page = FeedPage {
            events: vec![with_message, without_message],
            rate_remaining: Some(4000),
        };
        let h = harness(
            StaticFeed::new(Ok(page)),
            StaticProfiles::default(),
            StaticGeocoder::default(),
            StaticRepos::default(),
        )
        .await;
        h.poller.poll().await;

        let alice = commits::by_author(&h.db, "alice", None).await.unwrap();
        assert_eq!(alice[0].message.chars().count(), MESSAGE_MAX_CHARS);
        let bob = commits::by_author(&h.db, "bob", None).await.unwrap();
        assert_eq!(bob[0].message, DEFAULT_MESSAGE);
    }

    #[tokio::test]
    async fn repolling_the_same_window_stores_nothing() {
        let page = FeedPage {
            events: vec![push_event("1", "sha-a", "alice", "alice/one", "msg")],
            rate_remaining: Some(4000),
        };
        let h = harness(
            StaticFeed::repeating(page),
            StaticProfiles::default(),
            StaticGeocoder::default(),
            StaticRepos::default(),
        )
        .await;

        assert_eq!(h.poller.poll().await.stored, 1);
        let second = h.poller.poll().await;
        assert_eq!(second.processed, 1);
        assert_eq!(second.stored, 0);
    }
}
