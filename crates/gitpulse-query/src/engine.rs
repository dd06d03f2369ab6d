// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live and windowed spatial queries, counts, and search.
//!
//! Both spatial modes pull candidates from a time-range scan capped at
//! `scan_cap`, then apply the bounding-box filter and stop at
//! `result_cap`. Scans run newest-first so the cap keeps the most recent
//! activity. Unlocated commits are ambient pulses: they appear only in
//! boxless queries and are excluded whenever a viewport is given.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gitpulse_core::types::{BoundingBox, Commit, LocationCacheEntry};
use gitpulse_core::PulseError;
use gitpulse_storage::queries::{commits, enrichment};
use gitpulse_storage::Database;
use tracing::debug;

/// Queries with a search term shorter than this return empty.
const MIN_SEARCH_CHARS: usize = 2;

/// Result rows returned by the search endpoints.
const SEARCH_LIMIT: usize = 20;

/// Scan and result caps for the spatial queries.
#[derive(Debug, Clone, Copy)]
pub struct QueryLimits {
    /// Maximum commits returned by a spatial query.
    pub result_cap: usize,
    /// Maximum candidates pulled from the time-range scan before the
    /// spatial filter narrows them.
    pub scan_cap: usize,
    /// Live-mode lookback window.
    pub live_window: Duration,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            result_cap: 5000,
            scan_cap: 10_000,
            live_window: Duration::from_secs(300),
        }
    }
}

/// Read-side query engine over the commit store.
pub struct QueryEngine {
    db: Arc<Database>,
    limits: QueryLimits,
}

impl QueryEngine {
    pub fn new(db: Arc<Database>, limits: QueryLimits) -> Self {
        Self { db, limits }
    }

    /// Commits from the last live window, optionally viewport-filtered.
    pub async fn live(&self, bbox: Option<BoundingBox>) -> Result<Vec<Commit>, PulseError> {
        self.live_at(Utc::now().timestamp_millis(), bbox).await
    }

    /// Live query against an explicit clock, for deterministic tests.
    pub async fn live_at(
        &self,
        now_ms: i64,
        bbox: Option<BoundingBox>,
    ) -> Result<Vec<Commit>, PulseError> {
        // Live mode is strictly-newer-than the cutoff.
        let cutoff = now_ms - self.limits.live_window.as_millis() as i64;
        self.windowed(cutoff + 1, i64::MAX, bbox).await
    }

    /// Commits with `start <= timestamp < end`, optionally
    /// viewport-filtered, newest first, capped.
    pub async fn windowed(
        &self,
        start: i64,
        end: i64,
        bbox: Option<BoundingBox>,
    ) -> Result<Vec<Commit>, PulseError> {
        let candidates = commits::range_by_time(
            &self.db,
            Some(start),
            Some(end),
            Some(self.limits.scan_cap),
            true,
        )
        .await?;
        let scanned = candidates.len();
        let results = filter_spatial(candidates, bbox, self.limits.result_cap);
        debug!(scanned, returned = results.len(), "windowed query complete");
        Ok(results)
    }

    /// Exact commit count for a time range. No spatial step, no result
    /// cap; pairs with the spatial queries for lightweight badges.
    pub async fn count(&self, start: Option<i64>, end: Option<i64>) -> Result<u64, PulseError> {
        commits::count_in_range(&self.db, start, end).await
    }

    /// Timestamp of the oldest retained commit.
    pub async fn oldest_timestamp(&self) -> Result<Option<i64>, PulseError> {
        commits::oldest_timestamp(&self.db).await
    }

    /// Author handles starting with `prefix`. Short or blank prefixes
    /// yield an empty result, not an error.
    pub async fn search_authors(&self, prefix: &str) -> Result<Vec<String>, PulseError> {
        let prefix = prefix.trim();
        if prefix.chars().count() < MIN_SEARCH_CHARS {
            return Ok(Vec::new());
        }
        commits::distinct_authors_with_prefix(&self.db, prefix, SEARCH_LIMIT).await
    }

    /// Cached locations whose text contains `text`.
    pub async fn search_locations(
        &self,
        text: &str,
    ) -> Result<Vec<LocationCacheEntry>, PulseError> {
        let text = text.trim();
        if text.chars().count() < MIN_SEARCH_CHARS {
            return Ok(Vec::new());
        }
        enrichment::search_locations(&self.db, text, SEARCH_LIMIT).await
    }

    /// Distinct authors of located commits inside the viewport, sorted.
    pub async fn authors_in_region(&self, bbox: BoundingBox) -> Result<Vec<String>, PulseError> {
        let candidates = commits::range_by_time(
            &self.db,
            None,
            None,
            Some(self.limits.scan_cap),
            true,
        )
        .await?;

        let authors: BTreeSet<String> = candidates
            .into_iter()
            .filter(|c| c.coordinates.is_some_and(|p| bbox.contains(p)))
            .map(|c| c.author)
            .collect();
        Ok(authors.into_iter().collect())
    }
}

/// Apply the viewport filter per candidate, short-circuiting at `cap`.
fn filter_spatial(candidates: Vec<Commit>, bbox: Option<BoundingBox>, cap: usize) -> Vec<Commit> {
    let mut results = Vec::new();
    for commit in candidates {
        let keep = match (&bbox, commit.coordinates) {
            // No viewport: everything, including ambient unlocated pulses.
            (None, _) => true,
            // A viewport excludes anything it cannot place.
            (Some(_), None) => false,
            (Some(bbox), Some(point)) => bbox.contains(point),
        };
        if keep {
            results.push(commit);
            if results.len() >= cap {
                break;
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitpulse_core::types::GeoPoint;
    use tempfile::tempdir;

    const MINUTE_MS: i64 = 60_000;
    const NOW_MS: i64 = 1_700_000_000_000;

    fn make_commit(id: &str, timestamp: i64, coords: Option<GeoPoint>) -> Commit {
        Commit {
            id: id.to_string(),
            author: format!("author-{id}"),
            author_url: format!("https://github.com/author-{id}"),
            message: "update".to_string(),
            repository: format!("author-{id}/repo"),
            timestamp,
            coordinates: coords,
            language: None,
        }
    }

    async fn engine_with(
        limits: QueryLimits,
        seed: Vec<Commit>,
    ) -> (QueryEngine, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Arc::new(
            Database::open(dir.path().join("query.db").to_str().unwrap())
                .await
                .unwrap(),
        );
        commits::insert_batch(&db, seed).await.unwrap();
        (QueryEngine::new(db, limits), dir)
    }

    #[tokio::test]
    async fn live_window_is_strictly_newer_than_cutoff() {
        let (engine, _dir) = engine_with(
            QueryLimits::default(),
            vec![
                make_commit("at-cutoff", NOW_MS - 5 * MINUTE_MS, None),
                make_commit("inside", NOW_MS - 4 * MINUTE_MS, None),
                make_commit("ancient", NOW_MS - 30 * MINUTE_MS, None),
            ],
        )
        .await;

        let live = engine.live_at(NOW_MS, None).await.unwrap();
        let ids: Vec<_> = live.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["inside"]);
    }

    #[tokio::test]
    async fn unlocated_included_only_without_viewport() {
        let (engine, _dir) = engine_with(
            QueryLimits::default(),
            vec![
                make_commit("located", NOW_MS - MINUTE_MS, Some(GeoPoint::new(52.5, 13.4))),
                make_commit("ambient", NOW_MS - MINUTE_MS, None),
            ],
        )
        .await;

        let boxless = engine.live_at(NOW_MS, None).await.unwrap();
        assert_eq!(boxless.len(), 2);

        let whole_world = BoundingBox::new(-90.0, 90.0, -180.0, 180.0);
        let boxed = engine.live_at(NOW_MS, Some(whole_world)).await.unwrap();
        let ids: Vec<_> = boxed.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["located"]);
    }

    #[tokio::test]
    async fn viewport_crossing_dateline_matches_both_arcs() {
        let (engine, _dir) = engine_with(
            QueryLimits::default(),
            vec![
                make_commit("fiji", NOW_MS, Some(GeoPoint::new(-17.7, 175.0))),
                make_commit("samoa", NOW_MS, Some(GeoPoint::new(-13.8, -175.0))),
                make_commit("london", NOW_MS, Some(GeoPoint::new(51.5, 0.0))),
            ],
        )
        .await;

        let pacific = BoundingBox::new(-60.0, 60.0, 170.0, -170.0);
        let hits = engine
            .windowed(NOW_MS - 1, NOW_MS + 1, Some(pacific))
            .await
            .unwrap();
        let mut ids: Vec<_> = hits.iter().map(|c| c.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["fiji", "samoa"]);
    }

    #[tokio::test]
    async fn result_cap_short_circuits() {
        let seed = (0..10)
            .map(|i| make_commit(&format!("c{i}"), NOW_MS - i, Some(GeoPoint::new(0.0, 0.0))))
            .collect();
        let limits = QueryLimits {
            result_cap: 3,
            scan_cap: 100,
            ..QueryLimits::default()
        };
        let (engine, _dir) = engine_with(limits, seed).await;

        let hits = engine.windowed(0, i64::MAX, None).await.unwrap();
        assert_eq!(hits.len(), 3);
        // Newest-first scan means the cap keeps the most recent commits.
        assert_eq!(hits[0].id, "c0");
    }

    #[tokio::test]
    async fn scan_cap_bounds_candidates_before_filtering() {
        let mut seed: Vec<Commit> = (0..8)
            .map(|i| make_commit(&format!("far{i}"), NOW_MS - i, Some(GeoPoint::new(60.0, 60.0))))
            .collect();
        // The only in-viewport commit is the oldest, beyond the scan cap.
        seed.push(make_commit("old-hit", NOW_MS - 100, Some(GeoPoint::new(0.0, 0.0))));
        let limits = QueryLimits {
            result_cap: 5,
            scan_cap: 5,
            ..QueryLimits::default()
        };
        let (engine, _dir) = engine_with(limits, seed).await;

        let near_origin = BoundingBox::new(-1.0, 1.0, -1.0, 1.0);
        let hits = engine.windowed(0, i64::MAX, Some(near_origin)).await.unwrap();
        assert!(hits.is_empty(), "scan cap hides candidates past the horizon");
    }

    #[tokio::test]
    async fn count_is_at_least_any_boxed_result() {
        let (engine, _dir) = engine_with(
            QueryLimits::default(),
            vec![
                make_commit("a", NOW_MS, Some(GeoPoint::new(52.0, 13.0))),
                make_commit("b", NOW_MS, Some(GeoPoint::new(-33.0, 151.0))),
                make_commit("c", NOW_MS, None),
            ],
        )
        .await;

        let count = engine.count(Some(0), Some(i64::MAX)).await.unwrap();
        let europe = BoundingBox::new(35.0, 70.0, -10.0, 40.0);
        let boxed = engine
            .windowed(0, i64::MAX, Some(europe))
            .await
            .unwrap();
        assert!(count >= boxed.len() as u64);
        assert_eq!(count, 3);
        assert_eq!(boxed.len(), 1);
    }

    #[tokio::test]
    async fn author_search_enforces_minimum_length() {
        let (engine, _dir) = engine_with(
            QueryLimits::default(),
            vec![make_commit("a", NOW_MS, None)],
        )
        .await;

        assert!(engine.search_authors("a").await.unwrap().is_empty());
        assert!(engine.search_authors("  ").await.unwrap().is_empty());
        let hits = engine.search_authors("author").await.unwrap();
        assert_eq!(hits, vec!["author-a".to_string()]);
    }

    #[tokio::test]
    async fn authors_in_region_deduplicates_and_sorts() {
        let mut seed = vec![
            make_commit("a1", NOW_MS, Some(GeoPoint::new(52.0, 13.0))),
            make_commit("a2", NOW_MS - 1, Some(GeoPoint::new(52.1, 13.1))),
            make_commit("b", NOW_MS, Some(GeoPoint::new(-33.0, 151.0))),
            make_commit("ambient", NOW_MS, None),
        ];
        // Same author committing twice inside the viewport.
        seed[1].author = "author-a1".to_string();
        let (engine, _dir) = engine_with(QueryLimits::default(), seed).await;

        let europe = BoundingBox::new(35.0, 70.0, -10.0, 40.0);
        let authors = engine.authors_in_region(europe).await.unwrap();
        assert_eq!(authors, vec!["author-a1".to_string()]);
    }

    #[tokio::test]
    async fn oldest_timestamp_reflects_store() {
        let (engine, _dir) = engine_with(
            QueryLimits::default(),
            vec![
                make_commit("new", NOW_MS, None),
                make_commit("old", NOW_MS - 999, None),
            ],
        )
        .await;
        assert_eq!(engine.oldest_timestamp().await.unwrap(), Some(NOW_MS - 999));
    }
}
