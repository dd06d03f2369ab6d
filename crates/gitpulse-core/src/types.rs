// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the Gitpulse pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A geographic coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// An ingested, enriched push event.
///
/// Immutable once stored: enrichment happens before insertion, and the
/// retention sweeper is the only deletion path. `id` is the upstream head
/// commit SHA and deduplicates re-polled event windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Upstream head commit SHA; unique across the store.
    pub id: String,
    /// Author handle.
    pub author: String,
    /// Public profile URL for the author.
    pub author_url: String,
    /// Commit message, truncated at ingestion.
    pub message: String,
    /// Repository in `owner/name` form.
    pub repository: String,
    /// Epoch milliseconds; the authoritative ordering key.
    pub timestamp: i64,
    /// `None` means unlocated. On the wire this is an array of exactly
    /// zero or two floats, never one.
    #[serde(with = "coord_array")]
    pub coordinates: Option<GeoPoint>,
    /// `None` means not yet enriched or unknown.
    pub language: Option<String>,
}

/// Serde adapter keeping the wire shape of `coordinates` as `[]` or
/// `[lat, lng]` for the visualization client.
pub mod coord_array {
    use serde::de::Error as _;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::GeoPoint;

    pub fn serialize<S>(value: &Option<GeoPoint>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(p) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(&p.lat)?;
                seq.serialize_element(&p.lng)?;
                seq.end()
            }
            None => serializer.serialize_seq(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<GeoPoint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Vec::<f64>::deserialize(deserializer)?;
        match values.as_slice() {
            [] => Ok(None),
            [lat, lng] => Ok(Some(GeoPoint::new(*lat, *lng))),
            other => Err(D::Error::custom(format!(
                "coordinates must hold zero or two floats, got {}",
                other.len()
            ))),
        }
    }
}

/// A map viewport used to filter located commits.
///
/// A box whose `min_lng` exceeds `max_lng` crosses the antimeridian and
/// matches both remaining arcs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    /// Whether the point falls inside the box.
    pub fn contains(&self, point: GeoPoint) -> bool {
        if point.lat < self.min_lat || point.lat > self.max_lat {
            return false;
        }
        if self.min_lng <= self.max_lng {
            // Box does not cross the dateline.
            point.lng >= self.min_lng && point.lng <= self.max_lng
        } else {
            // Box crosses the dateline: the point matches either arc.
            point.lng >= self.min_lng || point.lng <= self.max_lng
        }
    }
}

/// A single commit reference inside an upstream push payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedCommit {
    pub sha: String,
    pub message: String,
}

/// One event from the upstream public feed, reduced to the fields the
/// poller consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEvent {
    /// Upstream event id (distinct from the head commit SHA).
    pub id: String,
    /// Upstream event type, e.g. `PushEvent`.
    pub event_type: String,
    /// Actor handle.
    pub actor: String,
    /// Repository in `owner/name` form.
    pub repository: String,
    /// Head commit SHA of the push, when present.
    pub head: Option<String>,
    /// Commits carried in the payload, possibly empty.
    pub commits: Vec<FeedCommit>,
    /// Event creation time, epoch milliseconds.
    pub created_at_ms: i64,
}

/// A page of upstream events plus the remaining-rate-budget signal that
/// accompanied the response.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub events: Vec<FeedEvent>,
    /// Remaining request budget reported by the feed, if any.
    pub rate_remaining: Option<u32>,
}

/// Structured result of one poll cycle. Failure modes fold into this
/// rather than surfacing as errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollOutcome {
    /// Commits newly inserted this cycle (duplicates excluded).
    pub stored: usize,
    /// Push events examined this cycle.
    pub processed: usize,
    /// Whether the feed fetch was refused for rate-budget reasons.
    pub rate_limited: bool,
}

/// Cached resolution of a user's free-text location. Written only on a
/// successful geocode; upserted by key, never independently expired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCacheEntry {
    pub username: String,
    pub location_text: String,
    pub coordinates: GeoPoint,
    /// Epoch milliseconds.
    pub cached_at: i64,
}

/// Cached primary language of a repository. `language: None` is a cached
/// negative result and suppresses re-resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoLanguageCacheEntry {
    pub repository: String,
    pub language: Option<String>,
    /// Epoch milliseconds.
    pub cached_at: i64,
}

/// Rolling monthly rollup; one row per `YYYY-MM`, upserted and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub month: String,
    pub total_commits: u64,
    pub unique_contributors: u64,
    pub by_language: BTreeMap<String, u64>,
    /// Share of commits carrying coordinates, 0..1. Zero for an empty period.
    pub geolocation_rate: f64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

/// Rolling daily rollup; one row per `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub day: String,
    pub total_commits: u64,
    pub unique_contributors: u64,
    pub by_language: BTreeMap<String, u64>,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(coords: Option<GeoPoint>) -> Commit {
        Commit {
            id: "abc123".into(),
            author: "octocat".into(),
            author_url: "https://github.com/octocat".into(),
            message: "fix parser".into(),
            repository: "octocat/hello".into(),
            timestamp: 1_700_000_000_000,
            coordinates: coords,
            language: Some("Rust".into()),
        }
    }

    #[test]
    fn coordinates_serialize_as_two_floats() {
        let json = serde_json::to_value(commit(Some(GeoPoint::new(52.5, 13.4)))).unwrap();
        assert_eq!(json["coordinates"], serde_json::json!([52.5, 13.4]));
    }

    #[test]
    fn unlocated_coordinates_serialize_as_empty_array() {
        let json = serde_json::to_value(commit(None)).unwrap();
        assert_eq!(json["coordinates"], serde_json::json!([]));
    }

    #[test]
    fn coordinates_round_trip() {
        let original = commit(Some(GeoPoint::new(-33.87, 151.21)));
        let json = serde_json::to_string(&original).unwrap();
        let parsed: Commit = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn single_element_coordinates_rejected() {
        let json = r#"{"id":"a","author":"b","author_url":"c","message":"d",
            "repository":"e/f","timestamp":0,"coordinates":[1.0],"language":null}"#;
        assert!(serde_json::from_str::<Commit>(json).is_err());
    }

    #[test]
    fn bounding_box_plain_containment() {
        let bbox = BoundingBox::new(40.0, 60.0, -10.0, 30.0);
        assert!(bbox.contains(GeoPoint::new(52.5, 13.4)));
        assert!(!bbox.contains(GeoPoint::new(35.0, 13.4)), "below min_lat");
        assert!(!bbox.contains(GeoPoint::new(52.5, 31.0)), "past max_lng");
    }

    #[test]
    fn bounding_box_crosses_dateline() {
        let bbox = BoundingBox::new(-60.0, 60.0, 170.0, -170.0);
        assert!(bbox.contains(GeoPoint::new(0.0, 175.0)));
        assert!(bbox.contains(GeoPoint::new(0.0, -175.0)));
        assert!(!bbox.contains(GeoPoint::new(0.0, 0.0)));
    }

    #[test]
    fn bounding_box_edges_are_inclusive() {
        let bbox = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        assert!(bbox.contains(GeoPoint::new(10.0, 30.0)));
        assert!(bbox.contains(GeoPoint::new(20.0, 40.0)));
    }
}
