// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the query surface.
//!
//! Bad input (short search terms, partial bounding boxes, blank
//! usernames) yields empty results, not errors; only malformed windows
//! and internal failures produce error statuses.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use gitpulse_analytics::{region_distribution, ProfileStats, RegionActivity};
use gitpulse_core::types::{BoundingBox, Commit};
use gitpulse_core::PulseError;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::server::GatewayState;

/// Optional viewport query parameters. A box takes effect only when all
/// four edges are present; a partial box is treated as no box.
#[derive(Debug, Default, Deserialize)]
pub struct BoxParams {
    pub min_lat: Option<f64>,
    pub max_lat: Option<f64>,
    pub min_lng: Option<f64>,
    pub max_lng: Option<f64>,
}

impl BoxParams {
    pub fn into_bbox(self) -> Option<BoundingBox> {
        match (self.min_lat, self.max_lat, self.min_lng, self.max_lng) {
            (Some(min_lat), Some(max_lat), Some(min_lng), Some(max_lng)) => {
                Some(BoundingBox::new(min_lat, max_lat, min_lng, max_lng))
            }
            _ => None,
        }
    }
}

/// Query parameters for the windowed commits endpoint. The viewport
/// fields mirror [`BoxParams`]; serde_urlencoded cannot flatten.
#[derive(Debug, Deserialize)]
pub struct WindowParams {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub min_lat: Option<f64>,
    pub max_lat: Option<f64>,
    pub min_lng: Option<f64>,
    pub max_lng: Option<f64>,
}

impl WindowParams {
    fn into_bbox(self) -> Option<BoundingBox> {
        BoxParams {
            min_lat: self.min_lat,
            max_lat: self.max_lat,
            min_lng: self.min_lng,
            max_lng: self.max_lng,
        }
        .into_bbox()
    }
}

/// Query parameters for count.
#[derive(Debug, Deserialize)]
pub struct CountParams {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileParams {
    /// Window start, epoch millis. Defaults to the last 30 days.
    pub since: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityParams {
    /// Lookback in minutes for the regional distribution.
    pub minutes: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct CommitsResponse {
    pub count: usize,
    pub commits: Vec<Commit>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct OldestResponse {
    pub oldest: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AuthorsResponse {
    pub authors: Vec<String>,
}

/// One location search hit, coordinates in `[lat, lng]` wire form.
#[derive(Debug, Serialize)]
pub struct LocationMatch {
    pub username: String,
    pub location: String,
    pub coordinates: [f64; 2],
}

#[derive(Debug, Serialize)]
pub struct LocationsResponse {
    pub locations: Vec<LocationMatch>,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub regions: Vec<RegionActivity>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Internal failures never leak provider details to the caller.
fn internal_error(e: PulseError) -> Response {
    error!(error = %e, "query handler failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "internal error".to_string(),
        }),
    )
        .into_response()
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /v1/commits/live
pub async fn get_live_commits(
    State(state): State<GatewayState>,
    Query(params): Query<BoxParams>,
) -> Response {
    match state.engine.live(params.into_bbox()).await {
        Ok(commits) => Json(CommitsResponse {
            count: commits.len(),
            commits,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /v1/commits?start=&end=
pub async fn get_windowed_commits(
    State(state): State<GatewayState>,
    Query(params): Query<WindowParams>,
) -> Response {
    let (Some(start), Some(end)) = (params.start, params.end) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "start and end are required".to_string(),
            }),
        )
            .into_response();
    };
    match state.engine.windowed(start, end, params.into_bbox()).await {
        Ok(commits) => Json(CommitsResponse {
            count: commits.len(),
            commits,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /v1/commits/count
pub async fn get_count(
    State(state): State<GatewayState>,
    Query(params): Query<CountParams>,
) -> Response {
    match state.engine.count(params.start, params.end).await {
        Ok(count) => Json(CountResponse { count }).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /v1/commits/oldest
pub async fn get_oldest(State(state): State<GatewayState>) -> Response {
    match state.engine.oldest_timestamp().await {
        Ok(oldest) => Json(OldestResponse { oldest }).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /v1/profiles/{username}
pub async fn get_profile(
    State(state): State<GatewayState>,
    Path(username): Path<String>,
    Query(params): Query<ProfileParams>,
) -> Response {
    match state.profiles.profile_stats(&username, params.since).await {
        Ok(profile) => Json::<Option<ProfileStats>>(profile).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /v1/search/authors?q=
pub async fn search_authors(
    State(state): State<GatewayState>,
    Query(params): Query<SearchParams>,
) -> Response {
    match state.engine.search_authors(&params.q).await {
        Ok(authors) => Json(AuthorsResponse { authors }).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /v1/search/locations?q=
pub async fn search_locations(
    State(state): State<GatewayState>,
    Query(params): Query<SearchParams>,
) -> Response {
    match state.engine.search_locations(&params.q).await {
        Ok(entries) => {
            let locations = entries
                .into_iter()
                .map(|e| LocationMatch {
                    username: e.username,
                    location: e.location_text,
                    coordinates: [e.coordinates.lat, e.coordinates.lng],
                })
                .collect();
            Json(LocationsResponse { locations }).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// GET /v1/regions/authors — distinct authors currently active in a
/// viewport. Without a full box the answer is empty.
pub async fn get_region_authors(
    State(state): State<GatewayState>,
    Query(params): Query<BoxParams>,
) -> Response {
    let Some(bbox) = params.into_bbox() else {
        return Json(AuthorsResponse {
            authors: Vec::new(),
        })
        .into_response();
    };
    match state.engine.authors_in_region(bbox).await {
        Ok(authors) => Json(AuthorsResponse { authors }).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /v1/regions/activity — regional distribution over a recent window
/// (default five minutes).
pub async fn get_region_activity(
    State(state): State<GatewayState>,
    Query(params): Query<ActivityParams>,
) -> Response {
    let minutes = params.minutes.unwrap_or(5);
    let start = Utc::now().timestamp_millis() - (minutes as i64) * 60_000;
    match state.engine.windowed(start, i64::MAX, None).await {
        Ok(commits) => Json(ActivityResponse {
            regions: region_distribution(&commits),
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}
