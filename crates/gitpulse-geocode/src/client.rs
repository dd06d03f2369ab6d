// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Nominatim-style search endpoint.

use std::time::Duration;

use async_trait::async_trait;
use gitpulse_core::types::GeoPoint;
use gitpulse_core::{Geocoder, PulseError};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::debug;

/// Per-request timeout; a slow geocode must never stall a poll cycle.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One search hit. Nominatim encodes coordinates as strings.
#[derive(Debug, Deserialize)]
struct ApiPlace {
    lat: String,
    lon: String,
}

/// Geocoding client resolving free-text queries to a single coordinate
/// pair, first result only.
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    client: reqwest::Client,
    endpoint: String,
}

impl GeocodeClient {
    /// Creates a new geocoding client.
    ///
    /// # Arguments
    /// * `endpoint` - search endpoint base URL (overridable for tests)
    /// * `client_tag` - identifying User-Agent value
    pub fn new(endpoint: String, client_tag: &str) -> Result<Self, PulseError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "user-agent",
            HeaderValue::from_str(client_tag).map_err(|e| {
                PulseError::Config(format!("invalid geocoder client tag: {e}"))
            })?,
        );

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
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a free-text location to coordinates. No hit yields `None`.
    pub async fn search(&self, query: &str) -> Result<Option<GeoPoint>, PulseError> {
        let url = format!("{}/search", self.endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| PulseError::Upstream {
                message: format!("geocode request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PulseError::Upstream {
                message: format!("geocode request returned {status}"),
                source: None,
            });
        }

        let places: Vec<ApiPlace> =
            response.json().await.map_err(|e| PulseError::Upstream {
                message: format!("failed to parse geocode response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let Some(place) = places.into_iter().next() else {
            debug!(query, "geocode produced no results");
            return Ok(None);
        };

        let lat = place.lat.parse::<f64>().map_err(|e| PulseError::Upstream {
            message: format!("geocode latitude `{}` unparseable: {e}", place.lat),
            source: None,
        })?;
        let lng = place.lon.parse::<f64>().map_err(|e| PulseError::Upstream {
            message: format!("geocode longitude `{}` unparseable: {e}", place.lon),
            source: None,
        })?;

        debug!(query, lat, lng, "geocode resolved");
        Ok(Some(GeoPoint { lat, lng }))
    }
}

#[async_trait]
impl Geocoder for GeocodeClient {
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, PulseError> {
        self.search(query).await
    }
}
