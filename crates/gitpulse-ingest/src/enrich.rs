// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-tier enrichment cache: user location and repository language.
//!
//! Reads go through an in-process DashMap in front of the persisted cache
//! tables; successful resolutions write through to both tiers. Last
//! writer wins per key. Location entries exist only for successful
//! geocodes; language entries also cache negative results, which is what
//! keeps unresolvable repositories from burning budget every cycle.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use gitpulse_core::types::{GeoPoint, LocationCacheEntry, RepoLanguageCacheEntry};
use gitpulse_core::PulseError;
use gitpulse_storage::queries::enrichment;
use gitpulse_storage::Database;

/// Result of a language cache lookup. A cached `None` is a hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageLookup {
    Miss,
    Hit(Option<String>),
}

/// Shared read-through cache over the persisted enrichment tables.
pub struct EnrichmentCache {
    db: Arc<Database>,
    locations: DashMap<String, GeoPoint>,
    languages: DashMap<String, Option<String>>,
}

impl EnrichmentCache {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            locations: DashMap::new(),
            languages: DashMap::new(),
        }
    }

    /// Cached coordinates for a username, consulting memory then the
    /// persisted table. `None` means no successful geocode is on record.
    pub async fn location(&self, username: &str) -> Result<Option<GeoPoint>, PulseError> {
        if let Some(point) = self.locations.get(username) {
            return Ok(Some(*point));
        }
        match enrichment::get_location(&self.db, username).await? {
            Some(entry) => {
                self.locations
                    .insert(username.to_string(), entry.coordinates);
                Ok(Some(entry.coordinates))
            }
            None => Ok(None),
        }
    }

    /// Write through a successful geocode to both tiers.
    pub async fn store_location(
        &self,
        username: &str,
        location_text: &str,
        point: GeoPoint,
    ) -> Result<(), PulseError> {
        enrichment::put_location(
            &self.db,
            &LocationCacheEntry {
                username: username.to_string(),
                location_text: location_text.to_string(),
                coordinates: point,
                cached_at: Utc::now().timestamp_millis(),
            },
        )
        .await?;
        self.locations.insert(username.to_string(), point);
        Ok(())
    }

    /// Cached primary language for a repository.
    pub async fn language(&self, repository: &str) -> Result<LanguageLookup, PulseError> {
        if let Some(language) = self.languages.get(repository) {
            return Ok(LanguageLookup::Hit(language.clone()));
        }
        match enrichment::get_repo_language(&self.db, repository).await? {
            Some(entry) => {
                self.languages
                    .insert(repository.to_string(), entry.language.clone());
                Ok(LanguageLookup::Hit(entry.language))
            }
            None => Ok(LanguageLookup::Miss),
        }
    }

    /// Write through a language resolution, including `None` results.
    pub async fn store_language(
        &self,
        repository: &str,
        language: Option<String>,
    ) -> Result<(), PulseError> {
        enrichment::put_repo_language(
            &self.db,
            &RepoLanguageCacheEntry {
                repository: repository.to_string(),
                language: language.clone(),
                cached_at: Utc::now().timestamp_millis(),
            },
        )
        .await?;
        self.languages.insert(repository.to_string(), language);
        Ok(())
    }
}
