// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Enrichment cache operations: user location and repository language.
//!
//! Both tables are upsert-by-key, last writer wins. Location entries are
//! written only on successful geocodes; repo language entries also cache
//! negative (`NULL`) results to suppress re-resolution.

use gitpulse_core::types::GeoPoint;
use gitpulse_core::PulseError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{LocationCacheEntry, RepoLanguageCacheEntry};

/// Look up the cached coordinates for a username.
pub async fn get_location(
    db: &Database,
    username: &str,
) -> Result<Option<LocationCacheEntry>, PulseError> {
    let username = username.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT username, location_text, lat, lng, cached_at
                 FROM location_cache WHERE username = ?1",
            )?;
            let entry = stmt
                .query_row(params![username], |row| {
                    Ok(LocationCacheEntry {
                        username: row.get(0)?,
                        location_text: row.get(1)?,
                        coordinates: GeoPoint {
                            lat: row.get(2)?,
                            lng: row.get(3)?,
                        },
                        cached_at: row.get(4)?,
                    })
                })
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;
            Ok(entry)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Upsert a location cache entry (at most one live row per username).
pub async fn put_location(db: &Database, entry: &LocationCacheEntry) -> Result<(), PulseError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO location_cache
                     (username, location_text, lat, lng, cached_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.username,
                    entry.location_text,
                    entry.coordinates.lat,
                    entry.coordinates.lng,
                    entry.cached_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Case-insensitive substring search over cached location text.
pub async fn search_locations(
    db: &Database,
    text: &str,
    limit: usize,
) -> Result<Vec<LocationCacheEntry>, PulseError> {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let limit = limit as i64;

    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT username, location_text, lat, lng, cached_at
                 FROM location_cache
                 WHERE location_text LIKE '%' || ?1 || '%' ESCAPE '\\'
                 ORDER BY username
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![escaped, limit], |row| {
                Ok(LocationCacheEntry {
                    username: row.get(0)?,
                    location_text: row.get(1)?,
                    coordinates: GeoPoint {
                        lat: row.get(2)?,
                        lng: row.get(3)?,
                    },
                    cached_at: row.get(4)?,
                })
            })?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(row?);
            }
            Ok(entries)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up the cached language for a repository.
///
/// `Ok(Some(entry))` with `entry.language == None` is a cached negative
/// result and is distinct from a cache miss.
pub async fn get_repo_language(
    db: &Database,
    repository: &str,
) -> Result<Option<RepoLanguageCacheEntry>, PulseError> {
    let repository = repository.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT repository, language, cached_at
                 FROM repo_language_cache WHERE repository = ?1",
            )?;
            let entry = stmt
                .query_row(params![repository], |row| {
                    Ok(RepoLanguageCacheEntry {
                        repository: row.get(0)?,
                        language: row.get(1)?,
                        cached_at: row.get(2)?,
                    })
                })
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;
            Ok(entry)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Upsert a repository language cache entry.
pub async fn put_repo_language(
    db: &Database,
    entry: &RepoLanguageCacheEntry,
) -> Result<(), PulseError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO repo_language_cache (repository, language, cached_at)
                 VALUES (?1, ?2, ?3)",
                params![entry.repository, entry.language, entry.cached_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("enrichment.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn location(username: &str, text: &str, lat: f64, lng: f64) -> LocationCacheEntry {
        LocationCacheEntry {
            username: username.to_string(),
            location_text: text.to_string(),
            coordinates: GeoPoint::new(lat, lng),
            cached_at: 1_700_000_000_000,
        }
    }

    #[tokio::test]
    async fn location_upsert_overwrites_not_duplicates() {
        let (db, _dir) = setup_db().await;
        put_location(&db, &location("alice", "Berlin", 52.5, 13.4))
            .await
            .unwrap();
        put_location(&db, &location("alice", "Paris", 48.8, 2.3))
            .await
            .unwrap();

        let entry = get_location(&db, "alice").await.unwrap().unwrap();
        assert_eq!(entry.location_text, "Paris");

        let all = search_locations(&db, "", 10).await.unwrap();
        assert_eq!(all.len(), 1, "re-resolution must not duplicate the row");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn location_miss_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_location(&db, "nobody").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn location_search_matches_substring() {
        let (db, _dir) = setup_db().await;
        put_location(&db, &location("alice", "Berlin, Germany", 52.5, 13.4))
            .await
            .unwrap();
        put_location(&db, &location("bob", "Sao Paulo", -23.5, -46.6))
            .await
            .unwrap();

        let hits = search_locations(&db, "erlin", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "alice");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn repo_language_caches_negative_results() {
        let (db, _dir) = setup_db().await;
        assert!(get_repo_language(&db, "a/b").await.unwrap().is_none());

        put_repo_language(
            &db,
            &RepoLanguageCacheEntry {
                repository: "a/b".to_string(),
                language: None,
                cached_at: 1,
            },
        )
        .await
        .unwrap();

        // A cached NULL is a hit, not a miss.
        let entry = get_repo_language(&db, "a/b").await.unwrap().unwrap();
        assert_eq!(entry.language, None);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn repo_language_upsert_refreshes() {
        let (db, _dir) = setup_db().await;
        put_repo_language(
            &db,
            &RepoLanguageCacheEntry {
                repository: "a/b".to_string(),
                language: Some("Go".to_string()),
                cached_at: 1,
            },
        )
        .await
        .unwrap();
        put_repo_language(
            &db,
            &RepoLanguageCacheEntry {
                repository: "a/b".to_string(),
                language: Some("Rust".to_string()),
                cached_at: 2,
            },
        )
        .await
        .unwrap();

        let entry = get_repo_language(&db, "a/b").await.unwrap().unwrap();
        assert_eq!(entry.language.as_deref(), Some("Rust"));
        assert_eq!(entry.cached_at, 2);
        db.close().await.unwrap();
    }
}
