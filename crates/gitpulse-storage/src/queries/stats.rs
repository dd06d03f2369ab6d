// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stats rollup rows, upserted by period key.
//!
//! `by_language` maps are stored as JSON text; rows persist indefinitely
//! (one per period), unlike commits which expire.

use std::collections::BTreeMap;

use gitpulse_core::PulseError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{DailyStats, MonthlyStats};

fn languages_to_json(map: &BTreeMap<String, u64>) -> Result<String, PulseError> {
    serde_json::to_string(map).map_err(|e| PulseError::Internal(format!("by_language encode: {e}")))
}

fn languages_from_json(raw: &str) -> Result<BTreeMap<String, u64>, PulseError> {
    serde_json::from_str(raw).map_err(|e| PulseError::Internal(format!("by_language decode: {e}")))
}

/// Upsert the rollup row for one month. Recomputation overwrites every
/// field; a period key never gains a second row.
pub async fn upsert_monthly(db: &Database, stats: &MonthlyStats) -> Result<(), PulseError> {
    let by_language = languages_to_json(&stats.by_language)?;
    let stats = stats.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO monthly_stats
                     (month, total_commits, unique_contributors, by_language,
                      geolocation_rate, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    stats.month,
                    stats.total_commits as i64,
                    stats.unique_contributors as i64,
                    by_language,
                    stats.geolocation_rate,
                    stats.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch the rollup row for one month (`YYYY-MM`).
pub async fn get_monthly(db: &Database, month: &str) -> Result<Option<MonthlyStats>, PulseError> {
    let month = month.to_string();
    let row = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT month, total_commits, unique_contributors, by_language,
                        geolocation_rate, updated_at
                 FROM monthly_stats WHERE month = ?1",
            )?;
            let row = stmt
                .query_row(params![month], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, f64>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                })
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;
            Ok(row)
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    match row {
        Some((month, total, unique, by_language, rate, updated_at)) => Ok(Some(MonthlyStats {
            month,
            total_commits: total as u64,
            unique_contributors: unique as u64,
            by_language: languages_from_json(&by_language)?,
            geolocation_rate: rate,
            updated_at,
        })),
        None => Ok(None),
    }
}

/// Upsert the rollup row for one day.
pub async fn upsert_daily(db: &Database, stats: &DailyStats) -> Result<(), PulseError> {
    let by_language = languages_to_json(&stats.by_language)?;
    let stats = stats.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO daily_stats
                     (day, total_commits, unique_contributors, by_language, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    stats.day,
                    stats.total_commits as i64,
                    stats.unique_contributors as i64,
                    by_language,
                    stats.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch the rollup row for one day (`YYYY-MM-DD`).
pub async fn get_daily(db: &Database, day: &str) -> Result<Option<DailyStats>, PulseError> {
    let day = day.to_string();
    let row = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT day, total_commits, unique_contributors, by_language, updated_at
                 FROM daily_stats WHERE day = ?1",
            )?;
            let row = stmt
                .query_row(params![day], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                })
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;
            Ok(row)
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    match row {
        Some((day, total, unique, by_language, updated_at)) => Ok(Some(DailyStats {
            day,
            total_commits: total as u64,
            unique_contributors: unique as u64,
            by_language: languages_from_json(&by_language)?,
            updated_at,
        })),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("stats.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn monthly(month: &str, total: u64) -> MonthlyStats {
        let mut by_language = BTreeMap::new();
        by_language.insert("Rust".to_string(), total);
        MonthlyStats {
            month: month.to_string(),
            total_commits: total,
            unique_contributors: 3,
            by_language,
            geolocation_rate: 0.5,
            updated_at: 1_700_000_000_000,
        }
    }

    #[tokio::test]
    async fn monthly_round_trip() {
        let (db, _dir) = setup_db().await;
        let stats = monthly("2026-08", 42);
        upsert_monthly(&db, &stats).await.unwrap();

        let fetched = get_monthly(&db, "2026-08").await.unwrap().unwrap();
        assert_eq!(fetched, stats);
        assert!(get_monthly(&db, "2026-07").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn monthly_upsert_never_duplicates_period() {
        let (db, _dir) = setup_db().await;
        upsert_monthly(&db, &monthly("2026-08", 1)).await.unwrap();
        upsert_monthly(&db, &monthly("2026-08", 99)).await.unwrap();

        let fetched = get_monthly(&db, "2026-08").await.unwrap().unwrap();
        assert_eq!(fetched.total_commits, 99);

        let count: i64 = db
            .connection()
            .call(|conn| -> rusqlite::Result<i64> {
                Ok(conn.query_row("SELECT COUNT(*) FROM monthly_stats", [], |r| r.get(0))?)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn daily_round_trip() {
        let (db, _dir) = setup_db().await;
        let mut by_language = BTreeMap::new();
        by_language.insert("Other".to_string(), 7);
        let stats = DailyStats {
            day: "2026-08-06".to_string(),
            total_commits: 7,
            unique_contributors: 2,
            by_language,
            updated_at: 1,
        };
        upsert_daily(&db, &stats).await.unwrap();
        let fetched = get_daily(&db, "2026-08-06").await.unwrap().unwrap();
        assert_eq!(fetched, stats);
        db.close().await.unwrap();
    }
}
