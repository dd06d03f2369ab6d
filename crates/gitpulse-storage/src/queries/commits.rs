// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Commit store operations: idempotent inserts, time-range scans, author
//! scans, and bounded-batch eviction.

use gitpulse_core::types::GeoPoint;
use gitpulse_core::PulseError;
use rusqlite::params;

use crate::database::Database;
use crate::models::Commit;

const COMMIT_COLUMNS: &str =
    "id, author, author_url, message, repository, timestamp, lat, lng, language";

fn commit_from_row(row: &rusqlite::Row<'_>) -> Result<Commit, rusqlite::Error> {
    let lat: Option<f64> = row.get(6)?;
    let lng: Option<f64> = row.get(7)?;
    Ok(Commit {
        id: row.get(0)?,
        author: row.get(1)?,
        author_url: row.get(2)?,
        message: row.get(3)?,
        repository: row.get(4)?,
        timestamp: row.get(5)?,
        coordinates: match (lat, lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        },
        language: row.get(8)?,
    })
}

/// Insert a commit unless its id is already stored. Safe to call
/// repeatedly with the same id.
pub async fn insert_if_absent(db: &Database, commit: &Commit) -> Result<bool, PulseError> {
    let commit = commit.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO commits
                     (id, author, author_url, message, repository, timestamp, lat, lng, language)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    commit.id,
                    commit.author,
                    commit.author_url,
                    commit.message,
                    commit.repository,
                    commit.timestamp,
                    commit.coordinates.map(|p| p.lat),
                    commit.coordinates.map(|p| p.lng),
                    commit.language,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a batch of commits in one transaction with insert-if-absent
/// semantics. Returns the ids that were actually inserted, preserving
/// input order.
pub async fn insert_batch(db: &Database, commits: Vec<Commit>) -> Result<Vec<String>, PulseError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut inserted = Vec::new();
            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO commits
                         (id, author, author_url, message, repository, timestamp, lat, lng, language)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )?;
                for commit in &commits {
                    let changed = stmt.execute(params![
                        commit.id,
                        commit.author,
                        commit.author_url,
                        commit.message,
                        commit.repository,
                        commit.timestamp,
                        commit.coordinates.map(|p| p.lat),
                        commit.coordinates.map(|p| p.lng),
                        commit.language,
                    ])?;
                    if changed > 0 {
                        inserted.push(commit.id.clone());
                    }
                }
            }
            tx.commit()?;
            Ok(inserted)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Scan commits with `start <= timestamp < end`, ordered by timestamp.
///
/// Either bound may be omitted and behaves as ±infinity. `limit` bounds
/// the scan; `None` is unbounded.
pub async fn range_by_time(
    db: &Database,
    start: Option<i64>,
    end: Option<i64>,
    limit: Option<usize>,
    newest_first: bool,
) -> Result<Vec<Commit>, PulseError> {
    let start = start.unwrap_or(i64::MIN);
    let end = end.unwrap_or(i64::MAX);
    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    let order = if newest_first { "DESC" } else { "ASC" };
    let sql = format!(
        "SELECT {COMMIT_COLUMNS} FROM commits
         WHERE timestamp >= ?1 AND timestamp < ?2
         ORDER BY timestamp {order}
         LIMIT ?3"
    );

    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![start, end, limit], commit_from_row)?;
            let mut commits = Vec::new();
            for row in rows {
                commits.push(row?);
            }
            Ok(commits)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All commits for one author, newest first, optionally bounded below.
pub async fn by_author(
    db: &Database,
    author: &str,
    since: Option<i64>,
) -> Result<Vec<Commit>, PulseError> {
    let author = author.to_string();
    let since = since.unwrap_or(i64::MIN);
    let sql = format!(
        "SELECT {COMMIT_COLUMNS} FROM commits
         WHERE author = ?1 AND timestamp >= ?2
         ORDER BY timestamp DESC"
    );

    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![author, since], commit_from_row)?;
            let mut commits = Vec::new();
            for row in rows {
                commits.push(row?);
            }
            Ok(commits)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count commits with `start <= timestamp < end`. No result cap; the
/// count is exact.
pub async fn count_in_range(
    db: &Database,
    start: Option<i64>,
    end: Option<i64>,
) -> Result<u64, PulseError> {
    let start = start.unwrap_or(i64::MIN);
    let end = end.unwrap_or(i64::MAX);

    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM commits WHERE timestamp >= ?1 AND timestamp < ?2",
                params![start, end],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Timestamp of the oldest retained commit, if any.
pub async fn oldest_timestamp(db: &Database) -> Result<Option<i64>, PulseError> {
    db.connection()
        .call(|conn| {
            let ts: Option<i64> =
                conn.query_row("SELECT MIN(timestamp) FROM commits", [], |row| row.get(0))?;
            Ok(ts)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete up to `batch_limit` commits with `timestamp < cutoff`.
///
/// The retention sweeper loops this until a short batch, keeping each
/// delete bounded regardless of backlog size.
pub async fn delete_older_than(
    db: &Database,
    cutoff: i64,
    batch_limit: usize,
) -> Result<usize, PulseError> {
    let batch_limit = batch_limit as i64;
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM commits WHERE rowid IN
                     (SELECT rowid FROM commits WHERE timestamp < ?1 LIMIT ?2)",
                params![cutoff, batch_limit],
            )?;
            Ok(deleted)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Distinct author handles starting with `prefix`, sorted, capped.
pub async fn distinct_authors_with_prefix(
    db: &Database,
    prefix: &str,
    limit: usize,
) -> Result<Vec<String>, PulseError> {
    // Escape LIKE metacharacters so a literal prefix stays literal.
    let escaped = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let limit = limit as i64;

    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT author FROM commits
                 WHERE author LIKE ?1 || '%' ESCAPE '\\'
                 ORDER BY author
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![escaped, limit], |row| row.get(0))?;
            let mut authors = Vec::new();
            for row in rows {
                authors.push(row?);
            }
            Ok(authors)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
