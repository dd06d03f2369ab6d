// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic monthly/daily rollup recomputation.
//!
//! Each cycle is an idempotent full recompute over the commits currently
//! in the period, upserted by period key — never incremental, never a
//! second row per period. Rollup rows persist indefinitely while the raw
//! commits they summarize expire.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use gitpulse_core::types::{Commit, DailyStats, MonthlyStats};
use gitpulse_core::PulseError;
use gitpulse_storage::queries::{commits, stats};
use gitpulse_storage::Database;
use tracing::debug;

/// Language bucket for commits with no resolved language.
pub const OTHER_LANGUAGE: &str = "Other";

/// Recomputes the monthly and daily rollup rows.
pub struct StatsAggregator {
    db: Arc<Database>,
}

impl StatsAggregator {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Recompute and upsert the rollup for the month containing `now`.
    pub async fn recompute_monthly(&self, now: DateTime<Utc>) -> Result<MonthlyStats, PulseError> {
        let (start, end) = month_bounds(now)?;
        let scanned = commits::range_by_time(&self.db, Some(start), Some(end), None, false).await?;

        let (total, unique, by_language, located) = summarize(&scanned);
        let geolocation_rate = if total > 0 {
            located as f64 / total as f64
        } else {
            0.0
        };

        let rollup = MonthlyStats {
            month: now.format("%Y-%m").to_string(),
            total_commits: total,
            unique_contributors: unique,
            by_language,
            geolocation_rate,
            updated_at: Utc::now().timestamp_millis(),
        };
        stats::upsert_monthly(&self.db, &rollup).await?;
        debug!(month = %rollup.month, total, "monthly rollup recomputed");
        Ok(rollup)
    }

    /// Recompute and upsert the rollup for the day containing `now`.
    pub async fn recompute_daily(&self, now: DateTime<Utc>) -> Result<DailyStats, PulseError> {
        let (start, end) = day_bounds(now)?;
        let scanned = commits::range_by_time(&self.db, Some(start), Some(end), None, false).await?;

        let (total, unique, by_language, _located) = summarize(&scanned);
        let rollup = DailyStats {
            day: now.format("%Y-%m-%d").to_string(),
            total_commits: total,
            unique_contributors: unique,
            by_language,
            updated_at: Utc::now().timestamp_millis(),
        };
        stats::upsert_daily(&self.db, &rollup).await?;
        debug!(day = %rollup.day, total, "daily rollup recomputed");
        Ok(rollup)
    }
}

/// Totals, distinct authors, language histogram, and located count.
fn summarize(commits: &[Commit]) -> (u64, u64, BTreeMap<String, u64>, u64) {
    let mut authors = BTreeSet::new();
    let mut by_language: BTreeMap<String, u64> = BTreeMap::new();
    let mut located = 0u64;

    for commit in commits {
        authors.insert(commit.author.as_str());
        let language = commit
            .language
            .clone()
            .unwrap_or_else(|| OTHER_LANGUAGE.to_string());
        *by_language.entry(language).or_insert(0) += 1;
        if commit.coordinates.is_some() {
            located += 1;
        }
    }

    (commits.len() as u64, authors.len() as u64, by_language, located)
}

/// Epoch-millis bounds `[start, end)` of the calendar month containing `now`.
fn month_bounds(now: DateTime<Utc>) -> Result<(i64, i64), PulseError> {
    let (year, month) = (now.year(), now.month());
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let start = NaiveDate::from_ymd_opt(year, month, 1);
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1);
    match (start, end) {
        (Some(start), Some(end)) => Ok((date_start_ms(start), date_start_ms(end))),
        _ => Err(PulseError::Internal(format!(
            "invalid month bounds for {year}-{month:02}"
        ))),
    }
}

/// Epoch-millis bounds `[start, end)` of the UTC day containing `now`.
fn day_bounds(now: DateTime<Utc>) -> Result<(i64, i64), PulseError> {
    let day = now.date_naive();
    let next = day.succ_opt().ok_or_else(|| {
        PulseError::Internal(format!("no successor day for {day}"))
    })?;
    Ok((date_start_ms(day), date_start_ms(next)))
}

fn date_start_ms(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}
