// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-demand per-author analytics.
//!
//! Everything here is a pure function of the author's windowed commit set
//! plus the current monthly rollup; no external I/O beyond the two store
//! reads. An author with zero commits in the window gets a defined
//! zero-valued result, never an error.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use gitpulse_core::types::{Commit, MonthlyStats};
use gitpulse_core::PulseError;
use gitpulse_storage::queries::{commits, stats};
use gitpulse_storage::Database;
use serde::Serialize;

use crate::aggregator::OTHER_LANGUAGE;

/// Default analysis window when the caller supplies no start.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

const DAY_MS: i64 = 86_400_000;

/// One language's share of the author's windowed commits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageShare {
    pub language: String,
    pub count: u64,
    /// Rounded percentage of the windowed total.
    pub percentage: u32,
}

/// One active day in the heatmap; days without commits are omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayActivity {
    /// UTC date, `YYYY-MM-DD`.
    pub date: String,
    pub count: u64,
}

/// The full per-author result.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileStats {
    pub username: String,
    pub total_commits: u64,
    /// Estimated rank band, 1..=99; lower is better.
    pub percentile: u8,
    /// Top languages, at most three, descending.
    pub languages: Vec<LanguageShare>,
    /// Sparse day-by-day activity, ascending by date.
    pub heatmap: Vec<DayActivity>,
    /// Commits per UTC hour of day.
    pub hourly: [u64; 24],
    /// Hour with the most commits; `None` with no data. Ties go to the
    /// earliest hour.
    pub peak_hour: Option<u8>,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Estimated rank band against the monthly average.
///
/// The value reads as "top N percent": matching the average sits at 50
/// and doubling the ratio moves 25 points toward 1. This is a deliberate
/// logarithmic heuristic against a single global average — it never
/// inspects other users' individual counts. Without a monthly rollup it
/// falls back to fixed count thresholds.
pub fn percentile_rank(user_count: u64, monthly: Option<&MonthlyStats>) -> u8 {
    if let Some(monthly) = monthly
        && monthly.unique_contributors > 0
    {
        let avg = monthly.total_commits as f64 / monthly.unique_contributors as f64;
        let ratio = user_count as f64 / avg;
        let raw = (50.0 - 25.0 * ratio.log2()).round();
        return raw.clamp(1.0, 99.0) as u8;
    }
    match user_count {
        c if c >= 100 => 1,
        c if c >= 50 => 5,
        c if c >= 20 => 10,
        c if c >= 10 => 25,
        _ => 50,
    }
}

/// Per-language counts, `None -> "Other"`, top three descending.
pub fn language_breakdown(commits: &[Commit]) -> Vec<LanguageShare> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for commit in commits {
        let language = commit
            .language
            .clone()
            .unwrap_or_else(|| OTHER_LANGUAGE.to_string());
        *counts.entry(language).or_insert(0) += 1;
    }

    let total = commits.len() as u64;
    let mut shares: Vec<LanguageShare> = counts
        .into_iter()
        .map(|(language, count)| LanguageShare {
            language,
            count,
            percentage: ((count as f64 / total as f64) * 100.0).round() as u32,
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then(a.language.cmp(&b.language)));
    shares.truncate(3);
    shares
}

/// Sparse UTC-date activity counts, ascending.
pub fn activity_heatmap(commits: &[Commit]) -> Vec<DayActivity> {
    let mut days: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for commit in commits {
        if let Some(dt) = DateTime::<Utc>::from_timestamp_millis(commit.timestamp) {
            *days.entry(dt.date_naive()).or_insert(0) += 1;
        }
    }
    days.into_iter()
        .map(|(date, count)| DayActivity {
            date: date.format("%Y-%m-%d").to_string(),
            count,
        })
        .collect()
}

/// Commits bucketed by UTC hour, plus the peak hour (first argmax).
pub fn hourly_distribution(commits: &[Commit]) -> ([u64; 24], Option<u8>) {
    let mut buckets = [0u64; 24];
    for commit in commits {
        if let Some(dt) = DateTime::<Utc>::from_timestamp_millis(commit.timestamp) {
            buckets[dt.hour() as usize] += 1;
        }
    }
    let peak = buckets
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count > 0)
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(hour, _)| hour as u8);
    (buckets, peak)
}

/// Current and longest streaks over a set of active dates.
///
/// The current streak walks backward from today when today is active,
/// else from yesterday when yesterday is active, else it is zero. The
/// longest streak is the longest run of calendar-consecutive active days
/// anywhere in the set.
pub fn streaks(active: &BTreeSet<NaiveDate>, today: NaiveDate) -> (u32, u32) {
    let start = if active.contains(&today) {
        Some(today)
    } else {
        today.pred_opt().filter(|y| active.contains(y))
    };

    let mut current = 0u32;
    if let Some(mut day) = start {
        while active.contains(&day) {
            current += 1;
            match day.pred_opt() {
                Some(prev) => day = prev,
                None => break,
            }
        }
    }

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;
    for &day in active {
        run = match prev {
            Some(p) if p.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }

    (current, longest)
}

/// Assemble the full profile from the windowed commit set.
pub fn build_profile(
    username: &str,
    commits: &[Commit],
    monthly: Option<&MonthlyStats>,
    today: NaiveDate,
) -> ProfileStats {
    let heatmap = activity_heatmap(commits);
    let active: BTreeSet<NaiveDate> = commits
        .iter()
        .filter_map(|c| DateTime::<Utc>::from_timestamp_millis(c.timestamp))
        .map(|dt| dt.date_naive())
        .collect();
    let (current_streak, longest_streak) = streaks(&active, today);
    let (hourly, peak_hour) = hourly_distribution(commits);

    ProfileStats {
        username: username.to_string(),
        total_commits: commits.len() as u64,
        percentile: percentile_rank(commits.len() as u64, monthly),
        languages: language_breakdown(commits),
        heatmap,
        hourly,
        peak_hour,
        current_streak,
        longest_streak,
    }
}

/// Read-side entry point combining the author scan with the monthly rollup.
pub struct ProfileAnalytics {
    db: Arc<Database>,
}

impl ProfileAnalytics {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Profile stats for `username` from `window_start` (default: last 30
    /// days) to now. Blank usernames yield `None`, not an error.
    pub async fn profile_stats(
        &self,
        username: &str,
        window_start: Option<i64>,
    ) -> Result<Option<ProfileStats>, PulseError> {
        let username = username.trim();
        if username.is_empty() {
            return Ok(None);
        }
        self.profile_stats_at(username, window_start, Utc::now())
            .await
            .map(Some)
    }

    /// Profile stats against an explicit clock, for deterministic tests.
    pub async fn profile_stats_at(
        &self,
        username: &str,
        window_start: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<ProfileStats, PulseError> {
        let since =
            window_start.unwrap_or_else(|| now.timestamp_millis() - DEFAULT_WINDOW_DAYS * DAY_MS);
        let windowed = commits::by_author(&self.db, username, Some(since)).await?;
        let month_key = now.format("%Y-%m").to_string();
        let monthly = stats::get_monthly(&self.db, &month_key).await?;
        Ok(build_profile(
            username,
            &windowed,
            monthly.as_ref(),
            now.date_naive(),
        ))
    }
}
