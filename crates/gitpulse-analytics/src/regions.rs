// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hand-tuned geographic bands for aggregate activity.
//!
//! Classification uses coarse lat/lng rectangles checked in a fixed
//! order; the order is what resolves their known edge-case overlaps
//! (the Middle East falls to Africa's rectangle, island Southeast Asia
//! to Oceania's). A second, disjoint rule folds eastern Russia beyond
//! the antimeridian into Asia. These are display buckets for a
//! visualization, not a geographic authority.

use std::collections::HashMap;

use gitpulse_core::types::{Commit, GeoPoint};
use serde::Serialize;

/// Named geographic band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Region {
    NorthAmerica,
    SouthAmerica,
    Europe,
    Africa,
    Asia,
    Oceania,
    Other,
}

impl Region {
    pub fn name(&self) -> &'static str {
        match self {
            Region::NorthAmerica => "North America",
            Region::SouthAmerica => "South America",
            Region::Europe => "Europe",
            Region::Africa => "Africa",
            Region::Asia => "Asia",
            Region::Oceania => "Oceania",
            Region::Other => "Other",
        }
    }
}

/// Bucket a coordinate into a region.
pub fn classify(point: GeoPoint) -> Region {
    let GeoPoint { lat, lng } = point;

    // Eastern Russia sits past the antimeridian and would otherwise read
    // as North America.
    if lat >= 55.0 && lng <= -169.0 {
        return Region::Asia;
    }
    if (36.0..=71.0).contains(&lat) && (-10.0..=40.0).contains(&lng) {
        return Region::Europe;
    }
    if (-35.0..=36.0).contains(&lat) && (-18.0..=52.0).contains(&lng) {
        return Region::Africa;
    }
    if (-50.0..=0.0).contains(&lat) && (110.0..=180.0).contains(&lng) {
        return Region::Oceania;
    }
    if (-10.0..=72.0).contains(&lat) && (40.0..=180.0).contains(&lng) {
        return Region::Asia;
    }
    if (15.0..=72.0).contains(&lat) && (-170.0..=-50.0).contains(&lng) {
        return Region::NorthAmerica;
    }
    if (-56.0..=15.0).contains(&lat) && (-82.0..=-34.0).contains(&lng) {
        return Region::SouthAmerica;
    }
    Region::Other
}

/// One region's share of a commit set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionActivity {
    pub region: &'static str,
    pub count: u64,
}

/// Located commits bucketed by region, descending by count. Unlocated
/// commits cannot be placed and are excluded.
pub fn region_distribution(commits: &[Commit]) -> Vec<RegionActivity> {
    let mut counts: HashMap<Region, u64> = HashMap::new();
    for commit in commits {
        if let Some(point) = commit.coordinates {
            *counts.entry(classify(point)).or_insert(0) += 1;
        }
    }
    let mut distribution: Vec<RegionActivity> = counts
        .into_iter()
        .map(|(region, count)| RegionActivity {
            region: region.name(),
            count,
        })
        .collect();
    distribution.sort_by(|a, b| b.count.cmp(&a.count).then(a.region.cmp(b.region)));
    distribution
}
