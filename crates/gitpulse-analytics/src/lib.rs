// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analytics layer for the Gitpulse pipeline.
//!
//! [`StatsAggregator`] periodically folds the commit store into monthly
//! and daily rollup rows. [`profile`] computes on-demand per-author
//! statistics (percentile rank, language breakdown, heatmap, streaks,
//! peak hour) as pure functions over a windowed commit set. [`regions`]
//! buckets coordinates into named geographic bands for the live regional
//! distribution.

pub mod aggregator;
pub mod profile;
pub mod regions;

pub use aggregator::StatsAggregator;
pub use profile::{ProfileAnalytics, ProfileStats};
pub use regions::{classify, region_distribution, Region, RegionActivity};
