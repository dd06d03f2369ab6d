// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `gitpulse-core::types` for use across
//! crate boundaries. This module re-exports them for convenience within
//! the storage crate.

pub use gitpulse_core::types::{
    Commit, DailyStats, GeoPoint, LocationCacheEntry, MonthlyStats, RepoLanguageCacheEntry,
};
