// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spatial-temporal query engine over the commit store.
//!
//! Read-only: every query tolerates a store that is concurrently being
//! appended to and trimmed, returning a snapshot-at-scan-time result.

pub mod engine;

pub use engine::{QueryEngine, QueryLimits};
