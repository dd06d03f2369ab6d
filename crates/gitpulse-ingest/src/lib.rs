// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingestion layer for the Gitpulse pipeline.
//!
//! [`EventPoller`] pulls the upstream public-event feed on a fixed
//! cadence, filters to push events, deduplicates by head commit SHA,
//! enriches through [`EnrichmentCache`] under a rate budget, and batch
//! inserts into the commit store. Newly stored commits are published on a
//! broadcast channel for live consumers.

pub mod enrich;
pub mod poller;

pub use enrich::EnrichmentCache;
pub use poller::EventPoller;
