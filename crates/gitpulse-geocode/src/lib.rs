// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Free-text geocoding client for location enrichment.
//!
//! Resolves profile location strings ("Berlin, Germany") to coordinates
//! via a Nominatim-compatible search endpoint, taking only the first
//! result. The provider's usage policy requires an identifying client
//! tag, sent as the User-Agent.

pub mod client;

pub use client::GeocodeClient;
