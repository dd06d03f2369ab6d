// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! GitHub REST client for the Gitpulse pipeline.
//!
//! Provides [`GithubClient`] covering the three upstream calls the
//! pipeline makes: the public events page (with its rate-budget signal),
//! user profile location lookup, and repository primary-language lookup.

pub mod client;
pub mod types;

pub use client::GithubClient;
