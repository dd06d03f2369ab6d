// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Gitpulse event store.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, typed query
//! modules for commits, enrichment caches, and stats rollups, and the
//! retention sweeper that enforces the rolling commit window.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod retention;

pub use database::Database;
pub use models::*;
pub use retention::RetentionSweeper;
