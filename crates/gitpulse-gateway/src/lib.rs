// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the Gitpulse query surface.
//!
//! Serves the spatial/temporal queries, search, and analytics as JSON
//! endpoints, plus a WebSocket feed of newly stored commits driven by the
//! ingestion broadcast channel. The surface is read-only public data, so
//! it ships unauthenticated with permissive CORS.

pub mod handlers;
pub mod live;
pub mod server;

pub use server::{start_server, GatewayState, ServerConfig};
