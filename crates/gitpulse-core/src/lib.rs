// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Gitpulse ingestion-and-query pipeline.
//!
//! This crate provides the error type, the domain types shared across the
//! workspace (commits, coordinates, cache entries, stats rollups), and the
//! async source traits that decouple the poller from the concrete HTTP
//! clients behind it.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PulseError;
pub use types::{BoundingBox, Commit, GeoPoint, PollOutcome};

pub use traits::{EventFeed, Geocoder, ProfileSource, RepoMetadata};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_error_has_all_variants() {
        let _config = PulseError::Config("test".into());
        let _storage = PulseError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _upstream = PulseError::Upstream {
            message: "test".into(),
            source: None,
        };
        let _rate_limited = PulseError::RateLimited;
        let _timeout = PulseError::Timeout {
            duration: std::time::Duration::from_secs(10),
        };
        let _internal = PulseError::Internal("test".into());
    }

    #[test]
    fn all_source_traits_are_exported() {
        // If any trait module is missing or has a compile error, this
        // test won't compile.
        fn _assert_event_feed<T: EventFeed>() {}
        fn _assert_profile_source<T: ProfileSource>() {}
        fn _assert_geocoder<T: Geocoder>() {}
        fn _assert_repo_metadata<T: RepoMetadata>() {}
    }
}
