// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rolling retention enforcement for the commit store.
//!
//! The sweeper is the sole deletion path for commits. Each sweep deletes
//! in bounded batches until the backlog is drained, so a single call never
//! holds the writer thread for an unbounded delete.

use std::sync::Arc;
use std::time::Duration;

use gitpulse_core::PulseError;
use tracing::{debug, info};

use crate::database::Database;
use crate::queries::commits;

/// Periodically evicts commits older than the retention window.
pub struct RetentionSweeper {
    db: Arc<Database>,
    window: Duration,
    batch: usize,
}

impl RetentionSweeper {
    pub fn new(db: Arc<Database>, window: Duration, batch: usize) -> Self {
        Self { db, window, batch }
    }

    /// Delete every commit with `timestamp < now - window`, in batches.
    ///
    /// Returns the total number of rows evicted. A race with an insert of
    /// an old backfilled record is benign: the record is picked up by the
    /// next sweep.
    pub async fn sweep(&self, now_ms: i64) -> Result<usize, PulseError> {
        let cutoff = now_ms - self.window.as_millis() as i64;
        let mut total = 0usize;
        loop {
            let deleted = commits::delete_older_than(&self.db, cutoff, self.batch).await?;
            total += deleted;
            if deleted < self.batch {
                break;
            }
        }
        if total > 0 {
            info!(deleted = total, cutoff, "evicted expired commits");
        } else {
            debug!(cutoff, "retention sweep found nothing to evict");
        }
        Ok(total)
    }
}
