//! # Sync State
//!
//! What the sync service reports to its observers: the outcome of each
//! retry-all run, connectivity changes, and a snapshot of current state.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::client::sync::network_monitor::NetworkStatus;

/// Outcome of one retry-all run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl SyncReport {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} uploaded, {} failed", self.succeeded, self.failed)
    }
}

/// Broadcast to subscribers of the sync service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// An auto-sync tick attempted at least one draft.
    AutoSyncCompleted(SyncReport),
    /// The connectivity probe changed its answer.
    Connectivity(NetworkStatus),
}

#[derive(Debug, Clone, Default)]
pub struct SyncState {
    pub is_syncing: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub last_report: Option<SyncReport>,
    pub network_status: Option<NetworkStatus>,
}
