//! # Draft Sync Service
//!
//! Uploads stored drafts, either on request (`retry_all`) or from a single
//! background loop (`start_auto_sync`).
//!
//! ## Architecture
//!
//! - **Scheduler**: owns the one background task handle
//! - **Network Monitor**: connectivity probe with change detection
//! - **Sync State**: reports, events and a status snapshot
//!
//! ## Auto-Sync Loop
//!
//! The loop sleeps one interval before its first tick. Each tick is skipped
//! when the `autoSyncEnabled` preference is off, when the probe reports
//! offline, or when there are no drafts. Otherwise it runs retry-all and
//! broadcasts [`SyncEvent::AutoSyncCompleted`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use formsync::client::sync::{SyncEvent, SyncService};
//! # async fn example(service: SyncService) {
//! let mut events = service.subscribe();
//! service.start_auto_sync().await;
//!
//! while let Ok(event) = events.recv().await {
//!     if let SyncEvent::AutoSyncCompleted(report) = event {
//!         println!("Auto-sync complete: {}", report);
//!     }
//! }
//! # }
//! ```

pub mod network_monitor;
pub mod scheduler;
pub mod sync_state;

pub use network_monitor::{ConnectivityProbe, HttpProbe, NetworkMonitor, NetworkStatus};
pub use scheduler::{AutoSync, Shutdown};
pub use sync_state::{SyncEvent, SyncReport, SyncState};

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::client::offline::SubmissionPipeline;
use crate::client::preferences::{PreferenceStore, AUTO_SYNC_ENABLED};
use crate::shared::config::DEFAULT_SYNC_INTERVAL;
use crate::shared::error::StorageError;

const EVENT_CAPACITY: usize = 32;

/// State shared between the service and its background task.
struct SyncContext {
    pipeline: SubmissionPipeline,
    preferences: Arc<dyn PreferenceStore>,
    monitor: NetworkMonitor,
    events: broadcast::Sender<SyncEvent>,
    sync_state: RwLock<SyncState>,
    /// Serializes retry-all runs so a draft is never uploaded twice at once.
    run_lock: Mutex<()>,
}

pub struct SyncService {
    context: Arc<SyncContext>,
    auto_sync: AutoSync,
    interval: Duration,
}

impl SyncService {
    pub fn new(
        pipeline: SubmissionPipeline,
        preferences: Arc<dyn PreferenceStore>,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            context: Arc::new(SyncContext {
                pipeline,
                preferences,
                monitor: NetworkMonitor::new(probe),
                events,
                sync_state: RwLock::new(SyncState::default()),
                run_lock: Mutex::new(()),
            }),
            auto_sync: AutoSync::new(),
            interval: DEFAULT_SYNC_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Upload every stored draft once.
    pub async fn retry_all(&self) -> SyncReport {
        self.context.retry_all().await
    }

    /// Start the background loop. Returns `false` if it is already running.
    pub async fn start_auto_sync(&self) -> bool {
        let context = Arc::clone(&self.context);
        let interval = self.interval;
        let started = self
            .auto_sync
            .start(move |mut shutdown| async move {
                loop {
                    tokio::select! {
                        _ = shutdown.requested() => break,
                        _ = tokio::time::sleep(interval) => context.tick().await,
                    }
                }
            })
            .await;
        if started {
            tracing::info!("[SYNC] Auto-sync started (every {:?})", interval);
        }
        started
    }

    /// Stop the background loop. A tick in progress finishes first.
    pub async fn stop_auto_sync(&self) -> bool {
        let stopped = self.auto_sync.stop().await;
        if stopped {
            tracing::info!("[SYNC] Auto-sync stopped");
        }
        stopped
    }

    pub async fn is_auto_sync_running(&self) -> bool {
        self.auto_sync.is_running().await
    }

    pub async fn is_auto_sync_enabled(&self) -> bool {
        self.context
            .preferences
            .bool_with_fallback(AUTO_SYNC_ENABLED, true)
            .await
    }

    /// Persist the user's auto-sync switch; the loop reads it on every tick.
    pub async fn set_auto_sync_enabled(&self, enabled: bool) -> Result<(), StorageError> {
        self.context
            .preferences
            .set_bool(AUTO_SYNC_ENABLED, enabled)
            .await
    }

    /// Probe connectivity now, publishing a change event if it moved.
    pub async fn check_connectivity(&self) -> NetworkStatus {
        self.context.check_connectivity().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.context.events.subscribe()
    }

    /// Get current sync status
    pub async fn get_status(&self) -> SyncState {
        self.context.sync_state.read().await.clone()
    }
}

impl SyncContext {
    async fn retry_all(&self) -> SyncReport {
        let _run = self.run_lock.lock().await;
        self.sync_state.write().await.is_syncing = true;

        let mut report = SyncReport::default();
        let drafts = self.pipeline.drafts();
        match drafts.list().await {
            Ok(ids) => {
                for id in ids {
                    match self.pipeline.retry_draft(&id).await {
                        Ok(()) => report.succeeded += 1,
                        Err(e) => {
                            tracing::warn!("[SYNC] Draft {} not uploaded: {}", id, e);
                            report.failed += 1;
                        }
                    }
                }
            }
            Err(e) => tracing::error!("[SYNC] Cannot list drafts: {}", e),
        }

        {
            let mut state = self.sync_state.write().await;
            state.is_syncing = false;
            state.last_sync = Some(Utc::now());
            state.last_report = Some(report);
        }
        report
    }

    async fn check_connectivity(&self) -> NetworkStatus {
        let (status, changed) = self.monitor.check().await;
        self.sync_state.write().await.network_status = Some(status);
        if changed {
            let _ = self.events.send(SyncEvent::Connectivity(status));
        }
        status
    }

    async fn tick(&self) {
        if !self
            .preferences
            .bool_with_fallback(AUTO_SYNC_ENABLED, true)
            .await
        {
            tracing::debug!("[SYNC] Auto-sync disabled, skipping tick");
            return;
        }

        if !self.check_connectivity().await.is_online() {
            tracing::debug!("[SYNC] Offline, skipping tick");
            return;
        }

        match self.pipeline.drafts().list().await {
            Ok(ids) if ids.is_empty() => {
                tracing::debug!("[SYNC] No drafts, skipping tick");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("[SYNC] Cannot list drafts: {}", e);
                return;
            }
        }

        let report = self.retry_all().await;
        if report.attempted() > 0 {
            tracing::info!("[SYNC] Auto-sync complete: {}", report);
            let _ = self.events.send(SyncEvent::AutoSyncCompleted(report));
        }
    }
}
