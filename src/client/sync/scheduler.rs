//! # Auto-Sync Task Handle
//!
//! Owns the single background sync task. Starting while a live task exists
//! does nothing; a task that has finished frees the slot.
//!
//! Stopping is cooperative: the task receives a [`Shutdown`] and checks it
//! between units of work, so an upload in flight is never cut off between
//! delivery and draft removal. Dropping the handle signals the same way.

use std::future::Future;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Stop request seen by the background task.
#[derive(Debug, Clone)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    /// Resolves once a stop was requested or the owning handle is gone.
    pub async fn requested(&mut self) {
        let _ = self.0.wait_for(|stop| *stop).await;
    }
}

#[derive(Debug)]
struct Running {
    handle: JoinHandle<()>,
    stop: watch::Sender<bool>,
}

#[derive(Debug, Default)]
pub struct AutoSync {
    running: Mutex<Option<Running>>,
}

impl AutoSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the task built by `task` unless one is already running.
    /// Returns whether it spawned.
    pub async fn start<F, Fut>(&self, task: F) -> bool
    where
        F: FnOnce(Shutdown) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut running = self.running.lock().await;
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return false;
        }
        let (stop, signal) = watch::channel(false);
        *running = Some(Running {
            handle: tokio::spawn(task(Shutdown(signal))),
            stop,
        });
        true
    }

    /// Ask the task to stop and wait for it to finish its current work.
    /// Returns whether a task was running.
    pub async fn stop(&self) -> bool {
        let mut running = self.running.lock().await;
        let Some(Running { handle, stop }) = running.take() else {
            return false;
        };
        if handle.is_finished() {
            return false;
        }
        let _ = stop.send(true);
        if let Err(e) = handle.await {
            tracing::warn!("[SYNC] Auto-sync task ended abnormally: {}", e);
        }
        true
    }

    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }
}
