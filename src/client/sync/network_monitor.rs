//! # Network Monitor
//!
//! Connectivity detection for the sync loop and the online/offline banner.
//!
//! A probe asks one question, "can we reach the internet right now?". The
//! monitor remembers the previous answer so callers can react to changes
//! only.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::client::config::Config;
use crate::shared::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Online,
    Offline,
}

impl NetworkStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, NetworkStatus::Online)
    }
}

impl From<bool> for NetworkStatus {
    fn from(online: bool) -> Self {
        if online {
            NetworkStatus::Online
        } else {
            NetworkStatus::Offline
        }
    }
}

#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// GETs a well-known endpoint; online iff it answers with the expected status.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    url: String,
    expected: StatusCode,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            expected: StatusCode::NO_CONTENT,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(config.probe_url(), config.probe_timeout())
    }

    pub fn with_expected_status(mut self, status: StatusCode) -> Self {
        self.expected = status;
        self
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn is_online(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(response) => response.status() == self.expected,
            Err(e) => {
                tracing::debug!("[NETWORK] Probe failed: {}", e);
                false
            }
        }
    }
}

/// Tracks the last probe result.
pub struct NetworkMonitor {
    probe: Arc<dyn ConnectivityProbe>,
    current_status: Mutex<Option<NetworkStatus>>,
}

impl NetworkMonitor {
    pub fn new(probe: Arc<dyn ConnectivityProbe>) -> Self {
        Self {
            probe,
            current_status: Mutex::new(None),
        }
    }

    /// Last known status, `None` before the first check.
    pub async fn get_status(&self) -> Option<NetworkStatus> {
        *self.current_status.lock().await
    }

    /// Probe now. The flag is true when the status differs from the last check.
    pub async fn check(&self) -> (NetworkStatus, bool) {
        let status = NetworkStatus::from(self.probe.is_online().await);
        let mut current = self.current_status.lock().await;
        let changed = *current != Some(status);
        *current = Some(status);
        if changed {
            tracing::info!("[NETWORK] Connectivity is now {:?}", status);
        }
        (status, changed)
    }
}
