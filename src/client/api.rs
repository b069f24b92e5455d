//! Forms API Client
//!
//! The remote collaborator behind the bundle cache and the submission
//! pipeline. Everything above this module talks to the [`FormsApi`] trait so
//! tests can swap in a stub server or an in-process fake.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::client::config::Config;
use crate::shared::draft::SubmissionPayload;
use crate::shared::error::ApiError;
use crate::shared::schema::FormBundle;

/// Raw answer to a submission; the pipeline decides what a status means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait FormsApi: Send + Sync {
    /// Fetch the current form bundle.
    async fn fetch_bundle(&self) -> Result<FormBundle, ApiError>;

    /// POST a submission.
    ///
    /// `Err` only when no HTTP response arrived; any status, including
    /// non-2xx, is returned as an [`ApiResponse`].
    async fn submit(&self, payload: &SubmissionPayload) -> Result<ApiResponse, ApiError>;
}

/// reqwest implementation of [`FormsApi`].
#[derive(Debug, Clone)]
pub struct HttpFormsApi {
    client: Client,
    bundle_url: Option<String>,
    submit_url: Option<String>,
}

impl HttpFormsApi {
    pub fn new(
        bundle_url: Option<String>,
        submit_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            bundle_url,
            submit_url,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            config.bundle_url().map(str::to_string),
            config.submit_url(),
            config.request_timeout(),
        )
    }
}

#[async_trait]
impl FormsApi for HttpFormsApi {
    async fn fetch_bundle(&self) -> Result<FormBundle, ApiError> {
        let url = self
            .bundle_url
            .as_deref()
            .ok_or_else(|| ApiError::InvalidUrl("no bundle endpoint configured".to_string()))?;

        tracing::debug!("[FORMS] Fetching bundle from {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::server(status.as_u16(), body));
        }

        response
            .json::<FormBundle>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn submit(&self, payload: &SubmissionPayload) -> Result<ApiResponse, ApiError> {
        let url = self
            .submit_url
            .as_deref()
            .ok_or_else(|| ApiError::InvalidUrl("no submit endpoint configured".to_string()))?;

        tracing::debug!("[FORMS] Submitting '{}' to {}", payload.form, url);
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(ApiResponse { status, body })
    }
}
