//! Stub server helpers for integration tests
//!
//! Wraps wiremock so tests can script the forms API, plus in-process fakes
//! for tests that run on a paused clock.

use async_trait::async_trait;
use formsync::client::api::{ApiResponse, FormsApi};
use formsync::client::sync::ConnectivityProbe;
use formsync::client::HttpFormsApi;
use formsync::shared::{ApiError, FormBundle, SubmissionPayload};
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const BUNDLE_PATH: &str = "/api/forms";
pub const SUBMIT_PATH: &str = "/api/forms/submit";

/// Client pointed at the stub server.
pub fn api_for(server: &MockServer) -> HttpFormsApi {
    HttpFormsApi::new(
        Some(format!("{}{}", server.uri(), BUNDLE_PATH)),
        Some(format!("{}{}", server.uri(), SUBMIT_PATH)),
        Duration::from_secs(2),
    )
    .expect("client builds")
}

pub async fn mount_bundle(server: &MockServer, bundle: &FormBundle) {
    Mock::given(method("GET"))
        .and(path(BUNDLE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(bundle))
        .mount(server)
        .await;
}

pub async fn mount_submit(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// Probe whose answer is set by the test; counts how often it was asked.
#[derive(Default)]
pub struct FakeProbe {
    online: AtomicBool,
    calls: AtomicUsize,
}

impl FakeProbe {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectivityProbe for FakeProbe {
    async fn is_online(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.online.load(Ordering::SeqCst)
    }
}

/// In-process forms API answering every submission with `status`.
pub struct FakeApi {
    status: AtomicU16,
    submissions: AtomicUsize,
}

impl FakeApi {
    pub fn new(status: u16) -> Self {
        Self {
            status: AtomicU16::new(status),
            submissions: AtomicUsize::new(0),
        }
    }

    pub fn set_status(&self, status: u16) {
        self.status.store(status, Ordering::SeqCst);
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FormsApi for FakeApi {
    async fn fetch_bundle(&self) -> Result<FormBundle, ApiError> {
        Err(ApiError::network("offline"))
    }

    async fn submit(&self, _payload: &SubmissionPayload) -> Result<ApiResponse, ApiError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        Ok(ApiResponse {
            status: self.status.load(Ordering::SeqCst),
            body: String::new(),
        })
    }
}
