//! Submission pipeline against a stub HTTP server

use assert_matches::assert_matches;
use formsync::client::offline::{DraftStore, SubmissionPipeline, SubmitOutcome};
use formsync::shared::{FailureReason, RetryError};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::*;

fn pipeline(server: &MockServer, dir: &std::path::Path) -> SubmissionPipeline {
    SubmissionPipeline::new(Arc::new(api_for(server)), Arc::new(DraftStore::new(dir)))
}

#[tokio::test]
async fn test_accepted_submission_leaves_no_draft() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(&server, dir.path());

    let outcome = pipeline
        .submit_form("visit", &visit_form(), &valid_visit())
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert!(pipeline.drafts().list().await.unwrap().is_empty());

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["form"], "visit");
    // Unanswered optional fields are sent as empty strings.
    assert_eq!(body["data"]["notes"], "");
}

#[tokio::test]
async fn test_server_rejection_saves_exactly_one_draft() {
    let server = MockServer::start().await;
    mount_submit(&server, 500, "database unavailable").await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(&server, dir.path());

    let outcome = pipeline
        .submit_form("visit", &visit_form(), &valid_visit())
        .await
        .unwrap();

    let draft_id = outcome.draft().cloned().unwrap();
    assert_matches!(
        outcome,
        SubmitOutcome::SavedOffline { reason: FailureReason::Server { code: 500, .. }, .. }
    );
    assert_eq!(pipeline.drafts().list().await.unwrap(), vec![draft_id.clone()]);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

    let draft = pipeline.drafts().read(&draft_id).await.unwrap();
    assert_eq!(draft.form, "visit");
    assert_eq!(draft.data["household"], "H-114");
    assert_eq!(
        draft.error,
        Some(FailureReason::server(500, "database unavailable"))
    );
}

#[tokio::test]
async fn test_unreachable_server_saves_network_draft() {
    let dir = tempfile::tempdir().unwrap();
    let api = formsync::client::HttpFormsApi::new(
        None,
        Some("http://127.0.0.1:9/api/forms/submit".to_string()),
        Duration::from_millis(500),
    )
    .unwrap();
    let pipeline = SubmissionPipeline::new(Arc::new(api), Arc::new(DraftStore::new(dir.path())));

    let outcome = pipeline.submit("visit", valid_visit()).await;
    assert_matches!(
        outcome,
        SubmitOutcome::SavedOffline { reason: FailureReason::Network { .. }, .. }
    );
    assert_eq!(pipeline.drafts().list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_form_is_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(&server, dir.path());

    let mut entry = valid_visit();
    entry.insert("members".to_string(), "0".to_string());
    entry.insert("consent".to_string(), "false".to_string());

    let errors = pipeline
        .submit_form("visit", &visit_form(), &entry)
        .await
        .unwrap_err();
    assert_eq!(errors.get("members"), Some("'Members' must be ≥ 1.00"));
    assert_eq!(errors.get("consent"), Some("'Consent' must be checked to proceed"));
    assert!(pipeline.drafts().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_retry_removes_exactly_that_draft() {
    let server = MockServer::start().await;
    mount_submit(&server, 200, "").await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(&server, dir.path());

    let first = pipeline.save_draft("visit", valid_visit()).await.unwrap();
    let second = pipeline.save_draft("visit", valid_visit()).await.unwrap();
    assert_ne!(first, second);

    pipeline.retry_draft(&first).await.unwrap();
    assert_eq!(pipeline.drafts().list().await.unwrap(), vec![second]);
}

#[tokio::test]
async fn test_failed_retry_creates_no_new_draft() {
    let server = MockServer::start().await;
    mount_submit(&server, 503, "maintenance").await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(&server, dir.path());

    let id = pipeline.save_draft("visit", valid_visit()).await.unwrap();
    let result = pipeline.retry_draft(&id).await;

    assert_matches!(result, Err(RetryError::Delivery(FailureReason::Server { code: 503, .. })));
    assert_eq!(pipeline.drafts().list().await.unwrap(), vec![id]);
}

#[tokio::test]
async fn test_latest_draft_resumes_entry() {
    let server = MockServer::start().await;
    mount_submit(&server, 500, "").await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(&server, dir.path());

    pipeline.submit("visit", valid_visit()).await;

    let (_, draft) = pipeline
        .drafts()
        .latest_for_form("visit")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(draft.data, valid_visit());
}
