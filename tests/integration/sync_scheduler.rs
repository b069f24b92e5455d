//! Sync service: retry-all and the auto-sync loop

use formsync::client::offline::{DraftStore, SubmissionPipeline};
use formsync::client::preferences::{MemoryPreferences, PreferenceStore, AUTO_SYNC_ENABLED};
use formsync::client::sync::{NetworkStatus, SyncEvent, SyncReport, SyncService};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

use crate::common::*;

const INTERVAL: Duration = Duration::from_secs(60);

struct Setup {
    service: SyncService,
    api: Arc<FakeApi>,
    probe: Arc<FakeProbe>,
    preferences: Arc<MemoryPreferences>,
    drafts: Arc<DraftStore>,
    _dir: tempfile::TempDir,
}

async fn setup(status: u16, drafts_to_store: usize) -> Setup {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi::new(status));
    let probe = Arc::new(FakeProbe::new(true));
    let preferences = Arc::new(MemoryPreferences::new());
    let drafts = Arc::new(DraftStore::new(dir.path().join("drafts")));
    let pipeline = SubmissionPipeline::new(api.clone(), drafts.clone());

    for _ in 0..drafts_to_store {
        pipeline.save_draft("visit", valid_visit()).await.unwrap();
    }

    let service =
        SyncService::new(pipeline, preferences.clone(), probe.clone()).with_interval(INTERVAL);
    Setup {
        service,
        api,
        probe,
        preferences,
        drafts,
        _dir: dir,
    }
}

#[tokio::test]
async fn test_retry_all_against_stub_server() {
    let server = MockServer::start().await;
    mount_submit(&server, 200, "").await;
    let dir = tempfile::tempdir().unwrap();
    let drafts = Arc::new(DraftStore::new(dir.path()));
    let pipeline = SubmissionPipeline::new(Arc::new(api_for(&server)), drafts.clone());
    pipeline.save_draft("visit", valid_visit()).await.unwrap();
    pipeline.save_draft("visit", valid_visit()).await.unwrap();

    let service = SyncService::new(
        pipeline,
        Arc::new(MemoryPreferences::new()),
        Arc::new(FakeProbe::new(true)),
    );

    let report = service.retry_all().await;
    assert_eq!(report, SyncReport { succeeded: 2, failed: 0 });
    assert!(drafts.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_retry_all_keeps_failures() {
    let s = setup(500, 3).await;

    let report = s.service.retry_all().await;
    assert_eq!(report, SyncReport { succeeded: 0, failed: 3 });
    assert_eq!(s.drafts.list().await.unwrap().len(), 3);
    assert_eq!(s.api.submissions(), 3);

    s.api.set_status(200);
    let report = s.service.retry_all().await;
    assert_eq!(report, SyncReport { succeeded: 3, failed: 0 });
    assert!(s.drafts.list().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_disabled_auto_sync_never_retries() {
    let s = setup(200, 2).await;
    s.preferences.set_bool(AUTO_SYNC_ENABLED, false).await.unwrap();

    assert!(s.service.start_auto_sync().await);
    tokio::time::sleep(INTERVAL * 10 + Duration::from_secs(1)).await;

    assert_eq!(s.api.submissions(), 0);
    assert_eq!(s.probe.calls(), 0);
    assert_eq!(s.drafts.list().await.unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_first_tick_waits_one_interval() {
    let s = setup(200, 1).await;

    s.service.start_auto_sync().await;
    tokio::time::sleep(INTERVAL - Duration::from_secs(1)).await;
    assert_eq!(s.probe.calls(), 0);
    assert_eq!(s.api.submissions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_auto_sync_publishes_report() {
    let s = setup(200, 2).await;
    let mut events = s.service.subscribe();

    s.service.start_auto_sync().await;

    assert_eq!(
        events.recv().await.unwrap(),
        SyncEvent::Connectivity(NetworkStatus::Online)
    );
    assert_eq!(
        events.recv().await.unwrap(),
        SyncEvent::AutoSyncCompleted(SyncReport { succeeded: 2, failed: 0 })
    );
    assert!(s.drafts.list().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_auto_sync_resumes_when_back_online() {
    let s = setup(200, 1).await;
    s.probe.set_online(false);
    let mut events = s.service.subscribe();

    s.service.start_auto_sync().await;
    assert_eq!(
        events.recv().await.unwrap(),
        SyncEvent::Connectivity(NetworkStatus::Offline)
    );
    assert_eq!(s.api.submissions(), 0);

    s.probe.set_online(true);
    assert_eq!(
        events.recv().await.unwrap(),
        SyncEvent::Connectivity(NetworkStatus::Online)
    );
    assert_eq!(
        events.recv().await.unwrap(),
        SyncEvent::AutoSyncCompleted(SyncReport { succeeded: 1, failed: 0 })
    );
}

#[tokio::test(start_paused = true)]
async fn test_no_report_without_drafts() {
    let s = setup(200, 0).await;
    let mut events = s.service.subscribe();

    s.service.start_auto_sync().await;
    tokio::time::sleep(INTERVAL * 3 + Duration::from_secs(1)).await;

    assert_eq!(
        events.try_recv().unwrap(),
        SyncEvent::Connectivity(NetworkStatus::Online)
    );
    assert!(events.try_recv().is_err());
    assert_eq!(s.api.submissions(), 0);
}

#[tokio::test]
async fn test_second_start_is_rejected() {
    let s = setup(200, 0).await;
    assert!(s.service.start_auto_sync().await);
    assert!(!s.service.start_auto_sync().await);
    assert!(s.service.stop_auto_sync().await);
    assert!(s.service.start_auto_sync().await);
}
