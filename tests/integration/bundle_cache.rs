//! Form bundle cache policy

use assert_matches::assert_matches;
use formsync::client::bundle::{BundleCache, FormRepository, Origin};
use formsync::shared::BundleError;
use std::time::{Duration, SystemTime};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::*;

fn repository(dir: &tempfile::TempDir) -> FormRepository {
    FormRepository::new(BundleCache::new(dir.path().join("forms-app/forms.json")))
}

fn modified(repository: &FormRepository) -> SystemTime {
    std::fs::metadata(repository.cache().path())
        .unwrap()
        .modified()
        .unwrap()
}

#[tokio::test]
async fn test_first_load_writes_cache() {
    let server = MockServer::start().await;
    mount_bundle(&server, &bundle("v1")).await;
    let dir = tempfile::tempdir().unwrap();
    let repository = repository(&dir);

    let loaded = repository.load(&api_for(&server)).await.unwrap();
    assert_eq!(loaded.origin, Origin::Api);
    assert_eq!(loaded.bundle.version, "v1");

    let cached = repository.cache().read().await.unwrap().unwrap();
    assert_eq!(cached, bundle("v1"));
}

#[tokio::test]
async fn test_same_version_serves_cache_without_write() {
    let server = MockServer::start().await;
    mount_bundle(&server, &bundle("v1")).await;
    let dir = tempfile::tempdir().unwrap();
    let repository = repository(&dir);
    let api = api_for(&server);

    repository.load(&api).await.unwrap();
    let before = modified(&repository);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let loaded = repository.load(&api).await.unwrap();
    assert_eq!(loaded.origin, Origin::Cache);
    assert_eq!(modified(&repository), before);
}

#[tokio::test]
async fn test_new_version_replaces_cache() {
    let dir = tempfile::tempdir().unwrap();
    let repository = repository(&dir);
    repository.cache().write(&bundle("v1")).await.unwrap();

    let server = MockServer::start().await;
    mount_bundle(&server, &bundle("v2")).await;

    let loaded = repository.load(&api_for(&server)).await.unwrap();
    assert_eq!(loaded.origin, Origin::Api);
    let cached = repository.cache().read().await.unwrap().unwrap();
    assert_eq!(cached.version, "v2");
}

#[tokio::test]
async fn test_empty_cached_version_always_refreshes() {
    let dir = tempfile::tempdir().unwrap();
    let repository = repository(&dir);
    repository.cache().write(&bundle("")).await.unwrap();

    let server = MockServer::start().await;
    mount_bundle(&server, &bundle("")).await;

    let loaded = repository.load(&api_for(&server)).await.unwrap();
    assert_eq!(loaded.origin, Origin::Api);
}

#[tokio::test]
async fn test_fetch_failure_uses_cache() {
    let dir = tempfile::tempdir().unwrap();
    let repository = repository(&dir);
    repository.cache().write(&bundle("v1")).await.unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let loaded = repository.load(&api_for(&server)).await.unwrap();
    assert_eq!(loaded.origin, Origin::Cache);
    assert_eq!(loaded.origin.banner(), "Offline Mode – Loaded from Cache");
    assert!(loaded.bundle.get("visit").is_some());
}

#[tokio::test]
async fn test_no_network_no_cache() {
    let dir = tempfile::tempdir().unwrap();
    let repository = repository(&dir);

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let api = api_for(&server);

    let result = repository.load(&api).await;
    assert_matches!(result, Err(BundleError::Unavailable { .. }));

    let loaded = repository.load_or_fallback(&api).await;
    assert_eq!(loaded.origin, Origin::Embedded);
    assert!(!loaded.bundle.is_empty());
}

#[tokio::test]
async fn test_corrupt_cache_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let repository = repository(&dir);
    std::fs::create_dir_all(repository.cache().path().parent().unwrap()).unwrap();
    std::fs::write(repository.cache().path(), "{ truncated").unwrap();

    let server = MockServer::start().await;
    mount_bundle(&server, &bundle("v3")).await;

    let loaded = repository.load(&api_for(&server)).await.unwrap();
    assert_eq!(loaded.origin, Origin::Api);
    let cached = repository.cache().read().await.unwrap().unwrap();
    assert_eq!(cached.version, "v3");
}
