//! Cancellation, unavailable storage and configuration failures

use crate::common::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn cancelled_before_start() {
    let log = MemoryLog::new();
    log.create_instance(&instance(0), ts(1)).unwrap();
    let service = pinned_service(&log, SchemaVersion::V35);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = service.latest(&cancel).await.unwrap_err();
    assert!(err.is_cancelled());
    let err = service
        .list_range(&TimeRange::UNBOUNDED, 0, 10, &cancel)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(log.open_connections(), 0);
}

#[tokio::test]
async fn cancelled_during_read() {
    init_tracing();
    let log = MemoryLog::new();
    log.create_instance(&instance(0), ts(1)).unwrap();
    log.set_read_delay(Some(Duration::from_secs(30)));
    let service = pinned_service(&log, SchemaVersion::V35);
    let cancel = CancellationToken::new();

    let task = {
        let service = service.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { service.latest(&cancel).await })
    };
    while log.open_connections() == 0 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    cancel.cancel();

    assert!(matches!(task.await.unwrap(), Err(FeedError::Cancelled)));
    assert_eq!(log.open_connections(), 0);
}

#[tokio::test]
async fn store_unavailable_is_reported_not_retried() {
    let log = MemoryLog::new();
    log.create_instance(&instance(0), ts(1)).unwrap();
    log.set_available(false);
    let service = pinned_service(&log, SchemaVersion::V35);

    let err = service
        .list_range(&TimeRange::UNBOUNDED, 0, 10, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::StoreUnavailable { .. }));
    assert!(err.is_retriable());

    log.set_available(true);
    let page = service
        .list_range(&TimeRange::UNBOUNDED, 0, 10, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn stored_version_unreachable() {
    let log = MemoryLog::new();
    log.set_available(false);
    let service =
        ChangeFeedService::from_config(&FeedConfig::default(), Arc::new(log.clone())).unwrap();
    let err = service.latest(&CancellationToken::new()).await.unwrap_err();
    assert!(err.is_retriable());
    assert_eq!(log.open_connections(), 0);
}

#[test]
fn config_file_drives_service() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(dicomfeed::CONFIG_FILE_NAME);
    std::fs::write(&path, "schema_version = 6\nversions = [6, 35]\n").unwrap();

    let config = FeedConfig::from_file(&path).unwrap();
    let service = ChangeFeedService::from_config(&config, Arc::new(MemoryLog::new())).unwrap();
    assert_eq!(
        service.registry().versions(),
        vec![SchemaVersion::V6, SchemaVersion::V35]
    );

    std::fs::write(&path, "schema_version = 4\nversions = [6, 35]\n").unwrap();
    assert!(matches!(
        FeedConfig::from_file(&path),
        Err(FeedError::Configuration(_))
    ));
}
