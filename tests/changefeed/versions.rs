//! Schema version dispatch through the public service

use crate::common::*;
use std::sync::Arc;

#[tokio::test]
async fn switch_between_calls_changes_strategy() {
    init_tracing();
    let log = MemoryLog::new();
    log.create_instance(&instance(0), ts(10)).unwrap();

    let registry = SchemaRegistry::with_versions(
        &SchemaVersion::KNOWN,
        Arc::new(log.clone()),
        DEFAULT_PARTITION,
    )
    .unwrap();
    let switch = Arc::new(SwitchableSchemaVersion::new(SchemaVersion::V4));
    let service = ChangeFeedService::new(Arc::new(registry), switch.clone());
    let cancel = CancellationToken::new();

    let v4 = service.latest(&cancel).await.unwrap().unwrap();
    assert_eq!(v4.partition_name(), DEFAULT_PARTITION);
    assert!(service.indexed_file_properties(&cancel).await.is_err());

    switch.set(SchemaVersion::V35);
    let v35 = service.latest(&cancel).await.unwrap().unwrap();
    assert_eq!(v35.partition_name(), "tenant-a");
    assert_eq!(v35.sequence(), v4.sequence());
    assert!(service.indexed_file_properties(&cancel).await.is_ok());
}

#[tokio::test]
async fn migration_is_picked_up_from_storage() {
    let log = MemoryLog::with_schema_version(SchemaVersion::V6);
    log.create_instance(&instance(0), ts(10)).unwrap();
    let service = ChangeFeedService::from_config(&FeedConfig::default(), Arc::new(log.clone()))
        .unwrap();
    let cancel = CancellationToken::new();
    let window = TimeRange::since(ts(0));

    let err = service.list_range(&window, 0, 10, &cancel).await.unwrap_err();
    assert!(matches!(err, FeedError::InvalidInput(_)));

    log.set_schema_version(SchemaVersion::V35);
    let page = service.list_range(&window, 0, 10, &cancel).await.unwrap();
    assert_eq!(sequences(&page), vec![1]);
}

#[tokio::test]
async fn unregistered_version_has_no_fallback() {
    let log = MemoryLog::new();
    log.create_instance(&instance(0), ts(10)).unwrap();
    let registry = SchemaRegistry::with_versions(
        &[SchemaVersion::V4, SchemaVersion::V6],
        Arc::new(log.clone()),
        DEFAULT_PARTITION,
    )
    .unwrap();
    let service = ChangeFeedService::new(
        Arc::new(registry),
        Arc::new(FixedSchemaVersion::new(SchemaVersion::V35)),
    );

    let err = service
        .list_range(&TimeRange::UNBOUNDED, 0, 10, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Configuration(_)));
}

#[tokio::test]
async fn time_range_contract_per_version() {
    let log = MemoryLog::new();
    for n in 0..4 {
        log.create_instance(&instance(n), ts(100 + n as i64)).unwrap();
    }
    let cancel = CancellationToken::new();
    let window = TimeRange::new(ts(101), ts(103)).unwrap();

    for version in [SchemaVersion::V4, SchemaVersion::V6] {
        let service = pinned_service(&log, version);
        let err = service.list_range(&window, 0, 10, &cancel).await.unwrap_err();
        assert!(matches!(err, FeedError::InvalidInput(_)));
        let all = service
            .list_range(&TimeRange::UNBOUNDED, 0, 10, &cancel)
            .await
            .unwrap();
        assert_eq!(all.len(), 4);
    }

    let page = pinned_service(&log, SchemaVersion::V35)
        .list_range(&window, 0, 10, &cancel)
        .await
        .unwrap();
    assert_eq!(sequences(&page), vec![2, 3]);
}

#[test]
fn inverted_time_range_is_rejected() {
    let err = TimeRange::new(ts(200), ts(100)).unwrap_err();
    assert!(matches!(err, FeedError::InvalidInput(_)));
}
