//! Fixed watermark layouts and the states they resolve to

use crate::common::*;
use dicomfeed::ChangeFeedEntry;

/// Five rows: one instance updated twice, one created and deleted.
fn mixed_lifecycle_log() -> MemoryLog {
    let log = MemoryLog::new();
    for row in [
        feed_row(1, ChangeFeedAction::Create, 0, 1, Some(5)),
        feed_row(2, ChangeFeedAction::Update, 0, 3, Some(5)),
        feed_row(3, ChangeFeedAction::Update, 0, 5, Some(5)),
        feed_row(4, ChangeFeedAction::Create, 1, 6, None),
        feed_row(5, ChangeFeedAction::Delete, 1, 6, None),
    ] {
        log.append_row(row).unwrap();
    }
    log
}

fn states(page: &[ChangeFeedEntry]) -> Vec<ChangeFeedState> {
    page.iter().map(|e| e.state()).collect()
}

#[tokio::test]
async fn mixed_lifecycle_states() {
    init_tracing();
    let log = mixed_lifecycle_log();
    let service = pinned_service(&log, SchemaVersion::V35);

    let page = service
        .list_range(&TimeRange::UNBOUNDED, 0, 10, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(sequences(&page), vec![1, 2, 3, 4, 5]);
    assert_eq!(
        states(&page),
        vec![
            ChangeFeedState::Replaced,
            ChangeFeedState::Replaced,
            ChangeFeedState::Current,
            ChangeFeedState::Deleted,
            ChangeFeedState::Deleted,
        ]
    );
    assert_eq!(page[4].action(), ChangeFeedAction::Delete);
    assert_eq!(page[4].identifier(), instance(1));
}

#[tokio::test]
async fn same_states_on_every_version() {
    let log = mixed_lifecycle_log();
    let cancel = CancellationToken::new();
    let mut seen = Vec::new();
    for version in SchemaVersion::KNOWN {
        let page = pinned_service(&log, version)
            .list_range(&TimeRange::UNBOUNDED, 0, 10, &cancel)
            .await
            .unwrap();
        seen.push(states(&page));
    }
    assert!(seen.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn empty_log() {
    let log = MemoryLog::new();
    let service = pinned_service(&log, SchemaVersion::V35);
    let cancel = CancellationToken::new();

    assert!(service.latest(&cancel).await.unwrap().is_none());
    let page = service
        .list_range(&TimeRange::UNBOUNDED, 0, 10, &cancel)
        .await
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(
        service.indexed_file_properties(&cancel).await.unwrap(),
        dicomfeed::IndexedFileProperties::default()
    );
}

#[tokio::test]
async fn offset_and_limit_select_a_window() {
    let log = mixed_lifecycle_log();
    let page = pinned_service(&log, SchemaVersion::V35)
        .list_range(&TimeRange::UNBOUNDED, 2, 2, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(sequences(&page), vec![3, 4]);
}

#[tokio::test]
async fn offset_past_end_is_empty() {
    let log = mixed_lifecycle_log();
    let page = pinned_service(&log, SchemaVersion::V35)
        .list_range(&TimeRange::UNBOUNDED, 5, 10, &CancellationToken::new())
        .await
        .unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn zero_limit_is_empty() {
    let log = mixed_lifecycle_log();
    let page = pinned_service(&log, SchemaVersion::V35)
        .list_range(&TimeRange::UNBOUNDED, 0, 0, &CancellationToken::new())
        .await
        .unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn zero_limit_ignores_window_arguments() {
    let log = mixed_lifecycle_log();
    let cancel = CancellationToken::new();

    let bounded = pinned_service(&log, SchemaVersion::V6)
        .list_range(&TimeRange::since(ts(0)), 0, 0, &cancel)
        .await
        .unwrap();
    assert!(bounded.is_empty());

    let far_offset = pinned_service(&log, SchemaVersion::V35)
        .list_range(&TimeRange::UNBOUNDED, u64::MAX, 0, &cancel)
        .await
        .unwrap();
    assert!(far_offset.is_empty());
}

#[tokio::test]
async fn repeated_reads_are_identical() {
    let log = mixed_lifecycle_log();
    let service = pinned_service(&log, SchemaVersion::V35);
    let cancel = CancellationToken::new();

    let first = service
        .list_range(&TimeRange::UNBOUNDED, 1, 3, &cancel)
        .await
        .unwrap();
    let second = service
        .list_range(&TimeRange::UNBOUNDED, 1, 3, &cancel)
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn latest_is_highest_sequence() {
    let log = mixed_lifecycle_log();
    let latest = pinned_service(&log, SchemaVersion::V35)
        .latest(&CancellationToken::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.sequence(), 5);
    assert_eq!(latest.state(), ChangeFeedState::Deleted);
}

#[tokio::test]
async fn write_path_drives_state_transitions() {
    let log = MemoryLog::new();
    let service = pinned_service(&log, SchemaVersion::V35);
    let cancel = CancellationToken::new();
    let id = instance(0);

    log.create_instance(&id, ts(1)).unwrap();
    let created = service.latest(&cancel).await.unwrap().unwrap();
    assert_eq!(created.state(), ChangeFeedState::Current);

    log.update_instance(&id, ts(2)).unwrap();
    let page = service
        .list_range(&TimeRange::UNBOUNDED, 0, 10, &cancel)
        .await
        .unwrap();
    assert_eq!(
        states(&page),
        vec![ChangeFeedState::Replaced, ChangeFeedState::Current]
    );

    log.delete_instance(&id, ts(3)).unwrap();
    log.create_instance(&id, ts(4)).unwrap();
    let page = service
        .list_range(&TimeRange::UNBOUNDED, 0, 10, &cancel)
        .await
        .unwrap();
    assert_eq!(
        states(&page),
        vec![
            ChangeFeedState::Deleted,
            ChangeFeedState::Deleted,
            ChangeFeedState::Deleted,
            ChangeFeedState::Current,
        ]
    );
}

#[tokio::test]
async fn indexed_file_totals() {
    let log = MemoryLog::new();
    log.record_file_property(1, 1_024);
    log.record_file_property(2, 2_048);
    let totals = pinned_service(&log, SchemaVersion::V35)
        .indexed_file_properties(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(totals.total_indexed, 2);
    assert_eq!(totals.total_sum, 3_072);
}
