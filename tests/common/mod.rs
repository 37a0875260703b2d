//! Shared test utilities for the end-to-end suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Once;

pub use chrono::{DateTime, FixedOffset};
pub use dicomfeed::{
    ChangeFeedAction, ChangeFeedService, ChangeFeedState, FeedConfig, FeedError, FeedRow,
    FixedSchemaVersion, InstanceIdentifier, MemoryLog, SchemaRegistry, SchemaVersion,
    SwitchableSchemaVersion, TimeRange, DEFAULT_PARTITION,
};
pub use tokio_util::sync::CancellationToken;

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
            .try_init();
    });
}

/// UTC timestamp `secs` after the epoch.
pub fn ts(secs: i64) -> DateTime<FixedOffset> {
    DateTime::from_timestamp(secs, 0).unwrap().fixed_offset()
}

/// Instance `n` of a single test series.
pub fn instance(n: usize) -> InstanceIdentifier {
    InstanceIdentifier::new("tenant-a", "1.2.840", "1.2.840.1", format!("1.2.840.1.{n}"))
}

/// Fully specified feed row for fixtures with an exact watermark layout.
pub fn feed_row(
    sequence: i64,
    action: ChangeFeedAction,
    n: usize,
    original: i64,
    current: Option<i64>,
) -> FeedRow {
    FeedRow {
        sequence,
        timestamp: ts(1_000 + sequence),
        action,
        identifier: instance(n),
        original_watermark: original,
        current_watermark: current,
    }
}

/// Service over `log` with every known version registered and `active` pinned.
pub fn pinned_service(log: &MemoryLog, active: SchemaVersion) -> ChangeFeedService {
    let registry = SchemaRegistry::with_versions(
        &SchemaVersion::KNOWN,
        Arc::new(log.clone()),
        DEFAULT_PARTITION,
    )
    .unwrap();
    ChangeFeedService::new(Arc::new(registry), Arc::new(FixedSchemaVersion::new(active)))
}

/// Sequences of a page, in order.
pub fn sequences(page: &[dicomfeed::ChangeFeedEntry]) -> Vec<i64> {
    page.iter().map(|e| e.sequence()).collect()
}
