//! Versioned change feed stores
//!
//! ## Version Dispatch
//!
//! Each schema version reads the log through a [`QueryShape`]: the
//! procedures it calls and the row-shape flags it depends on. A newer shape
//! is written as its predecessor plus overrides,
//!
//! ```text
//! V4  ── base: GetChangeFeed / GetChangeFeedLatest, no partition column
//! V6  ── ..V4 + partition column, *V6 procedures
//! V35 ── ..V6 + [start, end) time filter, *V35 procedures, file metrics
//! ```
//!
//! so a shape states only what changed. Everything else (connection
//! scoping, cancellation, row mapping, state derivation) is shared by
//! [`VersionedChangeFeedStore`], which is parameterized by a shape.
//!
//! Old shapes are kept forever: during a rolling upgrade nodes on either
//! side of a migration read the same log concurrently.

use async_trait::async_trait;
use dicomfeed_core::{
    ChangeFeedEntry, FeedError, FeedResult, IndexedFileProperties, SchemaVersion, TimeRange,
};
use dicomfeed_storage::columns::{column, param, procedure};
use dicomfeed_storage::{Command, ConnectionFactory, Value};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::mapping::{collect_entries, read_entry, PartitionSource};

/// Upper bound on entries reserved up front for a range read
const PREALLOCATE_MAX: usize = 1_024;

/// Read strategy for one schema version
///
/// Implementations are stateless per call: each call obtains its own
/// connection and releases it before returning.
#[async_trait]
pub trait ChangeFeedStore: Send + Sync {
    /// Schema version this store reads
    fn version(&self) -> SchemaVersion;

    /// Entries inside `range`, ascending by sequence, skipping `offset`
    /// matches and returning at most `limit`
    ///
    /// `limit == 0` returns an empty vector whatever the other arguments.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a pagination window outside the stored types,
    ///   or a bounded range on a version without time filtering
    /// - `StoreUnavailable` when the backend fails
    /// - `Cancelled` when `cancel` fires first
    async fn list_range(
        &self,
        range: &TimeRange,
        offset: u64,
        limit: u32,
        cancel: &CancellationToken,
    ) -> FeedResult<Vec<ChangeFeedEntry>>;

    /// Entry with the greatest sequence, `None` for an empty log
    async fn latest(&self, cancel: &CancellationToken) -> FeedResult<Option<ChangeFeedEntry>>;

    /// Totals over indexed files
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` on versions without file metrics.
    async fn indexed_file_properties(
        &self,
        cancel: &CancellationToken,
    ) -> FeedResult<IndexedFileProperties>;
}

/// Procedures and row shape of one schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryShape {
    /// Version this shape belongs to
    pub version: SchemaVersion,
    /// Ordered range scan with skip/take
    pub range_procedure: &'static str,
    /// Single most recent row
    pub latest_procedure: &'static str,
    /// Rows carry `PartitionName`
    pub partition_column: bool,
    /// Range procedure accepts `@startTime` / `@endTime`
    pub time_filter: bool,
    /// Totals over indexed files, if the version has them
    pub file_metrics_procedure: Option<&'static str>,
}

/// Base shape: single partition, no time filter
pub const V4_SHAPE: QueryShape = QueryShape {
    version: SchemaVersion::V4,
    range_procedure: procedure::GET_CHANGE_FEED,
    latest_procedure: procedure::GET_CHANGE_FEED_LATEST,
    partition_column: false,
    time_filter: false,
    file_metrics_procedure: None,
};

/// Adds the partition column
pub const V6_SHAPE: QueryShape = QueryShape {
    version: SchemaVersion::V6,
    range_procedure: procedure::GET_CHANGE_FEED_V6,
    latest_procedure: procedure::GET_CHANGE_FEED_LATEST_V6,
    partition_column: true,
    ..V4_SHAPE
};

/// Adds `[start, end)` filtering and file metrics
pub const V35_SHAPE: QueryShape = QueryShape {
    version: SchemaVersion::V35,
    range_procedure: procedure::GET_CHANGE_FEED_V35,
    latest_procedure: procedure::GET_CHANGE_FEED_LATEST_V35,
    time_filter: true,
    file_metrics_procedure: Some(procedure::GET_INDEXED_FILE_METRICS),
    ..V6_SHAPE
};

/// Shape shipped for `version`, if any
pub fn shape_for(version: SchemaVersion) -> Option<QueryShape> {
    [V4_SHAPE, V6_SHAPE, V35_SHAPE]
        .into_iter()
        .find(|shape| shape.version == version)
}

/// Run `fut` unless `cancel` fires first
///
/// Losing the race drops `fut`, and with it any connection or stream it
/// holds, before this returns.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> FeedResult<T>
where
    F: Future<Output = FeedResult<T>>,
{
    if cancel.is_cancelled() {
        return Err(FeedError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FeedError::Cancelled),
        result = fut => result,
    }
}

/// Change feed store for one [`QueryShape`]
pub struct VersionedChangeFeedStore {
    shape: QueryShape,
    factory: Arc<dyn ConnectionFactory>,
    default_partition: String,
}

impl VersionedChangeFeedStore {
    /// Create a store reading with `shape`
    ///
    /// `default_partition` is reported for shapes without a partition column.
    pub fn new(
        shape: QueryShape,
        factory: Arc<dyn ConnectionFactory>,
        default_partition: impl Into<String>,
    ) -> Self {
        VersionedChangeFeedStore {
            shape,
            factory,
            default_partition: default_partition.into(),
        }
    }

    /// Create the store shipped for `version`
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if no shape exists for `version`.
    pub fn for_version(
        version: SchemaVersion,
        factory: Arc<dyn ConnectionFactory>,
        default_partition: impl Into<String>,
    ) -> FeedResult<Self> {
        let shape = shape_for(version).ok_or_else(|| {
            FeedError::configuration(format!("no change feed shape for schema version {version}"))
        })?;
        Ok(Self::new(shape, factory, default_partition))
    }

    /// Shape this store reads with
    pub fn shape(&self) -> &QueryShape {
        &self.shape
    }

    fn partition_source(&self) -> PartitionSource<'_> {
        if self.shape.partition_column {
            PartitionSource::Column
        } else {
            PartitionSource::Fixed(&self.default_partition)
        }
    }

    fn range_command(&self, range: &TimeRange, offset: u64, limit: u32) -> FeedResult<Command> {
        let offset = i64::try_from(offset)
            .map_err(|_| FeedError::invalid_input(format!("offset {offset} exceeds i64::MAX")))?;
        let limit = i32::try_from(limit)
            .map_err(|_| FeedError::invalid_input(format!("limit {limit} exceeds i32::MAX")))?;

        let mut command = Command::procedure(self.shape.range_procedure);
        if self.shape.time_filter {
            command = command
                .with_param(param::START_TIME, Value::from(range.start()))
                .with_param(param::END_TIME, Value::from(range.end()));
        } else if !range.is_unbounded() {
            return Err(FeedError::invalid_input(format!(
                "schema version {} cannot filter by time range {range}",
                self.shape.version
            )));
        }
        Ok(command
            .with_param(param::OFFSET, offset)
            .with_param(param::LIMIT, limit))
    }
}

#[async_trait]
impl ChangeFeedStore for VersionedChangeFeedStore {
    fn version(&self) -> SchemaVersion {
        self.shape.version
    }

    async fn list_range(
        &self,
        range: &TimeRange,
        offset: u64,
        limit: u32,
        cancel: &CancellationToken,
    ) -> FeedResult<Vec<ChangeFeedEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let command = self.range_command(range, offset, limit)?;
        debug!(version = %self.shape.version, %range, offset, limit, "listing change feed");

        let entries = cancellable(cancel, async {
            let connection = self.factory.obtain().await?;
            let stream = connection.query(&command).await?;
            let capacity = (limit as usize).min(PREALLOCATE_MAX);
            collect_entries(stream, self.partition_source(), capacity).await
        })
        .await?;

        debug!(version = %self.shape.version, count = entries.len(), "listed change feed");
        Ok(entries)
    }

    async fn latest(&self, cancel: &CancellationToken) -> FeedResult<Option<ChangeFeedEntry>> {
        debug!(version = %self.shape.version, "reading latest change feed entry");
        let command = Command::procedure(self.shape.latest_procedure);

        cancellable(cancel, async {
            let connection = self.factory.obtain().await?;
            match connection.query_one(&command).await? {
                Some(row) => read_entry(&row, self.partition_source()).map(Some),
                None => Ok(None),
            }
        })
        .await
    }

    async fn indexed_file_properties(
        &self,
        cancel: &CancellationToken,
    ) -> FeedResult<IndexedFileProperties> {
        let procedure = self.shape.file_metrics_procedure.ok_or_else(|| {
            FeedError::unsupported(format!(
                "indexed file metrics require schema version {} or later, active is {}",
                SchemaVersion::V35,
                self.shape.version
            ))
        })?;
        let command = Command::procedure(procedure);

        cancellable(cancel, async {
            let connection = self.factory.obtain().await?;
            match connection.query_one(&command).await? {
                Some(row) => Ok(IndexedFileProperties::new(
                    row.get_i32(column::TOTAL_INDEXED)?,
                    row.get_i64(column::TOTAL_SUM)?,
                )),
                None => Ok(IndexedFileProperties::default()),
            }
        })
        .await
    }
}

impl std::fmt::Debug for VersionedChangeFeedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionedChangeFeedStore")
            .field("shape", &self.shape)
            .field("default_partition", &self.default_partition)
            .finish()
    }
}
