//! In-memory change feed backend
//!
//! `MemoryLog` is a complete row store for the change feed tables. It
//! understands every stored procedure the readers issue and enforces the
//! same rules a relational backend would:
//!
//! - Feed rows are appended in strictly increasing sequence order and never
//!   removed.
//! - `CurrentWatermark` is a read-model column maintained by the write
//!   path: a newer write moves it forward for every live event of the
//!   instance, a delete nulls it for every event of the instance. Event
//!   identity columns never change.
//! - Procedures only exist once the applied schema version reaches the
//!   version that introduced them, so a store at `V6` rejects V35 calls the
//!   way an un-migrated database would.
//!
//! It also carries fault injection for tests: an availability switch, an
//! artificial read delay, and a count of open connections.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use dicomfeed_core::{
    ChangeFeedAction, FeedError, FeedResult, IndexedFileProperties, InstanceIdentifier,
    SchemaVersion,
};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

use crate::columns::{column, param, procedure};
use crate::command::Command;
use crate::connection::{Connection, ConnectionFactory, RowStream, VecRowStream};
use crate::value::{Row, Value};

/// Partition reported for rows written before partitions existed
pub const DEFAULT_PARTITION: &str = "Microsoft.Default";

/// One stored change feed row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRow {
    /// Feed position
    pub sequence: i64,
    /// Event wall-clock time
    pub timestamp: DateTime<FixedOffset>,
    /// Event kind
    pub action: ChangeFeedAction,
    /// Instance the event is about
    pub identifier: InstanceIdentifier,
    /// Watermark written by the event
    pub original_watermark: i64,
    /// Live watermark of the instance, maintained by the write path
    pub current_watermark: Option<i64>,
}

#[derive(Debug, Default)]
struct LogState {
    /// Ascending by sequence
    rows: Vec<FeedRow>,
    /// Live instances and their current watermark
    live: HashMap<InstanceIdentifier, i64>,
    /// Watermark -> content length
    file_properties: BTreeMap<i64, i64>,
    /// Last watermark handed out
    last_watermark: i64,
}

impl LogState {
    fn next_sequence(&self) -> i64 {
        self.rows.last().map_or(1, |r| r.sequence + 1)
    }

    fn next_watermark(&mut self) -> i64 {
        self.last_watermark += 1;
        self.last_watermark
    }

    fn push(
        &mut self,
        timestamp: DateTime<FixedOffset>,
        action: ChangeFeedAction,
        identifier: &InstanceIdentifier,
        original_watermark: i64,
        current_watermark: Option<i64>,
    ) -> FeedRow {
        let row = FeedRow {
            sequence: self.next_sequence(),
            timestamp,
            action,
            identifier: identifier.clone(),
            original_watermark,
            current_watermark,
        };
        self.rows.push(row.clone());
        row
    }

    fn set_current_watermark(&mut self, identifier: &InstanceIdentifier, current: Option<i64>) {
        for row in self.rows.iter_mut().filter(|r| &r.identifier == identifier) {
            // Deleted history stays deleted even if the instance comes back.
            if row.current_watermark.is_some() {
                row.current_watermark = current;
            }
        }
    }
}

struct Inner {
    state: RwLock<LogState>,
    schema_version: AtomicU32,
    available: AtomicBool,
    read_delay: Mutex<Option<Duration>>,
    open_connections: AtomicUsize,
}

/// In-memory change feed store
///
/// Cheap to clone; clones share the same log.
#[derive(Clone)]
pub struct MemoryLog {
    inner: Arc<Inner>,
}

impl MemoryLog {
    /// Create an empty log at the newest schema version
    pub fn new() -> Self {
        Self::with_schema_version(SchemaVersion::latest())
    }

    /// Create an empty log with `version` applied
    pub fn with_schema_version(version: SchemaVersion) -> Self {
        MemoryLog {
            inner: Arc::new(Inner {
                state: RwLock::new(LogState::default()),
                schema_version: AtomicU32::new(version.as_u32()),
                available: AtomicBool::new(true),
                read_delay: Mutex::new(None),
                open_connections: AtomicUsize::new(0),
            }),
        }
    }

    // =========================================================================
    // Write path
    // =========================================================================

    /// Record the creation of an instance
    ///
    /// Re-creating a deleted instance is allowed and starts a new watermark
    /// lineage; the old events stay deleted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the instance is already live.
    pub fn create_instance(
        &self,
        identifier: &InstanceIdentifier,
        timestamp: DateTime<FixedOffset>,
    ) -> FeedResult<FeedRow> {
        let mut state = self.inner.state.write();
        if state.live.contains_key(identifier) {
            return Err(FeedError::invalid_input(format!(
                "instance {identifier} already exists"
            )));
        }
        let watermark = state.next_watermark();
        state.live.insert(identifier.clone(), watermark);
        Ok(state.push(
            timestamp,
            ChangeFeedAction::Create,
            identifier,
            watermark,
            Some(watermark),
        ))
    }

    /// Record a content replacement of a live instance
    ///
    /// Every earlier live event of the instance now points at the new
    /// watermark, which makes it `Replaced`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the instance is not live.
    pub fn update_instance(
        &self,
        identifier: &InstanceIdentifier,
        timestamp: DateTime<FixedOffset>,
    ) -> FeedResult<FeedRow> {
        let mut state = self.inner.state.write();
        if !state.live.contains_key(identifier) {
            return Err(FeedError::invalid_input(format!(
                "instance {identifier} does not exist"
            )));
        }
        let watermark = state.next_watermark();
        state.live.insert(identifier.clone(), watermark);
        state.set_current_watermark(identifier, Some(watermark));
        Ok(state.push(
            timestamp,
            ChangeFeedAction::Update,
            identifier,
            watermark,
            Some(watermark),
        ))
    }

    /// Record the deletion of a live instance
    ///
    /// The delete event carries the watermark that was deleted. Every event
    /// of the instance, including the new one, loses its current watermark.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the instance is not live.
    pub fn delete_instance(
        &self,
        identifier: &InstanceIdentifier,
        timestamp: DateTime<FixedOffset>,
    ) -> FeedResult<FeedRow> {
        let mut state = self.inner.state.write();
        let watermark = state.live.remove(identifier).ok_or_else(|| {
            FeedError::invalid_input(format!("instance {identifier} does not exist"))
        })?;
        state.set_current_watermark(identifier, None);
        Ok(state.push(
            timestamp,
            ChangeFeedAction::Delete,
            identifier,
            watermark,
            None,
        ))
    }

    /// Append a fully specified row
    ///
    /// Bypasses the write-path bookkeeping; meant for fixtures that need an
    /// exact watermark layout.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `row.sequence` does not extend the log.
    pub fn append_row(&self, row: FeedRow) -> FeedResult<()> {
        let mut state = self.inner.state.write();
        if let Some(last) = state.rows.last() {
            if row.sequence <= last.sequence {
                return Err(FeedError::invalid_input(format!(
                    "sequence {} does not follow {}",
                    row.sequence, last.sequence
                )));
            }
        }
        let highest = row
            .current_watermark
            .map_or(row.original_watermark, |c| c.max(row.original_watermark));
        state.last_watermark = state.last_watermark.max(highest);
        state.rows.push(row);
        Ok(())
    }

    /// Record the stored content length for a watermark
    pub fn record_file_property(&self, watermark: i64, content_length: i64) {
        self.inner
            .state
            .write()
            .file_properties
            .insert(watermark, content_length);
    }

    // =========================================================================
    // Introspection and fault injection
    // =========================================================================

    /// Number of feed rows
    pub fn len(&self) -> usize {
        self.inner.state.read().rows.len()
    }

    /// Check if the log has no rows
    pub fn is_empty(&self) -> bool {
        self.inner.state.read().rows.is_empty()
    }

    /// Copy of every stored row, ascending by sequence
    pub fn rows(&self) -> Vec<FeedRow> {
        self.inner.state.read().rows.clone()
    }

    /// Live watermark of an instance
    pub fn current_watermark(&self, identifier: &InstanceIdentifier) -> Option<i64> {
        self.inner.state.read().live.get(identifier).copied()
    }

    /// Applied schema version
    pub fn schema_version(&self) -> SchemaVersion {
        SchemaVersion::new(self.inner.schema_version.load(Ordering::Acquire))
    }

    /// Apply a schema version (what a migration would do)
    pub fn set_schema_version(&self, version: SchemaVersion) {
        self.inner
            .schema_version
            .store(version.as_u32(), Ordering::Release);
    }

    /// Make the backend reachable or unreachable
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::Release);
    }

    /// Delay every command by `delay` before it produces rows
    pub fn set_read_delay(&self, delay: Option<Duration>) {
        *self.inner.read_delay.lock() = delay;
    }

    /// Connections obtained and not yet released
    pub fn open_connections(&self) -> usize {
        self.inner.open_connections.load(Ordering::Acquire)
    }
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLog")
            .field("rows", &self.len())
            .field("schema_version", &self.schema_version())
            .field("open_connections", &self.open_connections())
            .finish()
    }
}

impl Inner {
    fn ensure_available(&self) -> FeedResult<()> {
        if self.available.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(FeedError::store("memory log is offline"))
        }
    }
}

#[async_trait]
impl ConnectionFactory for MemoryLog {
    async fn obtain(&self) -> FeedResult<Box<dyn Connection>> {
        self.inner.ensure_available()?;
        self.inner.open_connections.fetch_add(1, Ordering::AcqRel);
        Ok(Box::new(MemoryConnection {
            inner: Arc::clone(&self.inner),
        }))
    }
}

/// Connection handed out by [`MemoryLog`]; released on drop
struct MemoryConnection {
    inner: Arc<Inner>,
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.inner.open_connections.fetch_sub(1, Ordering::AcqRel);
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn query(&self, command: &Command) -> FeedResult<Box<dyn RowStream>> {
        trace!(command = %command, "executing against memory log");
        let delay = *self.inner.read_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.ensure_available()?;
        let rows = self.execute(command)?;
        Ok(Box::new(VecRowStream::new(rows)))
    }
}

/// Schema version that introduced each procedure
fn introduced_in(name: &str) -> Option<SchemaVersion> {
    match name {
        procedure::GET_CHANGE_FEED
        | procedure::GET_CHANGE_FEED_LATEST
        | procedure::SELECT_CURRENT_SCHEMA_VERSION => Some(SchemaVersion::V4),
        procedure::GET_CHANGE_FEED_V6 | procedure::GET_CHANGE_FEED_LATEST_V6 => {
            Some(SchemaVersion::V6)
        }
        procedure::GET_CHANGE_FEED_V35
        | procedure::GET_CHANGE_FEED_LATEST_V35
        | procedure::GET_INDEXED_FILE_METRICS => Some(SchemaVersion::V35),
        _ => None,
    }
}

impl MemoryConnection {
    fn execute(&self, command: &Command) -> FeedResult<Vec<Row>> {
        let applied = SchemaVersion::new(self.inner.schema_version.load(Ordering::Acquire));
        match introduced_in(command.name()) {
            Some(since) if since <= applied => {}
            _ => return Err(missing_procedure(command.name())),
        }

        let state = self.inner.state.read();
        match command.name() {
            procedure::GET_CHANGE_FEED | procedure::GET_CHANGE_FEED_V6 => {
                let with_partition = command.name() == procedure::GET_CHANGE_FEED_V6;
                let (offset, limit) = page(command)?;
                Ok(state
                    .rows
                    .iter()
                    .skip(offset)
                    .take(limit)
                    .map(|r| project(r, with_partition))
                    .collect())
            }
            procedure::GET_CHANGE_FEED_V35 => {
                let (offset, limit) = page(command)?;
                let start = optional_time(command, param::START_TIME)?;
                let end = optional_time(command, param::END_TIME)?;
                Ok(state
                    .rows
                    .iter()
                    .filter(|r| start.map_or(true, |s| r.timestamp >= s))
                    .filter(|r| end.map_or(true, |e| r.timestamp < e))
                    .skip(offset)
                    .take(limit)
                    .map(|r| project(r, true))
                    .collect())
            }
            procedure::GET_CHANGE_FEED_LATEST => {
                Ok(state.rows.last().map(|r| project(r, false)).into_iter().collect())
            }
            procedure::GET_CHANGE_FEED_LATEST_V6 | procedure::GET_CHANGE_FEED_LATEST_V35 => {
                Ok(state.rows.last().map(|r| project(r, true)).into_iter().collect())
            }
            procedure::GET_INDEXED_FILE_METRICS => {
                let count = i32::try_from(state.file_properties.len()).map_err(|_| {
                    FeedError::store("indexed file count exceeds INT range")
                })?;
                let sum = state
                    .file_properties
                    .values()
                    .try_fold(0i64, |acc, len| acc.checked_add(*len))
                    .ok_or_else(|| {
                        FeedError::corruption("indexed file byte total exceeds BIGINT range")
                    })?;
                let totals = IndexedFileProperties::new(count, sum);
                Ok(vec![Row::new(
                    vec![column::TOTAL_INDEXED, column::TOTAL_SUM],
                    vec![Value::Int(totals.total_indexed), Value::BigInt(totals.total_sum)],
                )])
            }
            procedure::SELECT_CURRENT_SCHEMA_VERSION => {
                let version = i32::try_from(applied.as_u32()).map_err(|_| {
                    FeedError::store("schema version exceeds INT range")
                })?;
                Ok(vec![Row::new(
                    vec![column::SCHEMA_VERSION],
                    vec![Value::Int(version)],
                )])
            }
            other => Err(missing_procedure(other)),
        }
    }
}

/// The applied schema lacks `name`; the caller is ahead of the migration
fn missing_procedure(name: &str) -> FeedError {
    FeedError::configuration(format!("could not find stored procedure '{name}'"))
}

fn page(command: &Command) -> FeedResult<(usize, usize)> {
    let offset = command
        .param(param::OFFSET)
        .and_then(Value::as_i64)
        .ok_or_else(|| FeedError::invalid_input("missing @offset"))?;
    let limit = command
        .param(param::LIMIT)
        .and_then(Value::as_i32)
        .ok_or_else(|| FeedError::invalid_input("missing @limit"))?;
    let offset = usize::try_from(offset)
        .map_err(|_| FeedError::invalid_input(format!("@offset must be >= 0, got {offset}")))?;
    let limit = usize::try_from(limit)
        .map_err(|_| FeedError::invalid_input(format!("@limit must be >= 0, got {limit}")))?;
    Ok((offset, limit))
}

fn optional_time(command: &Command, name: &str) -> FeedResult<Option<DateTime<FixedOffset>>> {
    match command.param(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::DateTimeOffset(dt)) => Ok(Some(*dt)),
        Some(other) => Err(FeedError::invalid_input(format!(
            "{name} expected DATETIMEOFFSET, got {}",
            other.type_name()
        ))),
    }
}

fn project(row: &FeedRow, with_partition: bool) -> Row {
    let mut columns = vec![column::SEQUENCE, column::TIMESTAMP, column::ACTION];
    let mut values = vec![
        Value::BigInt(row.sequence),
        Value::DateTimeOffset(row.timestamp),
        Value::Int(row.action.code()),
    ];
    if with_partition {
        columns.push(column::PARTITION_NAME);
        values.push(Value::Text(row.identifier.partition_name.clone()));
    }
    columns.extend([
        column::STUDY_INSTANCE_UID,
        column::SERIES_INSTANCE_UID,
        column::SOP_INSTANCE_UID,
        column::ORIGINAL_WATERMARK,
        column::CURRENT_WATERMARK,
    ]);
    values.extend([
        Value::Text(row.identifier.study_instance_uid.clone()),
        Value::Text(row.identifier.series_instance_uid.clone()),
        Value::Text(row.identifier.sop_instance_uid.clone()),
        Value::BigInt(row.original_watermark),
        Value::from(row.current_watermark),
    ]);
    Row::new(columns, values)
}
