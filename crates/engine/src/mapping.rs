//! Row to entry mapping shared by every schema version
//!
//! Versions differ in which procedure they call and which columns come
//! back. Turning a row into a [`ChangeFeedEntry`] is the same everywhere
//! and lives here once.

use dicomfeed_core::{ChangeFeedAction, ChangeFeedEntry, FeedError, FeedResult};
use dicomfeed_storage::columns::column;
use dicomfeed_storage::{Row, RowStream};

/// Where an entry's partition name comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionSource<'a> {
    /// Read from the `PartitionName` column
    Column,
    /// Row shape predates partitions; every row belongs to this partition
    Fixed(&'a str),
}

/// Decode one feed row
///
/// # Errors
///
/// Returns `Corruption` for missing or mistyped columns and for action
/// codes this build does not know.
pub fn read_entry(row: &Row, partition: PartitionSource<'_>) -> FeedResult<ChangeFeedEntry> {
    let sequence = row.get_i64(column::SEQUENCE)?;
    let code = row.get_i32(column::ACTION)?;
    let action = ChangeFeedAction::from_code(code).ok_or_else(|| {
        FeedError::corruption(format!("unknown action code {code} at sequence {sequence}"))
    })?;
    let partition_name = match partition {
        PartitionSource::Column => row.get_str(column::PARTITION_NAME)?,
        PartitionSource::Fixed(name) => name,
    };

    Ok(ChangeFeedEntry::new(
        sequence,
        row.get_datetime(column::TIMESTAMP)?,
        action,
        row.get_str(column::STUDY_INSTANCE_UID)?,
        row.get_str(column::SERIES_INSTANCE_UID)?,
        row.get_str(column::SOP_INSTANCE_UID)?,
        row.get_i64(column::ORIGINAL_WATERMARK)?,
        row.get_opt_i64(column::CURRENT_WATERMARK)?,
        partition_name,
    ))
}

/// Drain a range stream into entries, checking sequence order
///
/// # Errors
///
/// Returns `Corruption` if any row fails to decode or if sequences are not
/// strictly increasing; storage errors pass through unchanged.
pub async fn collect_entries(
    mut stream: Box<dyn RowStream>,
    partition: PartitionSource<'_>,
    capacity: usize,
) -> FeedResult<Vec<ChangeFeedEntry>> {
    let mut entries: Vec<ChangeFeedEntry> = Vec::with_capacity(capacity);
    while let Some(row) = stream.next().await? {
        let entry = read_entry(&row, partition)?;
        if let Some(prev) = entries.last() {
            if entry.sequence() <= prev.sequence() {
                return Err(FeedError::corruption(format!(
                    "sequence {} returned after {}",
                    entry.sequence(),
                    prev.sequence()
                )));
            }
        }
        entries.push(entry);
    }
    Ok(entries)
}
