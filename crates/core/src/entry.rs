//! Change feed entry data model
//!
//! A [`ChangeFeedEntry`] is one lifecycle event read back from the append
//! log. Entries are values: they are built once, compared structurally,
//! and never mutated. The state field is derived at construction through
//! [`resolve_state`] so a consumer never has to interpret the watermark
//! pair itself.

use crate::action::ChangeFeedAction;
use crate::watermark::{resolve_state, ChangeFeedState};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Natural key of a tracked instance
///
/// Partition plus the three DICOM UIDs. Ordering is not meaningful beyond
/// giving maps a stable iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceIdentifier {
    /// Tenancy partition
    pub partition_name: String,
    /// Study Instance UID (0020,000D)
    pub study_instance_uid: String,
    /// Series Instance UID (0020,000E)
    pub series_instance_uid: String,
    /// SOP Instance UID (0008,0018)
    pub sop_instance_uid: String,
}

impl InstanceIdentifier {
    /// Create an identifier
    pub fn new(
        partition_name: impl Into<String>,
        study_instance_uid: impl Into<String>,
        series_instance_uid: impl Into<String>,
        sop_instance_uid: impl Into<String>,
    ) -> Self {
        InstanceIdentifier {
            partition_name: partition_name.into(),
            study_instance_uid: study_instance_uid.into(),
            series_instance_uid: series_instance_uid.into(),
            sop_instance_uid: sop_instance_uid.into(),
        }
    }
}

impl fmt::Display for InstanceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.partition_name,
            self.study_instance_uid,
            self.series_instance_uid,
            self.sop_instance_uid
        )
    }
}

/// One lifecycle event in the change feed
///
/// ## Invariants
///
/// - `state` always equals `resolve_state(original_watermark, current_watermark)`
/// - Entries are immutable after construction (no setters)
/// - Equality and hashing cover every field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "EntryRecord")]
pub struct ChangeFeedEntry {
    sequence: i64,
    timestamp: DateTime<FixedOffset>,
    action: ChangeFeedAction,
    study_instance_uid: String,
    series_instance_uid: String,
    sop_instance_uid: String,
    original_watermark: i64,
    current_watermark: Option<i64>,
    state: ChangeFeedState,
    partition_name: String,
}

impl ChangeFeedEntry {
    /// Build an entry, deriving its state from the watermark pair
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: i64,
        timestamp: DateTime<FixedOffset>,
        action: ChangeFeedAction,
        study_instance_uid: impl Into<String>,
        series_instance_uid: impl Into<String>,
        sop_instance_uid: impl Into<String>,
        original_watermark: i64,
        current_watermark: Option<i64>,
        partition_name: impl Into<String>,
    ) -> Self {
        ChangeFeedEntry {
            sequence,
            timestamp,
            action,
            study_instance_uid: study_instance_uid.into(),
            series_instance_uid: series_instance_uid.into(),
            sop_instance_uid: sop_instance_uid.into(),
            original_watermark,
            current_watermark,
            state: resolve_state(original_watermark, current_watermark),
            partition_name: partition_name.into(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Position in the feed; strictly increasing, never reused
    #[inline]
    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    /// Wall-clock time of the event (audit only, not ordering)
    #[inline]
    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// What happened
    #[inline]
    pub fn action(&self) -> ChangeFeedAction {
        self.action
    }

    /// Study Instance UID
    #[inline]
    pub fn study_instance_uid(&self) -> &str {
        &self.study_instance_uid
    }

    /// Series Instance UID
    #[inline]
    pub fn series_instance_uid(&self) -> &str {
        &self.series_instance_uid
    }

    /// SOP Instance UID
    #[inline]
    pub fn sop_instance_uid(&self) -> &str {
        &self.sop_instance_uid
    }

    /// Watermark of the content written by this event
    #[inline]
    pub fn original_watermark(&self) -> i64 {
        self.original_watermark
    }

    /// Watermark of the instance's live content at read time
    #[inline]
    pub fn current_watermark(&self) -> Option<i64> {
        self.current_watermark
    }

    /// Derived lifecycle state
    #[inline]
    pub fn state(&self) -> ChangeFeedState {
        self.state
    }

    /// Tenancy partition
    #[inline]
    pub fn partition_name(&self) -> &str {
        &self.partition_name
    }

    /// Natural key of the instance this entry describes
    pub fn identifier(&self) -> InstanceIdentifier {
        InstanceIdentifier::new(
            self.partition_name.clone(),
            self.study_instance_uid.clone(),
            self.series_instance_uid.clone(),
            self.sop_instance_uid.clone(),
        )
    }
}

/// Wire shape accepted on deserialization
///
/// Any serialized `state` is ignored and recomputed, so a payload can never
/// smuggle in a state that disagrees with its watermarks.
#[derive(Deserialize)]
struct EntryRecord {
    sequence: i64,
    timestamp: DateTime<FixedOffset>,
    action: ChangeFeedAction,
    study_instance_uid: String,
    series_instance_uid: String,
    sop_instance_uid: String,
    original_watermark: i64,
    current_watermark: Option<i64>,
    partition_name: String,
}

impl From<EntryRecord> for ChangeFeedEntry {
    fn from(r: EntryRecord) -> Self {
        ChangeFeedEntry::new(
            r.sequence,
            r.timestamp,
            r.action,
            r.study_instance_uid,
            r.series_instance_uid,
            r.sop_instance_uid,
            r.original_watermark,
            r.current_watermark,
            r.partition_name,
        )
    }
}
