//! Core types for the DICOM change feed
//!
//! This crate defines the value types shared by every layer:
//! - ChangeFeedEntry: one lifecycle event, with its derived state
//! - ChangeFeedAction / ChangeFeedState: what happened, and what it means now
//! - resolve_state: the single watermark-pair to state rule
//! - TimeRange: `[start, end)` window for range queries
//! - SchemaVersion: identifier of a feed row shape
//! - IndexedFileProperties: totals over indexed files
//! - FeedError: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod action;
pub mod entry;
pub mod error;
pub mod indexed;
pub mod schema;
pub mod time_range;
pub mod watermark;

pub use action::ChangeFeedAction;
pub use entry::{ChangeFeedEntry, InstanceIdentifier};
pub use error::{FeedError, FeedResult};
pub use indexed::IndexedFileProperties;
pub use schema::SchemaVersion;
pub use time_range::TimeRange;
pub use watermark::{resolve_state, ChangeFeedState};
