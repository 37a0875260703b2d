//! DICOM change feed
//!
//! Ordered, paginated reads over the log of instance create, update and
//! delete events, with each entry's state derived from its watermarks.
//! Reads are dispatched to the strategy registered for the active schema
//! version so nodes on either side of a migration can serve the same log.
//!
//! # Quick Start
//!
//! ```ignore
//! use dicomfeed::{ChangeFeedService, FeedConfig, MemoryLog, TimeRange};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let log = MemoryLog::new();
//! let service = ChangeFeedService::from_config(&FeedConfig::default(), Arc::new(log))?;
//!
//! let cancel = CancellationToken::new();
//! let page = service.list_range(&TimeRange::UNBOUNDED, 0, 100, &cancel).await?;
//! let latest = service.latest(&cancel).await?;
//! ```
//!
//! # Architecture
//!
//! - `dicomfeed-core`: entry, state resolution, errors
//! - `dicomfeed-storage`: rows, commands, connections, in-memory backend
//! - `dicomfeed-engine`: per-version stores, registry, service, config

pub use dicomfeed_core::*;
pub use dicomfeed_engine::*;
pub use dicomfeed_storage::{
    Command, Connection, ConnectionFactory, FeedRow, MemoryLog, Row, RowStream, Value,
    VecRowStream, DEFAULT_PARTITION,
};
