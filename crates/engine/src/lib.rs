//! Change feed engine
//!
//! This crate turns rows into feed entries and picks the right reader:
//! - mapping: row decoding and sequence checks shared by every version
//! - store: ChangeFeedStore trait and the per-version query shapes
//! - registry: schema version to store lookup, frozen at startup
//! - provider: where the active schema version comes from
//! - service: ChangeFeedService, the query entry point
//! - config: `changefeed.toml` loading
//!
//! The engine owns no connections of its own. Each call obtains one from
//! the storage layer and drops it before returning.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod mapping;
pub mod provider;
pub mod registry;
pub mod service;
pub mod store;

pub use config::{FeedConfig, CONFIG_FILE_NAME};
pub use provider::{
    FixedSchemaVersion, SchemaVersionProvider, StoredSchemaVersion, SwitchableSchemaVersion,
};
pub use registry::{SchemaRegistry, SchemaRegistryBuilder};
pub use service::ChangeFeedService;
pub use store::{
    shape_for, ChangeFeedStore, QueryShape, VersionedChangeFeedStore, V35_SHAPE, V4_SHAPE,
    V6_SHAPE,
};
