//! Active schema version providers
//!
//! The service asks a provider which schema version is active before every
//! call. How that version is decided (migration tooling, deployment
//! manifests) is outside the feed; these are the three sources it ships
//! with.

use async_trait::async_trait;
use dicomfeed_core::{FeedError, FeedResult, SchemaVersion};
use dicomfeed_storage::columns::{column, procedure};
use dicomfeed_storage::{Command, ConnectionFactory};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::store::cancellable;

/// Source of the currently active schema version
#[async_trait]
pub trait SchemaVersionProvider: Send + Sync {
    /// Version every read should use right now
    async fn current_version(&self, cancel: &CancellationToken) -> FeedResult<SchemaVersion>;
}

/// Always the same version (pinned by configuration)
#[derive(Debug, Clone, Copy)]
pub struct FixedSchemaVersion(SchemaVersion);

impl FixedSchemaVersion {
    /// Pin `version`
    pub fn new(version: SchemaVersion) -> Self {
        FixedSchemaVersion(version)
    }
}

#[async_trait]
impl SchemaVersionProvider for FixedSchemaVersion {
    async fn current_version(&self, _cancel: &CancellationToken) -> FeedResult<SchemaVersion> {
        Ok(self.0)
    }
}

/// Version that deployment tooling can move at runtime
///
/// Readers observe a switch on their next call; calls already in flight
/// finish on the version they started with.
#[derive(Debug)]
pub struct SwitchableSchemaVersion {
    version: AtomicU32,
}

impl SwitchableSchemaVersion {
    /// Start at `version`
    pub fn new(version: SchemaVersion) -> Self {
        SwitchableSchemaVersion {
            version: AtomicU32::new(version.as_u32()),
        }
    }

    /// Make `version` active
    pub fn set(&self, version: SchemaVersion) {
        self.version.store(version.as_u32(), Ordering::Release);
    }

    /// Active version
    pub fn get(&self) -> SchemaVersion {
        SchemaVersion::new(self.version.load(Ordering::Acquire))
    }
}

#[async_trait]
impl SchemaVersionProvider for SwitchableSchemaVersion {
    async fn current_version(&self, _cancel: &CancellationToken) -> FeedResult<SchemaVersion> {
        Ok(self.get())
    }
}

/// Version recorded in the store by the last applied migration
pub struct StoredSchemaVersion {
    factory: Arc<dyn ConnectionFactory>,
}

impl StoredSchemaVersion {
    /// Read the version through `factory`
    pub fn new(factory: Arc<dyn ConnectionFactory>) -> Self {
        StoredSchemaVersion { factory }
    }
}

#[async_trait]
impl SchemaVersionProvider for StoredSchemaVersion {
    async fn current_version(&self, cancel: &CancellationToken) -> FeedResult<SchemaVersion> {
        let command = Command::procedure(procedure::SELECT_CURRENT_SCHEMA_VERSION);
        cancellable(cancel, async {
            let connection = self.factory.obtain().await?;
            let row = connection.query_one(&command).await?.ok_or_else(|| {
                FeedError::configuration("store has no applied schema version")
            })?;
            let raw = row.get_i32(column::SCHEMA_VERSION)?;
            let version = u32::try_from(raw).map_err(|_| {
                FeedError::corruption(format!("stored schema version {raw} is negative"))
            })?;
            Ok(SchemaVersion::new(version))
        })
        .await
    }
}

impl std::fmt::Debug for StoredSchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSchemaVersion").finish_non_exhaustive()
    }
}
